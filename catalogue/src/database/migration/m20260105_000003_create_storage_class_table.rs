use sea_orm_migration::prelude::*;

use super::entry_log_columns;
use crate::database::entity::storage_class::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20260105_000003_create_storage_class_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                entry_log_columns::<Entity>(
                    Table::create()
                        .table(Entity)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Column::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Column::DiskInstance)
                                .string_len(100)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Column::Name).string_len(100).not_null())
                        .col(ColumnDef::new(Column::NbCopies).integer().not_null())
                        .col(ColumnDef::new(Column::Comment).string().not_null()),
                )
                .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-storage-class-disk-instance-name")
                    .table(Entity)
                    .col(Column::DiskInstance)
                    .col(Column::Name)
                    .unique()
                    .to_owned(),
            )
            .await
    }
}
