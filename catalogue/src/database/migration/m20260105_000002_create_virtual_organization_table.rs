use sea_orm_migration::prelude::*;

use super::entry_log_columns;
use crate::database::entity::virtual_organization::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20260105_000002_create_virtual_organization_table"
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
                            ColumnDef::new(Column::Name)
                                .string_len(100)
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Column::ReadMaxDrives)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Column::WriteMaxDrives)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Column::MaxFileSize)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Column::Comment).string().not_null()),
                )
                .to_owned(),
            )
            .await
    }
}
