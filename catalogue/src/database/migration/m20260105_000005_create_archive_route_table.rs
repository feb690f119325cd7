use sea_orm_migration::prelude::*;

use super::entry_log_columns;
use crate::database::entity::archive_route::*;
use crate::database::entity::storage_class;
use crate::database::entity::tape_pool;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20260105_000005_create_archive_route_table"
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
                            ColumnDef::new(Column::StorageClassId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Column::CopyNb).integer().not_null())
                        .col(ColumnDef::new(Column::TapePoolId).big_integer().not_null())
                        .col(ColumnDef::new(Column::Comment).string().not_null())
                        .foreign_key(
                            ForeignKeyCreateStatement::new()
                                .name("fk_archive_route_storage_class")
                                .from_tbl(Entity)
                                .from_col(Column::StorageClassId)
                                .to_tbl(storage_class::Entity)
                                .to_col(storage_class::Column::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .foreign_key(
                            ForeignKeyCreateStatement::new()
                                .name("fk_archive_route_tape_pool")
                                .from_tbl(Entity)
                                .from_col(Column::TapePoolId)
                                .to_tbl(tape_pool::Entity)
                                .to_col(tape_pool::Column::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        ),
                )
                .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-archive-route-storage-class-copy-nb")
                    .table(Entity)
                    .col(Column::StorageClassId)
                    .col(Column::CopyNb)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-archive-route-storage-class-tape-pool")
                    .table(Entity)
                    .col(Column::StorageClassId)
                    .col(Column::TapePoolId)
                    .unique()
                    .to_owned(),
            )
            .await
    }
}
