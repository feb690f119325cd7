use sea_orm_migration::prelude::*;

use super::entry_log_columns;
use crate::database::entity::tape_pool::*;
use crate::database::entity::virtual_organization;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20260105_000004_create_tape_pool_table"
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
                            ColumnDef::new(Column::VirtualOrganizationId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Column::NbPartialTapes)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Column::IsEncrypted).boolean().not_null())
                        .col(ColumnDef::new(Column::Supply).string().null())
                        .col(ColumnDef::new(Column::Comment).string().not_null())
                        .foreign_key(
                            ForeignKeyCreateStatement::new()
                                .name("fk_tape_pool_virtual_organization")
                                .from_tbl(Entity)
                                .from_col(Column::VirtualOrganizationId)
                                .to_tbl(virtual_organization::Entity)
                                .to_col(virtual_organization::Column::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        ),
                )
                .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-tape-pool-virtual-organization-id")
                    .table(Entity)
                    .col(Column::VirtualOrganizationId)
                    .to_owned(),
            )
            .await
    }
}
