use sea_orm_migration::prelude::*;

use super::entry_log_columns;
use crate::database::entity::requester_group_mount_rule::*;
use crate::database::entity::mount_policy;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20260105_000010_create_requester_group_mount_rule_table"
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
                        .col(
                            ColumnDef::new(Column::RequesterGroupName)
                                .string_len(100)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Column::MountPolicyId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Column::Comment).string().not_null())
                        .foreign_key(
                            ForeignKeyCreateStatement::new()
                                .name("fk_requester_group_mount_rule_mount_policy")
                                .from_tbl(Entity)
                                .from_col(Column::MountPolicyId)
                                .to_tbl(mount_policy::Entity)
                                .to_col(mount_policy::Column::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        ),
                )
                .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-requester-group-mount-rule-key")
                    .table(Entity)
                    .col(Column::DiskInstance)
                    .col(Column::RequesterGroupName)
                    .unique()
                    .to_owned(),
            )
            .await
    }
}
