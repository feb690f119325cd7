use sea_orm_migration::prelude::*;

use super::entry_log_columns;
use crate::database::entity::activities_fair_share_weight::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20260112_000002_create_activities_fair_share_weight_table"
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
                        .col(ColumnDef::new(Column::Activity).string_len(100).not_null())
                        .col(ColumnDef::new(Column::Weight).double().not_null())
                        .col(ColumnDef::new(Column::Comment).string().not_null()),
                )
                .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-activities-fair-share-weight-key")
                    .table(Entity)
                    .col(Column::DiskInstance)
                    .col(Column::Activity)
                    .unique()
                    .to_owned(),
            )
            .await
    }
}
