use sea_orm_migration::prelude::*;

use super::entry_log_columns;
use crate::database::entity::mount_policy::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20260105_000008_create_mount_policy_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut table = Table::create();
        table
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
            );

        for parameter in [
            Column::ArchivePriority,
            Column::ArchiveMinRequestAge,
            Column::RetrievePriority,
            Column::RetrieveMinRequestAge,
            Column::MaxDrivesAllowed,
        ] {
            table.col(ColumnDef::new(parameter).big_integer().not_null());
        }

        table.col(ColumnDef::new(Column::Comment).string().not_null());

        manager
            .create_table(entry_log_columns::<Entity>(&mut table).to_owned())
            .await
    }
}
