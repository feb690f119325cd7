use sea_orm_migration::prelude::*;

use super::entry_log_columns;
use crate::database::entity::media_type::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20260104_000001_create_media_type_table"
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
            )
            .col(ColumnDef::new(Column::Cartridge).string_len(100).not_null())
            .col(
                ColumnDef::new(Column::CapacityInBytes)
                    .big_integer()
                    .not_null(),
            )
            .col(ColumnDef::new(Column::PrimaryDensityCode).integer().null())
            .col(ColumnDef::new(Column::SecondaryDensityCode).integer().null())
            .col(ColumnDef::new(Column::NbWraps).big_integer().null())
            .col(ColumnDef::new(Column::MinLpos).big_integer().null())
            .col(ColumnDef::new(Column::MaxLpos).big_integer().null())
            .col(ColumnDef::new(Column::Comment).string().not_null());

        manager
            .create_table(entry_log_columns::<Entity>(&mut table).to_owned())
            .await
    }
}
