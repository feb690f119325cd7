use sea_orm::ConnectionTrait;
use sea_orm_migration::prelude::*;

use super::{SCHEMA_VERSION_MAJOR, SCHEMA_VERSION_MINOR};
use crate::database::entity::catalogue_schema::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20260112_000003_create_catalogue_schema_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Entity)
                    .if_not_exists()
                    .col(ColumnDef::new(Column::Id).integer().not_null().primary_key())
                    .col(
                        ColumnDef::new(Column::SchemaVersionMajor)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Column::SchemaVersionMinor)
                            .integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        let insert = Query::insert()
            .into_table(Entity)
            .columns([
                Column::Id,
                Column::SchemaVersionMajor,
                Column::SchemaVersionMinor,
            ])
            .values([
                1.into(),
                SCHEMA_VERSION_MAJOR.into(),
                SCHEMA_VERSION_MINOR.into(),
            ])
            .map_err(|e| DbErr::Migration(e.to_string()))?
            .to_owned();

        let stmt = manager.get_database_backend().build(&insert);
        manager.get_connection().execute(stmt).await?;

        Ok(())
    }
}
