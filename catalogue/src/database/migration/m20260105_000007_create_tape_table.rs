use sea_orm_migration::prelude::*;

use super::entry_log_columns;
use crate::database::entity::logical_library;
use crate::database::entity::media_type;
use crate::database::entity::tape::*;
use crate::database::entity::tape_pool;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20260105_000007_create_tape_table"
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
                ColumnDef::new(Column::Vid)
                    .string_len(100)
                    .not_null()
                    .primary_key(),
            )
            .col(ColumnDef::new(Column::MediaTypeId).big_integer().not_null())
            .col(ColumnDef::new(Column::Vendor).string().not_null())
            .col(
                ColumnDef::new(Column::LogicalLibraryId)
                    .big_integer()
                    .not_null(),
            )
            .col(ColumnDef::new(Column::TapePoolId).big_integer().not_null())
            .col(ColumnDef::new(Column::EncryptionKeyName).string().null());

        for counter in [
            Column::CapacityInBytes,
            Column::DataInBytes,
            Column::LastFseq,
            Column::NbFiles,
            Column::ReadMountCount,
            Column::WriteMountCount,
        ] {
            table.col(ColumnDef::new(counter).big_integer().not_null().default(0));
        }

        for flag in [
            Column::IsDisabled,
            Column::IsFull,
            Column::IsReadOnly,
            Column::IsFromCastor,
        ] {
            table.col(ColumnDef::new(flag).boolean().not_null().default(false));
        }

        for (drive, time) in [
            (Column::LabelDrive, Column::LabelTime),
            (Column::LastReadDrive, Column::LastReadTime),
            (Column::LastWriteDrive, Column::LastWriteTime),
        ] {
            table
                .col(ColumnDef::new(drive).string().null())
                .col(ColumnDef::new(time).timestamp_with_time_zone().null());
        }

        table
            .col(ColumnDef::new(Column::Comment).string().null())
            .foreign_key(
                ForeignKeyCreateStatement::new()
                    .name("fk_tape_media_type")
                    .from_tbl(Entity)
                    .from_col(Column::MediaTypeId)
                    .to_tbl(media_type::Entity)
                    .to_col(media_type::Column::Id)
                    .on_delete(ForeignKeyAction::Restrict),
            )
            .foreign_key(
                ForeignKeyCreateStatement::new()
                    .name("fk_tape_logical_library")
                    .from_tbl(Entity)
                    .from_col(Column::LogicalLibraryId)
                    .to_tbl(logical_library::Entity)
                    .to_col(logical_library::Column::Id)
                    .on_delete(ForeignKeyAction::Restrict),
            )
            .foreign_key(
                ForeignKeyCreateStatement::new()
                    .name("fk_tape_tape_pool")
                    .from_tbl(Entity)
                    .from_col(Column::TapePoolId)
                    .to_tbl(tape_pool::Entity)
                    .to_col(tape_pool::Column::Id)
                    .on_delete(ForeignKeyAction::Restrict),
            );

        manager
            .create_table(entry_log_columns::<Entity>(&mut table).to_owned())
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-tape-tape-pool-id")
                    .table(Entity)
                    .col(Column::TapePoolId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-tape-logical-library-id")
                    .table(Entity)
                    .col(Column::LogicalLibraryId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-tape-media-type-id")
                    .table(Entity)
                    .col(Column::MediaTypeId)
                    .to_owned(),
            )
            .await
    }
}
