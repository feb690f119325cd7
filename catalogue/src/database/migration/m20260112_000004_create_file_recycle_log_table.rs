use sea_orm_migration::prelude::*;

use crate::database::entity::file_recycle_log::*;
use crate::database::entity::storage_class;
use crate::database::entity::tape;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20260112_000004_create_file_recycle_log_table"
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
            .col(ColumnDef::new(Column::Vid).string_len(100).not_null())
            .col(ColumnDef::new(Column::CopyNb).integer().not_null());

        for column in [
            Column::Fseq,
            Column::BlockId,
            Column::ArchiveFileId,
            Column::DiskFileUid,
            Column::DiskFileGid,
            Column::SizeInBytes,
            Column::StorageClassId,
        ] {
            table.col(ColumnDef::new(column).big_integer().not_null());
        }

        for column in [
            Column::DiskInstance,
            Column::DiskFileId,
            Column::DiskFilePath,
            Column::ChecksumBlob,
            Column::ReasonLog,
        ] {
            table.col(ColumnDef::new(column).string().not_null());
        }

        for column in [
            Column::TapeFileCreationTime,
            Column::ArchiveFileCreationTime,
            Column::ReconciliationTime,
            Column::RecycleLogTime,
        ] {
            table.col(ColumnDef::new(column).timestamp_with_time_zone().not_null());
        }

        table
            .foreign_key(
                ForeignKeyCreateStatement::new()
                    .name("fk_file_recycle_log_tape")
                    .from_tbl(Entity)
                    .from_col(Column::Vid)
                    .to_tbl(tape::Entity)
                    .to_col(tape::Column::Vid)
                    .on_delete(ForeignKeyAction::Restrict),
            )
            .foreign_key(
                ForeignKeyCreateStatement::new()
                    .name("fk_file_recycle_log_storage_class")
                    .from_tbl(Entity)
                    .from_col(Column::StorageClassId)
                    .to_tbl(storage_class::Entity)
                    .to_col(storage_class::Column::Id)
                    .on_delete(ForeignKeyAction::Restrict),
            );

        manager.create_table(table.to_owned()).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-file-recycle-log-vid")
                    .table(Entity)
                    .col(Column::Vid)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-file-recycle-log-archive-file-id")
                    .table(Entity)
                    .col(Column::ArchiveFileId)
                    .to_owned(),
            )
            .await
    }
}
