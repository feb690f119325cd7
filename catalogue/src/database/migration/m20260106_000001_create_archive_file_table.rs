use sea_orm_migration::prelude::*;

use crate::database::entity::archive_file::*;
use crate::database::entity::storage_class;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20260106_000001_create_archive_file_table"
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
                    .col(
                        ColumnDef::new(Column::ArchiveFileId)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Column::DiskInstance)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Column::DiskFileId).string().not_null())
                    .col(ColumnDef::new(Column::DiskFilePath).string().not_null())
                    .col(ColumnDef::new(Column::DiskFileUid).big_integer().not_null())
                    .col(ColumnDef::new(Column::DiskFileGid).big_integer().not_null())
                    .col(ColumnDef::new(Column::SizeInBytes).big_integer().not_null())
                    .col(ColumnDef::new(Column::ChecksumBlob).text().not_null())
                    .col(
                        ColumnDef::new(Column::StorageClassId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Column::CreationTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Column::ReconciliationTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKeyCreateStatement::new()
                            .name("fk_archive_file_storage_class")
                            .from_tbl(Entity)
                            .from_col(Column::StorageClassId)
                            .to_tbl(storage_class::Entity)
                            .to_col(storage_class::Column::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-archive-file-disk-instance-disk-file-id")
                    .table(Entity)
                    .col(Column::DiskInstance)
                    .col(Column::DiskFileId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-archive-file-storage-class-id")
                    .table(Entity)
                    .col(Column::StorageClassId)
                    .to_owned(),
            )
            .await
    }
}
