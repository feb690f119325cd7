use sea_orm_migration::prelude::*;

use crate::database::entity::archive_file;
use crate::database::entity::tape;
use crate::database::entity::tape_file::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20260106_000002_create_tape_file_table"
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
                        ColumnDef::new(Column::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Column::Vid).string_len(100).not_null())
                    .col(ColumnDef::new(Column::Fseq).big_integer().not_null())
                    .col(ColumnDef::new(Column::BlockId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Column::LogicalSizeInBytes)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Column::CopyNb).integer().not_null())
                    .col(
                        ColumnDef::new(Column::CreationTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Column::ArchiveFileId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Column::SupersededByVid)
                            .string_len(100)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Column::SupersededByFseq)
                            .big_integer()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKeyCreateStatement::new()
                            .name("fk_tape_file_tape")
                            .from_tbl(Entity)
                            .from_col(Column::Vid)
                            .to_tbl(tape::Entity)
                            .to_col(tape::Column::Vid)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKeyCreateStatement::new()
                            .name("fk_tape_file_archive_file")
                            .from_tbl(Entity)
                            .from_col(Column::ArchiveFileId)
                            .to_tbl(archive_file::Entity)
                            .to_col(archive_file::Column::ArchiveFileId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Not unique: superseded copies stay behind on reclaimed tapes
        // while the fSeqs they used are written again.
        manager
            .create_index(
                Index::create()
                    .name("idx-tape-file-vid-fseq")
                    .table(Entity)
                    .col(Column::Vid)
                    .col(Column::Fseq)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-tape-file-archive-file-id-copy-nb")
                    .table(Entity)
                    .col(Column::ArchiveFileId)
                    .col(Column::CopyNb)
                    .to_owned(),
            )
            .await
    }
}
