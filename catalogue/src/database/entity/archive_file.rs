//! An archived file.

use sea_orm::entity::prelude::*;

use super::Json;
use tapecat::checksum::ChecksumBlob;

pub type ArchiveFileModel = Model;

/// A file archived to tape.
///
/// The tape copies of the file are in `tape_file`.
#[derive(Debug, Clone, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "archive_file")]
pub struct Model {
    /// The archive file ID.
    ///
    /// Allocated from `archive_file_id` before the file is written.
    #[sea_orm(primary_key, auto_increment = false)]
    pub archive_file_id: i64,

    /// The disk instance the file was archived from.
    pub disk_instance: String,

    /// ID of the file on the disk instance.
    pub disk_file_id: String,

    /// Path of the file on the disk instance when it was archived.
    pub disk_file_path: String,

    pub disk_file_uid: i64,

    pub disk_file_gid: i64,

    pub size_in_bytes: i64,

    /// Checksums of the file contents.
    pub checksum_blob: Json<ChecksumBlob>,

    /// ID of the storage class of the file.
    #[sea_orm(indexed)]
    pub storage_class_id: i64,

    /// Timestamp when the first copy of the file was written.
    pub creation_time: ChronoDateTimeUtc,

    /// Timestamp when the disk metadata was last reconciled.
    pub reconciliation_time: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::storage_class::Entity",
        from = "Column::StorageClassId",
        to = "super::storage_class::Column::Id"
    )]
    StorageClass,

    #[sea_orm(has_many = "super::tape_file::Entity")]
    TapeFile,
}

impl Related<super::storage_class::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StorageClass.def()
    }
}

impl Related<super::tape_file::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TapeFile.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
