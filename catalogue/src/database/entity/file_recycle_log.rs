//! A deleted tape copy.

use sea_orm::entity::prelude::*;

use super::Json;
use tapecat::checksum::ChecksumBlob;

pub type FileRecycleLogModel = Model;

/// A tape copy removed from the catalogue, kept with the metadata of its
/// archived file so that it can be restored.
///
/// Entries last until the tape they are on is reclaimed, or until they
/// are purged explicitly.
#[derive(Debug, Clone, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "file_recycle_log")]
pub struct Model {
    /// Unique numeric ID of the entry.
    #[sea_orm(primary_key)]
    pub id: i64,

    /// The tape holding the copy.
    #[sea_orm(indexed)]
    pub vid: String,

    pub fseq: i64,

    pub block_id: i64,

    pub copy_nb: i32,

    /// Timestamp when the copy was written.
    pub tape_file_creation_time: ChronoDateTimeUtc,

    /// The archived file the copy was of.
    #[sea_orm(indexed)]
    pub archive_file_id: i64,

    pub disk_instance: String,

    /// ID of the file on the disk instance when the copy was deleted.
    pub disk_file_id: String,

    pub disk_file_path: String,

    pub disk_file_uid: i64,

    pub disk_file_gid: i64,

    pub size_in_bytes: i64,

    pub checksum_blob: Json<ChecksumBlob>,

    /// ID of the storage class of the archived file.
    #[sea_orm(indexed)]
    pub storage_class_id: i64,

    pub archive_file_creation_time: ChronoDateTimeUtc,

    pub reconciliation_time: ChronoDateTimeUtc,

    /// Why the copy was deleted.
    pub reason_log: String,

    /// Timestamp when the copy was deleted.
    pub recycle_log_time: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tape::Entity",
        from = "Column::Vid",
        to = "super::tape::Column::Vid"
    )]
    Tape,

    #[sea_orm(
        belongs_to = "super::storage_class::Entity",
        from = "Column::StorageClassId",
        to = "super::storage_class::Column::Id"
    )]
    StorageClass,
}

impl Related<super::tape::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tape.def()
    }
}

impl Related<super::storage_class::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StorageClass.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
