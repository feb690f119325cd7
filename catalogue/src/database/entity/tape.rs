//! A tape.

use sea_orm::entity::prelude::*;

pub type TapeModel = Model;

/// A tape.
///
/// `last_fseq`, `data_in_bytes` and `nb_files` only ever change through
/// the ingestion and reclamation paths.
#[derive(Debug, Clone, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tape")]
pub struct Model {
    /// The volume identifier.
    #[sea_orm(primary_key, auto_increment = false)]
    pub vid: String,

    /// ID of the media type of the cartridge.
    #[sea_orm(indexed)]
    pub media_type_id: i64,

    pub vendor: String,

    /// ID of the logical library the tape is in.
    #[sea_orm(indexed)]
    pub logical_library_id: i64,

    /// ID of the tape pool the tape belongs to.
    #[sea_orm(indexed)]
    pub tape_pool_id: i64,

    /// Name of the key the tape is encrypted with.
    pub encryption_key_name: Option<String>,

    pub capacity_in_bytes: i64,

    /// Bytes written to the tape since it was last reclaimed.
    pub data_in_bytes: i64,

    /// fSeq of the last item written to the tape.
    pub last_fseq: i64,

    /// Number of files written to the tape since it was last reclaimed.
    ///
    /// Placeholders consume an fSeq but are not counted.
    pub nb_files: i64,

    pub is_disabled: bool,

    pub is_full: bool,

    pub is_read_only: bool,

    /// Whether the tape was imported from the legacy system.
    pub is_from_castor: bool,

    /// Drive the tape was labelled in.
    pub label_drive: Option<String>,

    pub label_time: Option<ChronoDateTimeUtc>,

    pub last_read_drive: Option<String>,

    pub last_read_time: Option<ChronoDateTimeUtc>,

    pub last_write_drive: Option<String>,

    pub last_write_time: Option<ChronoDateTimeUtc>,

    pub read_mount_count: i64,

    pub write_mount_count: i64,

    pub comment: Option<String>,

    /// Username of the administrator who created the entry.
    pub creation_log_user_name: String,

    /// Host the entry was created from.
    pub creation_log_host_name: String,

    /// Timestamp when the entry was created.
    pub creation_log_time: ChronoDateTimeUtc,

    /// Username of the administrator who last modified the entry.
    pub last_update_user_name: String,

    /// Host the entry was last modified from.
    pub last_update_host_name: String,

    /// Timestamp when the entry was last modified.
    pub last_update_time: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::media_type::Entity",
        from = "Column::MediaTypeId",
        to = "super::media_type::Column::Id"
    )]
    MediaType,

    #[sea_orm(
        belongs_to = "super::logical_library::Entity",
        from = "Column::LogicalLibraryId",
        to = "super::logical_library::Column::Id"
    )]
    LogicalLibrary,

    #[sea_orm(
        belongs_to = "super::tape_pool::Entity",
        from = "Column::TapePoolId",
        to = "super::tape_pool::Column::Id"
    )]
    TapePool,

    #[sea_orm(has_many = "super::tape_file::Entity")]
    TapeFile,
}

impl Related<super::media_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MediaType.def()
    }
}

impl Related<super::logical_library::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LogicalLibrary.def()
    }
}

impl Related<super::tape_pool::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TapePool.def()
    }
}

impl Related<super::tape_file::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TapeFile.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

entry_logs!();
