//! A tape copy of an archived file.

use sea_orm::entity::prelude::*;

pub type TapeFileModel = Model;

/// A tape copy of an archived file.
///
/// At most one copy per (archive file, copy number) is live. The others
/// were replaced by a later write, usually a repack, and point at their
/// replacement through `superseded_by_vid` and `superseded_by_fseq`.
#[derive(Debug, Clone, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tape_file")]
pub struct Model {
    /// Unique numeric ID of the copy.
    #[sea_orm(primary_key)]
    pub id: i64,

    /// The tape holding the copy.
    pub vid: String,

    pub fseq: i64,

    pub block_id: i64,

    pub logical_size_in_bytes: i64,

    pub copy_nb: i32,

    pub creation_time: ChronoDateTimeUtc,

    /// The archived file this is a copy of.
    #[sea_orm(indexed)]
    pub archive_file_id: i64,

    pub superseded_by_vid: Option<String>,

    pub superseded_by_fseq: Option<i64>,
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
        belongs_to = "super::archive_file::Entity",
        from = "Column::ArchiveFileId",
        to = "super::archive_file::Column::ArchiveFileId"
    )]
    ArchiveFile,
}

impl Related<super::tape::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tape.def()
    }
}

impl Related<super::archive_file::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ArchiveFile.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
