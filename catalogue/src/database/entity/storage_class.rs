//! A storage class.

use sea_orm::entity::prelude::*;

pub type StorageClassModel = Model;

/// A storage class.
///
/// A storage class is identified by its name within a disk instance, and
/// says how many tape copies files of the class must have.
#[derive(Debug, Clone, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "storage_class")]
pub struct Model {
    /// Unique numeric ID of the storage class.
    #[sea_orm(primary_key)]
    pub id: i64,

    /// The disk instance the storage class belongs to.
    #[sea_orm(indexed)]
    pub disk_instance: String,

    /// Name of the storage class, unique within the disk instance.
    pub name: String,

    /// Number of tape copies required.
    pub nb_copies: i32,

    pub comment: String,

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
    #[sea_orm(has_many = "super::archive_route::Entity")]
    ArchiveRoute,

    #[sea_orm(has_many = "super::archive_file::Entity")]
    ArchiveFile,
}

impl Related<super::archive_route::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ArchiveRoute.def()
    }
}

impl Related<super::archive_file::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ArchiveFile.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

entry_logs!();
