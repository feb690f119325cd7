//! An archive route.

use sea_orm::entity::prelude::*;

pub type ArchiveRouteModel = Model;

/// An archive route.
///
/// Routes copy number `copy_nb` of files in a storage class to a tape pool.
#[derive(Debug, Clone, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "archive_route")]
pub struct Model {
    /// Unique numeric ID of the route.
    #[sea_orm(primary_key)]
    pub id: i64,

    /// ID of the storage class.
    #[sea_orm(indexed)]
    pub storage_class_id: i64,

    /// The copy number.
    ///
    /// Unique within the storage class.
    pub copy_nb: i32,

    /// ID of the destination tape pool.
    ///
    /// Unique within the storage class.
    #[sea_orm(indexed)]
    pub tape_pool_id: i64,

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
    #[sea_orm(
        belongs_to = "super::storage_class::Entity",
        from = "Column::StorageClassId",
        to = "super::storage_class::Column::Id"
    )]
    StorageClass,

    #[sea_orm(
        belongs_to = "super::tape_pool::Entity",
        from = "Column::TapePoolId",
        to = "super::tape_pool::Column::Id"
    )]
    TapePool,
}

impl Related<super::storage_class::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StorageClass.def()
    }
}

impl Related<super::tape_pool::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TapePool.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

entry_logs!();
