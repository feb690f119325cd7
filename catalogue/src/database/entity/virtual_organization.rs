//! A virtual organization.

use sea_orm::entity::prelude::*;

pub type VirtualOrganizationModel = Model;

/// A virtual organization.
///
/// Tape pools belong to exactly one virtual organization.
#[derive(Debug, Clone, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "virtual_organization")]
pub struct Model {
    /// Unique numeric ID of the virtual organization.
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Unique name of the virtual organization.
    #[sea_orm(unique, indexed)]
    pub name: String,

    /// Maximum number of drives the organization may use for retrieval.
    pub read_max_drives: i64,

    /// Maximum number of drives the organization may use for archival.
    pub write_max_drives: i64,

    /// Maximum size of a single archived file, in bytes.
    ///
    /// Zero means unlimited.
    pub max_file_size: i64,

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
    #[sea_orm(has_many = "super::tape_pool::Entity")]
    TapePool,
}

impl Related<super::tape_pool::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TapePool.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

entry_logs!();
