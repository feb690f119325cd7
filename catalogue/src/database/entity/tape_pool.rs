//! A tape pool.

use sea_orm::entity::prelude::*;

pub type TapePoolModel = Model;

/// A tape pool.
///
/// The occupancy of a pool is never stored here. It is summed from the
/// tapes of the pool whenever it is read.
#[derive(Debug, Clone, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tape_pool")]
pub struct Model {
    /// Unique numeric ID of the tape pool.
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Unique name of the tape pool.
    #[sea_orm(unique, indexed)]
    pub name: String,

    /// ID of the virtual organization owning the pool.
    #[sea_orm(indexed)]
    pub virtual_organization_id: i64,

    /// Number of tapes that may be partially filled at the same time.
    pub nb_partial_tapes: i64,

    /// Whether tapes of the pool are encrypted.
    pub is_encrypted: bool,

    /// Optional supply mechanism, usually the names of pools to take
    /// fresh tapes from.
    pub supply: Option<String>,

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
        belongs_to = "super::virtual_organization::Entity",
        from = "Column::VirtualOrganizationId",
        to = "super::virtual_organization::Column::Id"
    )]
    VirtualOrganization,

    #[sea_orm(has_many = "super::tape::Entity")]
    Tape,

    #[sea_orm(has_many = "super::archive_route::Entity")]
    ArchiveRoute,
}

impl Related<super::virtual_organization::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VirtualOrganization.def()
    }
}

impl Related<super::tape::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tape.def()
    }
}

impl Related<super::archive_route::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ArchiveRoute.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

entry_logs!();
