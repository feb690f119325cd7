//! A logical library.

use sea_orm::entity::prelude::*;

pub type LogicalLibraryModel = Model;

/// A logical library: a named set of drives and the tapes they can mount.
#[derive(Debug, Clone, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "logical_library")]
pub struct Model {
    /// Unique numeric ID of the library.
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Unique name of the library.
    #[sea_orm(unique, indexed)]
    pub name: String,

    /// Whether the library is disabled.
    pub is_disabled: bool,

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
    #[sea_orm(has_many = "super::tape::Entity")]
    Tape,
}

impl Related<super::tape::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tape.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

entry_logs!();
