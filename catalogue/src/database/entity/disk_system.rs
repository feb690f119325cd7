//! A disk system.

use sea_orm::entity::prelude::*;

pub type DiskSystemModel = Model;

/// A disk system whose free space gates retrieve requests.
#[derive(Debug, Clone, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "disk_system")]
pub struct Model {
    /// Unique numeric ID of the disk system.
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Unique name of the disk system.
    #[sea_orm(unique, indexed)]
    pub name: String,

    /// Regular expression matching destination URLs on the disk system.
    pub file_regexp: String,

    pub free_space_query_url: String,

    /// How often to refresh the free space, in seconds.
    pub refresh_interval: i64,

    /// Free space to keep on the disk system, in bytes.
    pub targeted_free_space: i64,

    /// How long to back off when the disk system is full, in seconds.
    pub sleep_time: i64,

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
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

entry_logs!();
