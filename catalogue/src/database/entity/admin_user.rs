//! An administrator of the catalogue.

use sea_orm::entity::prelude::*;

pub type AdminUserModel = Model;

/// An administrator.
#[derive(Debug, Clone, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "admin_user")]
pub struct Model {
    /// Unique numeric ID of the administrator.
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Unique username of the administrator.
    #[sea_orm(unique, indexed)]
    pub name: String,

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
