//! A mount policy.

use sea_orm::entity::prelude::*;

pub type MountPolicyModel = Model;

/// A mount policy.
///
/// Controls how eagerly queued requests trigger a tape mount.
#[derive(Debug, Clone, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "mount_policy")]
pub struct Model {
    /// Unique numeric ID of the policy.
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Unique name of the policy.
    #[sea_orm(unique, indexed)]
    pub name: String,

    pub archive_priority: i64,

    /// Minimum age of an archive request before it may trigger a mount, in seconds.
    pub archive_min_request_age: i64,

    pub retrieve_priority: i64,

    /// Minimum age of a retrieve request before it may trigger a mount, in seconds.
    pub retrieve_min_request_age: i64,

    pub max_drives_allowed: i64,

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
    #[sea_orm(has_many = "super::requester_mount_rule::Entity")]
    RequesterMountRule,

    #[sea_orm(has_many = "super::requester_group_mount_rule::Entity")]
    RequesterGroupMountRule,
}

impl Related<super::requester_mount_rule::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RequesterMountRule.def()
    }
}

impl Related<super::requester_group_mount_rule::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RequesterGroupMountRule.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

entry_logs!();
