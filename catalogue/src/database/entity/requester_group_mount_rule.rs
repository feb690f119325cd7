//! A requester group mount rule.

use sea_orm::entity::prelude::*;

/// A requester group mount rule.
///
/// Applies to every requester of the group that has no rule of its own.
#[derive(Debug, Clone, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "requester_group_mount_rule")]
pub struct Model {
    /// Unique numeric ID of the rule.
    #[sea_orm(primary_key)]
    pub id: i64,

    /// The disk instance the rule applies to.
    pub disk_instance: String,

    /// Name of the requester group.
    ///
    /// Unique within the disk instance.
    pub requester_group_name: String,

    /// ID of the mount policy to apply.
    #[sea_orm(indexed)]
    pub mount_policy_id: i64,

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
        belongs_to = "super::mount_policy::Entity",
        from = "Column::MountPolicyId",
        to = "super::mount_policy::Column::Id"
    )]
    MountPolicy,
}

impl Related<super::mount_policy::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MountPolicy.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

entry_logs!();
