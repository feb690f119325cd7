//! Fair share weights of retrieve activities.

use sea_orm::entity::prelude::*;

pub type ActivitiesFairShareWeightModel = Model;

/// The share of drives a retrieve activity gets within a disk instance.
#[derive(Debug, Clone, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "activities_fair_share_weight")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub disk_instance: String,

    /// Name of the activity, unique within the disk instance.
    pub activity: String,

    /// The weight, in (0, 1].
    pub weight: f64,

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
