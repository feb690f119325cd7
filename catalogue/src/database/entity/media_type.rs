//! A media type.

use sea_orm::entity::prelude::*;

pub type MediaTypeModel = Model;

/// A type of tape cartridge, such as a generation of LTO.
///
/// Every tape is of exactly one media type.
#[derive(Debug, Clone, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "media_type")]
pub struct Model {
    /// Unique numeric ID of the media type.
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Unique name of the media type.
    #[sea_orm(unique, indexed)]
    pub name: String,

    /// The cartridge model, e.g. "LTO-8".
    pub cartridge: String,

    /// Nominal capacity of a cartridge, in bytes.
    pub capacity_in_bytes: i64,

    /// Density code reported by drives for the primary format.
    pub primary_density_code: Option<i32>,

    /// Density code reported by drives for the secondary format.
    pub secondary_density_code: Option<i32>,

    pub nb_wraps: Option<i64>,

    /// Lowest longitudinal position a file can be written at.
    pub min_lpos: Option<i64>,

    /// Highest longitudinal position a file can be written at.
    pub max_lpos: Option<i64>,

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
