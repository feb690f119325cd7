//! Archive file ID allocations.
//!
//! Every allocation inserts a row and uses the generated key, so two
//! callers can never be handed the same ID.

use sea_orm::entity::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "archive_file_id")]
pub struct Model {
    /// The allocated ID.
    #[sea_orm(primary_key)]
    pub id: i64,

    pub allocated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
