//! Database migrations.

pub use sea_orm_migration::*;

use sea_orm_migration::prelude::{ColumnDef, TableCreateStatement};

use super::entity::Provenance;

mod m20260104_000001_create_media_type_table;
mod m20260105_000001_create_admin_user_table;
mod m20260105_000002_create_virtual_organization_table;
mod m20260105_000003_create_storage_class_table;
mod m20260105_000004_create_tape_pool_table;
mod m20260105_000005_create_archive_route_table;
mod m20260105_000006_create_logical_library_table;
mod m20260105_000007_create_tape_table;
mod m20260105_000008_create_mount_policy_table;
mod m20260105_000009_create_requester_mount_rule_table;
mod m20260105_000010_create_requester_group_mount_rule_table;
mod m20260106_000001_create_archive_file_table;
mod m20260106_000002_create_tape_file_table;
mod m20260106_000003_create_archive_file_id_table;
mod m20260112_000001_create_disk_system_table;
mod m20260112_000002_create_activities_fair_share_weight_table;
mod m20260112_000003_create_catalogue_schema_table;
mod m20260112_000004_create_file_recycle_log_table;

/// Major version of the schema created by these migrations.
pub const SCHEMA_VERSION_MAJOR: i32 = 1;

/// Minor version of the schema created by these migrations.
pub const SCHEMA_VERSION_MINOR: i32 = 0;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260104_000001_create_media_type_table::Migration),
            Box::new(m20260105_000001_create_admin_user_table::Migration),
            Box::new(m20260105_000002_create_virtual_organization_table::Migration),
            Box::new(m20260105_000003_create_storage_class_table::Migration),
            Box::new(m20260105_000004_create_tape_pool_table::Migration),
            Box::new(m20260105_000005_create_archive_route_table::Migration),
            Box::new(m20260105_000006_create_logical_library_table::Migration),
            Box::new(m20260105_000007_create_tape_table::Migration),
            Box::new(m20260105_000008_create_mount_policy_table::Migration),
            Box::new(m20260105_000009_create_requester_mount_rule_table::Migration),
            Box::new(m20260105_000010_create_requester_group_mount_rule_table::Migration),
            Box::new(m20260106_000001_create_archive_file_table::Migration),
            Box::new(m20260106_000002_create_tape_file_table::Migration),
            Box::new(m20260106_000003_create_archive_file_id_table::Migration),
            Box::new(m20260112_000001_create_disk_system_table::Migration),
            Box::new(m20260112_000002_create_activities_fair_share_weight_table::Migration),
            Box::new(m20260112_000003_create_catalogue_schema_table::Migration),
            Box::new(m20260112_000004_create_file_recycle_log_table::Migration),
        ]
    }
}

/// Adds the creation and last-modification log columns of an entity.
fn entry_log_columns<E: Provenance>(table: &mut TableCreateStatement) -> &mut TableCreateStatement {
    table
        .col(ColumnDef::new(E::CREATION_LOG_USER_NAME).string().not_null())
        .col(ColumnDef::new(E::CREATION_LOG_HOST_NAME).string().not_null())
        .col(
            ColumnDef::new(E::CREATION_LOG_TIME)
                .timestamp_with_time_zone()
                .not_null(),
        )
        .col(ColumnDef::new(E::LAST_UPDATE_USER_NAME).string().not_null())
        .col(ColumnDef::new(E::LAST_UPDATE_HOST_NAME).string().not_null())
        .col(
            ColumnDef::new(E::LAST_UPDATE_TIME)
                .timestamp_with_time_zone()
                .not_null(),
        )
}
