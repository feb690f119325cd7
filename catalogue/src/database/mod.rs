pub mod entity;
pub mod migration;

use async_trait::async_trait;
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::{ActiveModelTrait, Condition, ConnectionTrait, PaginatorTrait, QueryFilter};

use crate::error::{CatalogueError, CatalogueResult, EntityType};
use entity::archive_file::{self, ArchiveFileModel, Entity as ArchiveFile};
use entity::logical_library::{self, Entity as LogicalLibrary, LogicalLibraryModel};
use entity::media_type::{self, Entity as MediaType, MediaTypeModel};
use entity::mount_policy::{self, Entity as MountPolicy, MountPolicyModel};
use entity::storage_class::{self, Entity as StorageClass, StorageClassModel};
use entity::tape::{self, Entity as Tape, TapeModel};
use entity::tape_file::{self, Entity as TapeFile};
use entity::tape_pool::{self, Entity as TapePool, TapePoolModel};
use entity::virtual_organization::{
    self, Entity as VirtualOrganization, VirtualOrganizationModel,
};
use entity::Provenance;
use tapecat::identity::{EntryLog, SecurityIdentity};

/// Lookups shared by the registries.
///
/// Implemented for connections and transactions alike, so that checks
/// made inside a transaction see its uncommitted writes.
#[async_trait]
pub trait CatalogueDatabase: Send + Sync {
    /// Retrieves a virtual organization by name.
    async fn find_virtual_organization(&self, name: &str)
        -> CatalogueResult<VirtualOrganizationModel>;

    /// Retrieves a storage class by disk instance and name.
    async fn find_storage_class(
        &self,
        disk_instance: &str,
        name: &str,
    ) -> CatalogueResult<StorageClassModel>;

    /// Retrieves a tape pool by name.
    async fn find_tape_pool(&self, name: &str) -> CatalogueResult<TapePoolModel>;

    /// Retrieves a logical library by name.
    async fn find_logical_library(&self, name: &str) -> CatalogueResult<LogicalLibraryModel>;

    /// Retrieves a media type by name.
    async fn find_media_type(&self, name: &str) -> CatalogueResult<MediaTypeModel>;

    /// Retrieves a tape by VID.
    async fn find_tape(&self, vid: &str) -> CatalogueResult<TapeModel>;

    /// Retrieves a mount policy by name.
    async fn find_mount_policy(&self, name: &str) -> CatalogueResult<MountPolicyModel>;

    /// Retrieves an archive file by ID, without its tape copies.
    async fn find_archive_file(&self, archive_file_id: u64) -> CatalogueResult<ArchiveFileModel>;

    /// Counts the tape copies on a tape that have not been superseded.
    async fn count_live_tape_files(&self, vid: &str) -> CatalogueResult<u64>;
}

#[async_trait]
impl<C: ConnectionTrait + Send + Sync> CatalogueDatabase for C {
    async fn find_virtual_organization(
        &self,
        name: &str,
    ) -> CatalogueResult<VirtualOrganizationModel> {
        VirtualOrganization::find()
            .filter(virtual_organization::Column::Name.eq(name))
            .one(self)
            .await
            .map_err(CatalogueError::database_error)?
            .ok_or_else(|| CatalogueError::not_found(EntityType::VirtualOrganization, name))
    }

    async fn find_storage_class(
        &self,
        disk_instance: &str,
        name: &str,
    ) -> CatalogueResult<StorageClassModel> {
        StorageClass::find()
            .filter(storage_class::Column::DiskInstance.eq(disk_instance))
            .filter(storage_class::Column::Name.eq(name))
            .one(self)
            .await
            .map_err(CatalogueError::database_error)?
            .ok_or_else(|| {
                CatalogueError::not_found(
                    EntityType::StorageClass,
                    storage_class_key(disk_instance, name),
                )
            })
    }

    async fn find_tape_pool(&self, name: &str) -> CatalogueResult<TapePoolModel> {
        TapePool::find()
            .filter(tape_pool::Column::Name.eq(name))
            .one(self)
            .await
            .map_err(CatalogueError::database_error)?
            .ok_or_else(|| CatalogueError::not_found(EntityType::TapePool, name))
    }

    async fn find_logical_library(&self, name: &str) -> CatalogueResult<LogicalLibraryModel> {
        LogicalLibrary::find()
            .filter(logical_library::Column::Name.eq(name))
            .one(self)
            .await
            .map_err(CatalogueError::database_error)?
            .ok_or_else(|| CatalogueError::not_found(EntityType::LogicalLibrary, name))
    }

    async fn find_media_type(&self, name: &str) -> CatalogueResult<MediaTypeModel> {
        MediaType::find()
            .filter(media_type::Column::Name.eq(name))
            .one(self)
            .await
            .map_err(CatalogueError::database_error)?
            .ok_or_else(|| CatalogueError::not_found(EntityType::MediaType, name))
    }

    async fn find_tape(&self, vid: &str) -> CatalogueResult<TapeModel> {
        Tape::find_by_id(vid.to_owned())
            .one(self)
            .await
            .map_err(CatalogueError::database_error)?
            .ok_or_else(|| CatalogueError::not_found(EntityType::Tape, vid))
    }

    async fn find_mount_policy(&self, name: &str) -> CatalogueResult<MountPolicyModel> {
        MountPolicy::find()
            .filter(mount_policy::Column::Name.eq(name))
            .one(self)
            .await
            .map_err(CatalogueError::database_error)?
            .ok_or_else(|| CatalogueError::not_found(EntityType::MountPolicy, name))
    }

    async fn find_archive_file(&self, archive_file_id: u64) -> CatalogueResult<ArchiveFileModel> {
        ArchiveFile::find_by_id(archive_file_id as i64)
            .one(self)
            .await
            .map_err(CatalogueError::database_error)?
            .ok_or_else(|| CatalogueError::not_found(EntityType::ArchiveFile, archive_file_id))
    }

    async fn count_live_tape_files(&self, vid: &str) -> CatalogueResult<u64> {
        TapeFile::find()
            .filter(tape_file::Column::Vid.eq(vid))
            .filter(tape_file::Column::SupersededByVid.is_null())
            .count(self)
            .await
            .map_err(CatalogueError::database_error)
    }
}

/// Returns the key a storage class is reported under in errors.
pub fn storage_class_key(disk_instance: &str, name: &str) -> String {
    format!("{}:{}", disk_instance, name)
}

/// Turns the outcome of a lookup into whether the entry exists.
///
/// Only a missing entry counts as absent. Any other failure is passed on.
pub fn exists<T>(lookup: CatalogueResult<T>) -> CatalogueResult<bool> {
    match lookup {
        Ok(_) => Ok(true),
        Err(CatalogueError::NotFound { .. }) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Fills in the creation and modification logs of a new row.
///
/// Both logs are identical until the row is first modified.
pub fn stamp_creation<A>(model: &mut A, log: &EntryLog)
where
    A: ActiveModelTrait,
    A::Entity: Provenance,
{
    model.set(
        <A::Entity as Provenance>::CREATION_LOG_USER_NAME,
        log.username.clone().into(),
    );
    model.set(
        <A::Entity as Provenance>::CREATION_LOG_HOST_NAME,
        log.host.clone().into(),
    );
    model.set(<A::Entity as Provenance>::CREATION_LOG_TIME, log.time.into());
    model.set(
        <A::Entity as Provenance>::LAST_UPDATE_USER_NAME,
        log.username.clone().into(),
    );
    model.set(
        <A::Entity as Provenance>::LAST_UPDATE_HOST_NAME,
        log.host.clone().into(),
    );
    model.set(<A::Entity as Provenance>::LAST_UPDATE_TIME, log.time.into());
}

/// Applies changes to the rows matching a condition, stamping their
/// modification logs.
///
/// Returns the number of rows changed.
pub async fn update_entry<E, C>(
    db: &C,
    admin: &SecurityIdentity,
    condition: Condition,
    changes: Vec<(E::Column, SimpleExpr)>,
) -> Result<u64, DbErr>
where
    E: Provenance,
    C: ConnectionTrait + Send + Sync,
{
    let log = EntryLog::now(admin);

    let mut update = E::update_many()
        .col_expr(E::LAST_UPDATE_USER_NAME, Expr::value(log.username))
        .col_expr(E::LAST_UPDATE_HOST_NAME, Expr::value(log.host))
        .col_expr(E::LAST_UPDATE_TIME, Expr::value(log.time));

    for (column, value) in changes {
        update = update.col_expr(column, value);
    }

    let result = update.filter(condition).exec(db).await?;

    Ok(result.rows_affected)
}

/// Like [`update_entry`], for changes that must match exactly one entry.
pub async fn modify_entry<E, C>(
    db: &C,
    admin: &SecurityIdentity,
    entity: EntityType,
    key: &str,
    condition: Condition,
    changes: Vec<(E::Column, SimpleExpr)>,
) -> CatalogueResult<()>
where
    E: Provenance,
    C: ConnectionTrait + Send + Sync,
{
    let updated = update_entry::<E, C>(db, admin, condition, changes)
        .await
        .map_err(CatalogueError::database_error)?;

    if updated == 0 {
        return Err(CatalogueError::not_found(entity, key));
    }

    Ok(())
}
