use sea_orm::entity::prelude::*;
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::ActiveValue::Set;
use sea_orm::{Condition, PaginatorTrait};
use tracing::instrument;

use crate::database::entity::archive_file::{self, Entity as ArchiveFile};
use crate::database::entity::archive_route::{self, Entity as ArchiveRoute};
use crate::database::entity::file_recycle_log::{self, Entity as FileRecycleLog};
use crate::database::entity::storage_class::{self, Entity as StorageClass, StorageClassModel};
use crate::database::{
    exists, modify_entry, stamp_creation, storage_class_key, update_entry, CatalogueDatabase,
};
use crate::error::{CatalogueError, CatalogueResult, EntityType};
use crate::types;
use crate::validation::{db_int, non_empty, non_zero};
use crate::Catalogue;
use tapecat::identity::{EntryLog, SecurityIdentity};

impl Catalogue {
    #[instrument(skip_all, fields(disk_instance = %disk_instance, name = %name))]
    pub async fn create_storage_class(
        &self,
        admin: &SecurityIdentity,
        disk_instance: &str,
        name: &str,
        nb_copies: u64,
        comment: &str,
    ) -> CatalogueResult<()> {
        non_empty("disk_instance", disk_instance)?;
        non_empty("name", name)?;
        non_zero("nb_copies", nb_copies)?;
        non_empty("comment", comment)?;
        let nb_copies = nb_copies_value(nb_copies)?;

        let key = storage_class_key(disk_instance, name);
        let db = self.database().await?;

        if exists(db.find_storage_class(disk_instance, name).await)? {
            return Err(CatalogueError::already_exists(EntityType::StorageClass, key));
        }

        let mut model = storage_class::ActiveModel {
            disk_instance: Set(disk_instance.to_owned()),
            name: Set(name.to_owned()),
            nb_copies: Set(nb_copies),
            comment: Set(comment.to_owned()),
            ..Default::default()
        };
        stamp_creation(&mut model, &EntryLog::now(admin));

        StorageClass::insert(model)
            .exec(db)
            .await
            .map_err(|e| CatalogueError::from_write(e, EntityType::StorageClass, &key))?;

        tracing::info!("Created storage class {} by {}", key, admin);

        Ok(())
    }

    /// Deletes a storage class.
    ///
    /// Fails while archive routes, archive files or recycle log entries
    /// reference it.
    #[instrument(skip_all, fields(disk_instance = %disk_instance, name = %name))]
    pub async fn delete_storage_class(&self, disk_instance: &str, name: &str) -> CatalogueResult<()> {
        non_empty("disk_instance", disk_instance)?;
        non_empty("name", name)?;

        let key = storage_class_key(disk_instance, name);
        let db = self.database().await?;
        let storage_class = db.find_storage_class(disk_instance, name).await?;

        let nb_routes = ArchiveRoute::find()
            .filter(archive_route::Column::StorageClassId.eq(storage_class.id))
            .count(db)
            .await
            .map_err(CatalogueError::database_error)?;

        if nb_routes != 0 {
            return Err(CatalogueError::InUse {
                entity: EntityType::StorageClass,
                key,
                reason: format!("{} archive routes use it", nb_routes),
            });
        }

        let nb_files = ArchiveFile::find()
            .filter(archive_file::Column::StorageClassId.eq(storage_class.id))
            .count(db)
            .await
            .map_err(CatalogueError::database_error)?;

        if nb_files != 0 {
            return Err(CatalogueError::InUse {
                entity: EntityType::StorageClass,
                key,
                reason: format!("{} archive files belong to it", nb_files),
            });
        }

        let nb_recycled = FileRecycleLog::find()
            .filter(file_recycle_log::Column::StorageClassId.eq(storage_class.id))
            .count(db)
            .await
            .map_err(CatalogueError::database_error)?;

        if nb_recycled != 0 {
            return Err(CatalogueError::InUse {
                entity: EntityType::StorageClass,
                key,
                reason: format!("{} recycle log entries belong to it", nb_recycled),
            });
        }

        StorageClass::delete_by_id(storage_class.id)
            .exec(db)
            .await
            .map_err(CatalogueError::database_error)?;

        tracing::info!("Deleted storage class {}", key);

        Ok(())
    }

    pub async fn get_storage_classes(&self) -> CatalogueResult<Vec<types::StorageClass>> {
        let db = self.database().await?;

        let classes = StorageClass::find()
            .all(db)
            .await
            .map_err(CatalogueError::database_error)?;

        Ok(classes.into_iter().map(storage_class_from_model).collect())
    }

    pub async fn get_storage_class(
        &self,
        disk_instance: &str,
        name: &str,
    ) -> CatalogueResult<types::StorageClass> {
        non_empty("disk_instance", disk_instance)?;
        non_empty("name", name)?;

        let db = self.database().await?;
        let storage_class = db.find_storage_class(disk_instance, name).await?;

        Ok(storage_class_from_model(storage_class))
    }

    pub async fn modify_storage_class_nb_copies(
        &self,
        admin: &SecurityIdentity,
        disk_instance: &str,
        name: &str,
        nb_copies: u64,
    ) -> CatalogueResult<()> {
        non_zero("nb_copies", nb_copies)?;
        let value = nb_copies_value(nb_copies)?;
        self.modify_storage_class(
            admin,
            disk_instance,
            name,
            storage_class::Column::NbCopies,
            Expr::value(value),
        )
        .await
    }

    pub async fn modify_storage_class_comment(
        &self,
        admin: &SecurityIdentity,
        disk_instance: &str,
        name: &str,
        comment: &str,
    ) -> CatalogueResult<()> {
        non_empty("comment", comment)?;
        self.modify_storage_class(
            admin,
            disk_instance,
            name,
            storage_class::Column::Comment,
            Expr::value(comment),
        )
        .await
    }

    /// Renames a storage class within its disk instance.
    #[instrument(skip_all, fields(disk_instance = %disk_instance, current_name = %current_name, new_name = %new_name))]
    pub async fn modify_storage_class_name(
        &self,
        admin: &SecurityIdentity,
        disk_instance: &str,
        current_name: &str,
        new_name: &str,
    ) -> CatalogueResult<()> {
        non_empty("disk_instance", disk_instance)?;
        non_empty("current_name", current_name)?;
        non_empty("new_name", new_name)?;

        let new_key = storage_class_key(disk_instance, new_name);
        let db = self.database().await?;

        if current_name != new_name && exists(db.find_storage_class(disk_instance, new_name).await)? {
            return Err(CatalogueError::already_exists(EntityType::StorageClass, new_key));
        }

        let updated = update_entry::<StorageClass, _>(
            db,
            admin,
            storage_class_condition(disk_instance, current_name),
            vec![(storage_class::Column::Name, Expr::value(new_name))],
        )
        .await
        .map_err(|e| CatalogueError::from_write(e, EntityType::StorageClass, &new_key))?;

        if updated == 0 {
            return Err(CatalogueError::not_found(
                EntityType::StorageClass,
                storage_class_key(disk_instance, current_name),
            ));
        }

        tracing::info!(
            "Renamed storage class {} to {} by {}",
            storage_class_key(disk_instance, current_name),
            new_key,
            admin
        );

        Ok(())
    }

    #[instrument(skip_all, fields(disk_instance = %disk_instance, name = %name, column = ?column))]
    async fn modify_storage_class(
        &self,
        admin: &SecurityIdentity,
        disk_instance: &str,
        name: &str,
        column: storage_class::Column,
        value: SimpleExpr,
    ) -> CatalogueResult<()> {
        non_empty("disk_instance", disk_instance)?;
        non_empty("name", name)?;

        let key = storage_class_key(disk_instance, name);
        let db = self.database().await?;
        modify_entry::<StorageClass, _>(
            db,
            admin,
            EntityType::StorageClass,
            &key,
            storage_class_condition(disk_instance, name),
            vec![(column, value)],
        )
        .await?;

        tracing::info!("Modified {:?} of storage class {} by {}", column, key, admin);

        Ok(())
    }
}

fn storage_class_condition(disk_instance: &str, name: &str) -> Condition {
    Condition::all()
        .add(storage_class::Column::DiskInstance.eq(disk_instance))
        .add(storage_class::Column::Name.eq(name))
}

fn nb_copies_value(nb_copies: u64) -> CatalogueResult<i32> {
    let value = db_int("nb_copies", nb_copies)?;

    i32::try_from(value).map_err(|_| CatalogueError::OutOfRange {
        field: "nb_copies",
        reason: format!("{} copies is too many", nb_copies),
    })
}

fn storage_class_from_model(model: StorageClassModel) -> types::StorageClass {
    types::StorageClass {
        creation_log: model.creation_log(),
        last_modification_log: model.last_modification_log(),
        disk_instance: model.disk_instance,
        name: model.name,
        nb_copies: model.nb_copies as u64,
        comment: model.comment,
    }
}
