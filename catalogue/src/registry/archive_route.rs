use std::collections::HashMap;

use sea_orm::entity::prelude::*;
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::ActiveValue::Set;
use sea_orm::{Condition, ConnectionTrait};
use tracing::instrument;

use crate::database::entity::archive_route::{self, ArchiveRouteModel, Entity as ArchiveRoute};
use crate::database::entity::storage_class::{Entity as StorageClass, StorageClassModel};
use crate::database::entity::tape_pool::Entity as TapePool;
use crate::database::{modify_entry, stamp_creation, storage_class_key, CatalogueDatabase};
use crate::error::{CatalogueError, CatalogueResult, EntityType};
use crate::types;
use crate::validation::{self, non_empty};
use crate::Catalogue;
use tapecat::identity::{EntryLog, SecurityIdentity};

impl Catalogue {
    /// Routes one copy of the files of a storage class to a tape pool.
    ///
    /// The copy number must be within the copies the storage class
    /// requires, and a tape pool receives at most one copy of a storage
    /// class.
    #[instrument(skip_all, fields(disk_instance = %disk_instance, storage_class_name = %storage_class_name, copy_nb = %copy_nb, tape_pool_name = %tape_pool_name))]
    pub async fn create_archive_route(
        &self,
        admin: &SecurityIdentity,
        disk_instance: &str,
        storage_class_name: &str,
        copy_nb: u64,
        tape_pool_name: &str,
        comment: &str,
    ) -> CatalogueResult<()> {
        non_empty("disk_instance", disk_instance)?;
        non_empty("storage_class_name", storage_class_name)?;
        let stored_copy_nb = validation::copy_nb(copy_nb)?;
        non_empty("tape_pool_name", tape_pool_name)?;
        non_empty("comment", comment)?;

        let key = route_key(disk_instance, storage_class_name, copy_nb);
        let db = self.database().await?;

        let storage_class = db
            .find_storage_class(disk_instance, storage_class_name)
            .await
            .map_err(|e| e.referenced_by(EntityType::ArchiveRoute, &key))?;
        let pool = db
            .find_tape_pool(tape_pool_name)
            .await
            .map_err(|e| e.referenced_by(EntityType::ArchiveRoute, &key))?;

        if copy_nb > storage_class.nb_copies as u64 {
            return Err(CatalogueError::user_error(format!(
                "Cannot create archive route {}: the storage class only has {} copies",
                key, storage_class.nb_copies
            )));
        }

        let routes = routes_of_storage_class(db, storage_class.id).await?;

        if routes.iter().any(|r| r.copy_nb == stored_copy_nb) {
            return Err(CatalogueError::already_exists(EntityType::ArchiveRoute, key));
        }

        if let Some(route) = routes.iter().find(|r| r.tape_pool_id == pool.id) {
            return Err(CatalogueError::user_error(format!(
                "Cannot create archive route {}: tape pool {} already receives copy {}",
                key, tape_pool_name, route.copy_nb
            )));
        }

        let mut model = archive_route::ActiveModel {
            storage_class_id: Set(storage_class.id),
            copy_nb: Set(stored_copy_nb),
            tape_pool_id: Set(pool.id),
            comment: Set(comment.to_owned()),
            ..Default::default()
        };
        stamp_creation(&mut model, &EntryLog::now(admin));

        ArchiveRoute::insert(model)
            .exec(db)
            .await
            .map_err(|e| CatalogueError::from_write(e, EntityType::ArchiveRoute, &key))?;

        tracing::info!("Created archive route {} to {} by {}", key, tape_pool_name, admin);

        Ok(())
    }

    #[instrument(skip_all, fields(disk_instance = %disk_instance, storage_class_name = %storage_class_name, copy_nb = %copy_nb))]
    pub async fn delete_archive_route(
        &self,
        disk_instance: &str,
        storage_class_name: &str,
        copy_nb: u64,
    ) -> CatalogueResult<()> {
        non_empty("disk_instance", disk_instance)?;
        non_empty("storage_class_name", storage_class_name)?;
        let stored_copy_nb = validation::copy_nb(copy_nb)?;

        let key = route_key(disk_instance, storage_class_name, copy_nb);
        let db = self.database().await?;

        let storage_class = db
            .find_storage_class(disk_instance, storage_class_name)
            .await
            .map_err(|_| CatalogueError::not_found(EntityType::ArchiveRoute, &key))?;

        let deletion = ArchiveRoute::delete_many()
            .filter(route_condition(storage_class.id, stored_copy_nb))
            .exec(db)
            .await
            .map_err(CatalogueError::database_error)?;

        if deletion.rows_affected == 0 {
            return Err(CatalogueError::not_found(EntityType::ArchiveRoute, key));
        }

        tracing::info!("Deleted archive route {}", key);

        Ok(())
    }

    pub async fn get_archive_routes(&self) -> CatalogueResult<Vec<types::ArchiveRoute>> {
        let db = self.database().await?;

        let routes = ArchiveRoute::find()
            .all(db)
            .await
            .map_err(CatalogueError::database_error)?;

        let storage_classes: HashMap<i64, StorageClassModel> = StorageClass::find()
            .all(db)
            .await
            .map_err(CatalogueError::database_error)?
            .into_iter()
            .map(|sc| (sc.id, sc))
            .collect();

        let pool_names = tape_pool_names(db).await?;

        let mut result = Vec::with_capacity(routes.len());
        for route in routes {
            if let Some(sc) = storage_classes.get(&route.storage_class_id) {
                result.push(route_from_model(route, sc, &pool_names));
            }
        }

        Ok(result)
    }

    /// Returns the archive routes of a storage class.
    pub async fn get_archive_routes_of_storage_class(
        &self,
        disk_instance: &str,
        storage_class_name: &str,
    ) -> CatalogueResult<Vec<types::ArchiveRoute>> {
        non_empty("disk_instance", disk_instance)?;
        non_empty("storage_class_name", storage_class_name)?;

        let db = self.database().await?;
        let storage_class = db.find_storage_class(disk_instance, storage_class_name).await?;
        let routes = routes_of_storage_class(db, storage_class.id).await?;
        let pool_names = tape_pool_names(db).await?;

        Ok(routes
            .into_iter()
            .map(|route| route_from_model(route, &storage_class, &pool_names))
            .collect())
    }

    /// Sends a copy of a storage class to another tape pool.
    #[instrument(skip_all, fields(disk_instance = %disk_instance, storage_class_name = %storage_class_name, copy_nb = %copy_nb, tape_pool_name = %tape_pool_name))]
    pub async fn modify_archive_route_tape_pool_name(
        &self,
        admin: &SecurityIdentity,
        disk_instance: &str,
        storage_class_name: &str,
        copy_nb: u64,
        tape_pool_name: &str,
    ) -> CatalogueResult<()> {
        non_empty("tape_pool_name", tape_pool_name)?;
        let stored_copy_nb = validation::copy_nb(copy_nb)?;

        let key = route_key(disk_instance, storage_class_name, copy_nb);
        let db = self.database().await?;

        let pool = db
            .find_tape_pool(tape_pool_name)
            .await
            .map_err(|e| e.referenced_by(EntityType::ArchiveRoute, &key))?;

        if let Ok(storage_class) = db.find_storage_class(disk_instance, storage_class_name).await {
            let routes = routes_of_storage_class(db, storage_class.id).await?;

            if let Some(route) = routes
                .iter()
                .find(|r| r.tape_pool_id == pool.id && r.copy_nb != stored_copy_nb)
            {
                return Err(CatalogueError::user_error(format!(
                    "Cannot modify archive route {}: tape pool {} already receives copy {}",
                    key, tape_pool_name, route.copy_nb
                )));
            }
        }

        self.modify_archive_route(
            admin,
            disk_instance,
            storage_class_name,
            copy_nb,
            archive_route::Column::TapePoolId,
            Expr::value(pool.id),
        )
        .await
    }

    pub async fn modify_archive_route_comment(
        &self,
        admin: &SecurityIdentity,
        disk_instance: &str,
        storage_class_name: &str,
        copy_nb: u64,
        comment: &str,
    ) -> CatalogueResult<()> {
        non_empty("comment", comment)?;
        self.modify_archive_route(
            admin,
            disk_instance,
            storage_class_name,
            copy_nb,
            archive_route::Column::Comment,
            Expr::value(comment),
        )
        .await
    }

    #[instrument(skip_all, fields(disk_instance = %disk_instance, storage_class_name = %storage_class_name, copy_nb = %copy_nb, column = ?column))]
    async fn modify_archive_route(
        &self,
        admin: &SecurityIdentity,
        disk_instance: &str,
        storage_class_name: &str,
        copy_nb: u64,
        column: archive_route::Column,
        value: SimpleExpr,
    ) -> CatalogueResult<()> {
        non_empty("disk_instance", disk_instance)?;
        non_empty("storage_class_name", storage_class_name)?;
        let stored_copy_nb = validation::copy_nb(copy_nb)?;

        let key = route_key(disk_instance, storage_class_name, copy_nb);
        let db = self.database().await?;

        let storage_class = db
            .find_storage_class(disk_instance, storage_class_name)
            .await
            .map_err(|_| CatalogueError::not_found(EntityType::ArchiveRoute, &key))?;

        modify_entry::<ArchiveRoute, _>(
            db,
            admin,
            EntityType::ArchiveRoute,
            &key,
            route_condition(storage_class.id, stored_copy_nb),
            vec![(column, value)],
        )
        .await?;

        tracing::info!("Modified {:?} of archive route {} by {}", column, key, admin);

        Ok(())
    }
}

/// Returns the archive routes of a storage class.
pub(crate) async fn routes_of_storage_class<C: ConnectionTrait + Send + Sync>(
    db: &C,
    storage_class_id: i64,
) -> CatalogueResult<Vec<ArchiveRouteModel>> {
    ArchiveRoute::find()
        .filter(archive_route::Column::StorageClassId.eq(storage_class_id))
        .all(db)
        .await
        .map_err(CatalogueError::database_error)
}

async fn tape_pool_names<C: ConnectionTrait + Send + Sync>(
    db: &C,
) -> CatalogueResult<HashMap<i64, String>> {
    Ok(TapePool::find()
        .all(db)
        .await
        .map_err(CatalogueError::database_error)?
        .into_iter()
        .map(|pool| (pool.id, pool.name))
        .collect())
}

fn route_condition(storage_class_id: i64, copy_nb: i32) -> Condition {
    Condition::all()
        .add(archive_route::Column::StorageClassId.eq(storage_class_id))
        .add(archive_route::Column::CopyNb.eq(copy_nb))
}

fn route_key(disk_instance: &str, storage_class_name: &str, copy_nb: u64) -> String {
    format!(
        "{}/{}",
        storage_class_key(disk_instance, storage_class_name),
        copy_nb
    )
}

fn route_from_model(
    model: ArchiveRouteModel,
    storage_class: &StorageClassModel,
    pool_names: &HashMap<i64, String>,
) -> types::ArchiveRoute {
    types::ArchiveRoute {
        creation_log: model.creation_log(),
        last_modification_log: model.last_modification_log(),
        disk_instance: storage_class.disk_instance.clone(),
        storage_class_name: storage_class.name.clone(),
        copy_nb: model.copy_nb as u64,
        tape_pool_name: pool_names
            .get(&model.tape_pool_id)
            .cloned()
            .unwrap_or_default(),
        comment: model.comment,
    }
}
