//! Queue criteria resolution.
//!
//! Archive and retrieve requests are queued with a mount policy, which
//! comes from the rule of the requester if there is one, and otherwise
//! from the rule of the requester's group.

use std::collections::{BTreeMap, HashSet};

use chrono::Utc;
use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::Set;
use sea_orm::ConnectionTrait;
use tracing::instrument;

use crate::archive_file::load_archive_file;
use crate::database::entity::archive_file_id::{self, Entity as ArchiveFileId};
use crate::database::entity::archive_route::ArchiveRouteModel;
use crate::database::entity::storage_class::StorageClassModel;
use crate::database::entity::tape::{self, Entity as Tape};
use crate::database::entity::tape_pool::{self, Entity as TapePool};
use crate::database::CatalogueDatabase;
use crate::error::{CatalogueError, CatalogueResult};
use crate::registry::{
    find_weight, group_rule_policy, mount_policy_from_model, requester_rule_policy,
    routes_of_storage_class,
};
use crate::types::{ArchiveFileQueueCriteria, MountPolicy, RetrieveFileQueueCriteria};
use crate::validation::{non_empty, non_empty_if_present, non_zero};
use crate::Catalogue;
use tapecat::identity::RequesterIdentity;

impl Catalogue {
    /// Allocates the ID of a file about to be archived.
    ///
    /// The request must be routable and have a mount policy. IDs are
    /// never handed out twice, even to concurrent callers.
    #[instrument(skip_all, fields(disk_instance = %disk_instance, storage_class_name = %storage_class_name, requester = %requester.name))]
    pub async fn check_and_get_next_archive_file_id(
        &self,
        disk_instance: &str,
        storage_class_name: &str,
        requester: &RequesterIdentity,
    ) -> CatalogueResult<u64> {
        validate_request(disk_instance, requester)?;
        non_empty("storage_class_name", storage_class_name)?;

        let db = self.database().await?;

        let (_, routes) = archive_routes(db, disk_instance, storage_class_name).await?;
        if routes.is_empty() {
            return Err(no_archive_route(disk_instance, storage_class_name));
        }

        resolve_mount_policy(db, disk_instance, requester).await?;

        let allocation = archive_file_id::ActiveModel {
            allocated_at: Set(Utc::now()),
            ..Default::default()
        };

        let id = ArchiveFileId::insert(allocation)
            .exec(db)
            .await
            .map_err(CatalogueError::database_error)?
            .last_insert_id;

        tracing::info!(
            "Allocated archive file ID {} for {} in {}",
            id,
            requester.name,
            disk_instance
        );

        Ok(id as u64)
    }

    /// Returns where the copies of a new file go and how to mount for them.
    #[instrument(skip_all, fields(disk_instance = %disk_instance, storage_class_name = %storage_class_name, requester = %requester.name))]
    pub async fn get_archive_file_queue_criteria(
        &self,
        disk_instance: &str,
        storage_class_name: &str,
        requester: &RequesterIdentity,
    ) -> CatalogueResult<ArchiveFileQueueCriteria> {
        validate_request(disk_instance, requester)?;
        non_empty("storage_class_name", storage_class_name)?;

        let db = self.database().await?;

        let (storage_class, routes) = archive_routes(db, disk_instance, storage_class_name).await?;
        let storage_class = match storage_class {
            Some(storage_class) if !routes.is_empty() => storage_class,
            _ => return Err(no_archive_route(disk_instance, storage_class_name)),
        };

        let nb_copies = storage_class.nb_copies as u64;
        if routes.len() as u64 != nb_copies {
            return Err(CatalogueError::WrongNumberOfArchiveRoutes {
                disk_instance: disk_instance.to_owned(),
                storage_class: storage_class_name.to_owned(),
                expected: nb_copies,
                actual: routes.len() as u64,
            });
        }

        let mount_policy = resolve_mount_policy(db, disk_instance, requester).await?;

        let pool_ids: Vec<i64> = routes.iter().map(|route| route.tape_pool_id).collect();
        let pool_names: BTreeMap<i64, String> = TapePool::find()
            .filter(tape_pool::Column::Id.is_in(pool_ids))
            .all(db)
            .await
            .map_err(CatalogueError::database_error)?
            .into_iter()
            .map(|pool| (pool.id, pool.name))
            .collect();

        let copy_to_pool_map = routes
            .into_iter()
            .map(|route| {
                let pool = pool_names
                    .get(&route.tape_pool_id)
                    .cloned()
                    .unwrap_or_default();
                (route.copy_nb as u64, pool)
            })
            .collect();

        Ok(ArchiveFileQueueCriteria {
            copy_to_pool_map,
            nb_copies,
            mount_policy,
        })
    }

    /// Returns the copies a file can be retrieved from and how to mount
    /// for them.
    ///
    /// Superseded copies and copies on disabled tapes are left out.
    #[instrument(skip_all, fields(disk_instance = %disk_instance, archive_file_id = %archive_file_id, requester = %requester.name))]
    pub async fn prepare_to_retrieve_file(
        &self,
        disk_instance: &str,
        archive_file_id: u64,
        requester: &RequesterIdentity,
        activity: Option<&str>,
    ) -> CatalogueResult<RetrieveFileQueueCriteria> {
        validate_request(disk_instance, requester)?;
        non_zero("archive_file_id", archive_file_id)?;
        non_empty_if_present("activity", activity)?;

        let db = self.database().await?;

        let mut archive_file = load_archive_file(db, archive_file_id).await?;

        if archive_file.disk_instance != disk_instance {
            tracing::debug!(
                "Refusing to retrieve {} from {}, it belongs to {}",
                archive_file_id,
                disk_instance,
                archive_file.disk_instance
            );
            return Err(CatalogueError::DiskInstanceMismatch {
                archive_file_id,
                expected: archive_file.disk_instance,
                actual: disk_instance.to_owned(),
            });
        }

        let mount_policy = resolve_mount_policy(db, disk_instance, requester).await?;

        let vids: Vec<String> = archive_file
            .tape_files
            .iter()
            .map(|tf| tf.vid.clone())
            .collect();
        let disabled: HashSet<String> = Tape::find()
            .filter(tape::Column::Vid.is_in(vids))
            .filter(tape::Column::IsDisabled.eq(true))
            .all(db)
            .await
            .map_err(CatalogueError::database_error)?
            .into_iter()
            .map(|tape| tape.vid)
            .collect();

        archive_file
            .tape_files
            .retain(|tf| !tf.is_superseded() && !disabled.contains(&tf.vid));

        if archive_file.tape_files.is_empty() {
            return Err(CatalogueError::NoEligibleCopy { archive_file_id });
        }

        let activity = match activity {
            Some(activity) => find_weight(db, disk_instance, activity)
                .await?
                .map(|weight| (weight.activity, weight.weight)),
            None => None,
        };

        Ok(RetrieveFileQueueCriteria {
            archive_file,
            mount_policy,
            activity,
        })
    }
}

fn validate_request(disk_instance: &str, requester: &RequesterIdentity) -> CatalogueResult<()> {
    non_empty("disk_instance", disk_instance)?;
    non_empty("requester_name", &requester.name)?;
    non_empty("requester_group", &requester.group)?;

    Ok(())
}

/// Returns a storage class, if it exists, with its archive routes.
async fn archive_routes<C: ConnectionTrait + Send + Sync>(
    db: &C,
    disk_instance: &str,
    storage_class_name: &str,
) -> CatalogueResult<(Option<StorageClassModel>, Vec<ArchiveRouteModel>)> {
    let storage_class = match db.find_storage_class(disk_instance, storage_class_name).await {
        Ok(storage_class) => storage_class,
        Err(CatalogueError::NotFound { .. }) => return Ok((None, Vec::new())),
        Err(e) => return Err(e),
    };

    let routes = routes_of_storage_class(db, storage_class.id).await?;

    Ok((Some(storage_class), routes))
}

fn no_archive_route(disk_instance: &str, storage_class_name: &str) -> CatalogueError {
    tracing::debug!(
        "No archive route for {} in {}",
        storage_class_name,
        disk_instance
    );

    CatalogueError::NoArchiveRoute {
        disk_instance: disk_instance.to_owned(),
        storage_class: storage_class_name.to_owned(),
    }
}

/// Resolves the mount policy of a request.
///
/// A rule naming the requester wins over a rule naming the group, even
/// when the group happens to have the requester's name.
async fn resolve_mount_policy<C: ConnectionTrait + Send + Sync>(
    db: &C,
    disk_instance: &str,
    requester: &RequesterIdentity,
) -> CatalogueResult<MountPolicy> {
    if let Some(policy) = requester_rule_policy(db, disk_instance, &requester.name).await? {
        return Ok(mount_policy_from_model(policy));
    }

    if let Some(policy) = group_rule_policy(db, disk_instance, &requester.group).await? {
        return Ok(mount_policy_from_model(policy));
    }

    tracing::debug!(
        "No mount rule for {} or {} in {}",
        requester.name,
        requester.group,
        disk_instance
    );

    Err(CatalogueError::NoMountRule {
        disk_instance: disk_instance.to_owned(),
        requester: requester.name.clone(),
        group: requester.group.clone(),
    })
}
