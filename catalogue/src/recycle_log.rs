//! The file recycle log.
//!
//! Deleting an archived file or one of its tape copies does not forget
//! the copies. They are moved here with the metadata of their file, and
//! stay restorable until their tape is reclaimed or they are purged.

use std::collections::HashMap;

use async_stream::try_stream;
use chrono::Utc;
use futures::stream::BoxStream;
use sea_orm::entity::prelude::*;
use sea_orm::query::QuerySelect;
use sea_orm::ActiveValue::Set;
use sea_orm::{Condition, ConnectionTrait, PaginatorTrait, QueryOrder, TransactionTrait};
use tracing::instrument;

use crate::database::entity::archive_file::{self, ArchiveFileModel, Entity as ArchiveFile};
use crate::database::entity::file_recycle_log::{
    self, Entity as FileRecycleLog, FileRecycleLogModel,
};
use crate::database::entity::storage_class::{self, Entity as StorageClass};
use crate::database::entity::tape_file::{self, Entity as TapeFile, TapeFileModel};
use crate::database::CatalogueDatabase;
use crate::error::{CatalogueError, CatalogueResult};
use crate::types::{self, DiskFileInfo, RecycleTapeFileSearchCriteria};
use crate::validation::{copy_nb, db_int, non_empty, non_empty_if_present, non_zero};
use crate::Catalogue;

/// A stream of recycle log entries.
pub type FileRecycleLogStream = BoxStream<'static, CatalogueResult<types::FileRecycleLog>>;

/// Reason recorded for the copies of a file deleted from its disk instance.
pub const DELETED_FROM_DISK_INSTANCE: &str = "Deleted from the disk instance";

impl Catalogue {
    /// Lists the recycle log entries matching all given criteria, oldest
    /// first.
    #[instrument(skip_all)]
    pub async fn get_file_recycle_log_itor(
        &self,
        criteria: &RecycleTapeFileSearchCriteria,
    ) -> CatalogueResult<FileRecycleLogStream> {
        let condition = self.recycle_log_condition(criteria).await?;

        let db = self.database().await?.clone();
        let page_size = self.config().archive_file_listing.page_size;

        let stream: FileRecycleLogStream = Box::pin(try_stream! {
            let mut after: Option<i64> = None;

            loop {
                let mut query = FileRecycleLog::find()
                    .filter(condition.clone())
                    .order_by_asc(file_recycle_log::Column::Id)
                    .limit(page_size);

                if let Some(last) = after {
                    query = query.filter(file_recycle_log::Column::Id.gt(last));
                }

                let page = query.all(&db).await.map_err(CatalogueError::database_error)?;
                let nb_fetched = page.len() as u64;
                after = page.last().map(|entry| entry.id);

                let storage_classes = storage_class_names(&db, &page).await?;
                for entry in page {
                    let storage_class = storage_classes
                        .get(&entry.storage_class_id)
                        .cloned()
                        .unwrap_or_default();
                    yield recycle_log_from_model(entry, storage_class);
                }

                if nb_fetched < page_size {
                    break;
                }
            }
        });

        Ok(stream)
    }

    /// Puts the one tape copy matching the criteria back in the catalogue.
    ///
    /// The archived file is recreated if it was deleted, under
    /// `new_disk_file_id` when one is given. Fails unless exactly one entry
    /// matches, or if the file already has a live copy with the same copy
    /// number.
    #[instrument(skip_all)]
    pub async fn restore_file_in_recycle_log(
        &self,
        criteria: &RecycleTapeFileSearchCriteria,
        new_disk_file_id: Option<&str>,
    ) -> CatalogueResult<()> {
        non_empty_if_present("new_disk_file_id", new_disk_file_id)?;
        let condition = self.recycle_log_condition(criteria).await?;

        let db = self.database().await?;
        let txn = db.begin().await.map_err(CatalogueError::database_error)?;

        let mut entries = FileRecycleLog::find()
            .filter(condition)
            .limit(2)
            .all(&txn)
            .await
            .map_err(CatalogueError::database_error)?;

        if entries.len() > 1 {
            return Err(CatalogueError::user_error(
                "More than one recycle log entry matches the search criteria",
            ));
        }

        let entry = entries.pop().ok_or_else(|| {
            CatalogueError::user_error("No recycle log entry matches the search criteria")
        })?;

        match txn.find_archive_file(entry.archive_file_id as u64).await {
            Ok(archive_file) => {
                let nb_live_copies = TapeFile::find()
                    .filter(tape_file::Column::ArchiveFileId.eq(archive_file.archive_file_id))
                    .filter(tape_file::Column::CopyNb.eq(entry.copy_nb))
                    .filter(tape_file::Column::SupersededByVid.is_null())
                    .count(&txn)
                    .await
                    .map_err(CatalogueError::database_error)?;

                if nb_live_copies != 0 {
                    return Err(CatalogueError::user_error(format!(
                        "Cannot restore copy {} of archive file {}: the file already has a live copy {}",
                        entry.copy_nb, entry.archive_file_id, entry.copy_nb
                    )));
                }
            }
            Err(CatalogueError::NotFound { .. }) => {
                let disk_file_id = new_disk_file_id.unwrap_or(&entry.disk_file_id);

                let model = archive_file::ActiveModel {
                    archive_file_id: Set(entry.archive_file_id),
                    disk_instance: Set(entry.disk_instance.clone()),
                    disk_file_id: Set(disk_file_id.to_owned()),
                    disk_file_path: Set(entry.disk_file_path.clone()),
                    disk_file_uid: Set(entry.disk_file_uid),
                    disk_file_gid: Set(entry.disk_file_gid),
                    size_in_bytes: Set(entry.size_in_bytes),
                    checksum_blob: Set(entry.checksum_blob.clone()),
                    storage_class_id: Set(entry.storage_class_id),
                    creation_time: Set(entry.archive_file_creation_time),
                    reconciliation_time: Set(entry.reconciliation_time),
                };

                ArchiveFile::insert(model)
                    .exec_without_returning(&txn)
                    .await
                    .map_err(CatalogueError::database_error)?;
            }
            Err(e) => return Err(e),
        }

        let tape_file = tape_file::ActiveModel {
            vid: Set(entry.vid.clone()),
            fseq: Set(entry.fseq),
            block_id: Set(entry.block_id),
            logical_size_in_bytes: Set(entry.size_in_bytes),
            copy_nb: Set(entry.copy_nb),
            creation_time: Set(entry.tape_file_creation_time),
            archive_file_id: Set(entry.archive_file_id),
            superseded_by_vid: Set(None),
            superseded_by_fseq: Set(None),
            ..Default::default()
        };

        TapeFile::insert(tape_file)
            .exec(&txn)
            .await
            .map_err(CatalogueError::database_error)?;

        FileRecycleLog::delete_by_id(entry.id)
            .exec(&txn)
            .await
            .map_err(CatalogueError::database_error)?;

        txn.commit().await.map_err(CatalogueError::database_error)?;

        tracing::info!(
            "Restored copy {} of archive file {} on {} at fSeq {}",
            entry.copy_nb,
            entry.archive_file_id,
            entry.vid,
            entry.fseq
        );

        Ok(())
    }

    /// Moves the live copies of an archived file on one tape to the
    /// recycle log.
    ///
    /// The archived file stays catalogued, even when it has no copy left.
    #[instrument(skip_all, fields(archive_file_id = %archive_file_id, vid = %vid))]
    pub async fn delete_tape_file_copy(
        &self,
        disk_instance: &str,
        archive_file_id: u64,
        vid: &str,
        reason: &str,
    ) -> CatalogueResult<()> {
        non_empty("disk_instance", disk_instance)?;
        non_zero("archive_file_id", archive_file_id)?;
        non_empty("vid", vid)?;
        non_empty("reason", reason)?;

        let db = self.database().await?;
        let txn = db.begin().await.map_err(CatalogueError::database_error)?;

        let archive_file = txn.find_archive_file(archive_file_id).await?;

        if archive_file.disk_instance != disk_instance {
            return Err(CatalogueError::DiskInstanceMismatch {
                archive_file_id,
                expected: archive_file.disk_instance,
                actual: disk_instance.to_owned(),
            });
        }

        let copies = TapeFile::find()
            .filter(tape_file::Column::ArchiveFileId.eq(archive_file.archive_file_id))
            .filter(tape_file::Column::Vid.eq(vid))
            .filter(tape_file::Column::SupersededByVid.is_null())
            .all(&txn)
            .await
            .map_err(CatalogueError::database_error)?;

        if copies.is_empty() {
            return Err(CatalogueError::user_error(format!(
                "Archive file {} has no live copy on tape {}",
                archive_file_id, vid
            )));
        }

        let nb_copies = recycle_tape_files(&txn, &archive_file, copies, reason).await?;

        txn.commit().await.map_err(CatalogueError::database_error)?;

        tracing::info!(
            "Moved {} copies of archive file {} on {} to the recycle log: {}",
            nb_copies,
            archive_file_id,
            vid,
            reason
        );

        Ok(())
    }

    /// Purges the recycle log entries of a tape.
    ///
    /// Purging a tape without entries is not an error.
    #[instrument(skip_all, fields(vid = %vid))]
    pub async fn delete_files_from_recycle_log(&self, vid: &str) -> CatalogueResult<()> {
        non_empty("vid", vid)?;

        let db = self.database().await?;
        let nb_purged = purge_recycle_log_of_tape(db, vid).await?;

        tracing::info!("Purged {} recycle log entries of {}", nb_purged, vid);

        Ok(())
    }

    /// Purges the recycle log entries of an archived file.
    ///
    /// Purging a file without entries is not an error.
    #[instrument(skip_all, fields(archive_file_id = %archive_file_id))]
    pub async fn delete_file_from_recycle_log(&self, archive_file_id: u64) -> CatalogueResult<()> {
        non_zero("archive_file_id", archive_file_id)?;
        let archive_file_id = db_int("archive_file_id", archive_file_id)?;

        let db = self.database().await?;

        let purged = FileRecycleLog::delete_many()
            .filter(file_recycle_log::Column::ArchiveFileId.eq(archive_file_id))
            .exec(db)
            .await
            .map_err(CatalogueError::database_error)?;

        tracing::info!(
            "Purged {} recycle log entries of archive file {}",
            purged.rows_affected,
            archive_file_id
        );

        Ok(())
    }

    /// Validates recycle log search criteria and turns them into a
    /// condition on `file_recycle_log` rows.
    async fn recycle_log_condition(
        &self,
        criteria: &RecycleTapeFileSearchCriteria,
    ) -> CatalogueResult<Condition> {
        non_empty_if_present("vid", criteria.vid.as_deref())?;
        non_empty_if_present("disk_instance", criteria.disk_instance.as_deref())?;

        let mut condition = Condition::all();

        if let Some(archive_file_id) = criteria.archive_file_id {
            non_zero("archive_file_id", archive_file_id)?;
            let archive_file_id = db_int("archive_file_id", archive_file_id)?;
            condition = condition.add(file_recycle_log::Column::ArchiveFileId.eq(archive_file_id));
        }

        if let Some(nb) = criteria.copy_nb {
            condition = condition.add(file_recycle_log::Column::CopyNb.eq(copy_nb(nb)?));
        }

        if let Some(disk_instance) = &criteria.disk_instance {
            condition =
                condition.add(file_recycle_log::Column::DiskInstance.eq(disk_instance.as_str()));
        }

        if let Some(disk_file_ids) = &criteria.disk_file_ids {
            if criteria.disk_instance.is_none() {
                return Err(CatalogueError::user_error(
                    "Disk file IDs can only be searched within a disk instance",
                ));
            }

            for disk_file_id in disk_file_ids {
                non_empty("disk_file_id", disk_file_id)?;
            }

            condition = condition.add(
                file_recycle_log::Column::DiskFileId
                    .is_in(disk_file_ids.iter().map(String::as_str)),
            );
        }

        if let Some(vid) = &criteria.vid {
            let db = self.database().await?;
            db.find_tape(vid).await?;
            condition = condition.add(file_recycle_log::Column::Vid.eq(vid.as_str()));
        }

        Ok(condition)
    }
}

/// Moves tape copies of an archived file to the recycle log.
///
/// Returns the number of copies moved.
pub(crate) async fn recycle_tape_files<C: ConnectionTrait + Send + Sync>(
    db: &C,
    archive_file: &ArchiveFileModel,
    tape_files: Vec<TapeFileModel>,
    reason: &str,
) -> CatalogueResult<u64> {
    if tape_files.is_empty() {
        return Ok(0);
    }

    let now = Utc::now();
    let ids: Vec<i64> = tape_files.iter().map(|tf| tf.id).collect();

    let entries = tape_files.into_iter().map(|tf| file_recycle_log::ActiveModel {
        vid: Set(tf.vid),
        fseq: Set(tf.fseq),
        block_id: Set(tf.block_id),
        copy_nb: Set(tf.copy_nb),
        tape_file_creation_time: Set(tf.creation_time),
        archive_file_id: Set(archive_file.archive_file_id),
        disk_instance: Set(archive_file.disk_instance.clone()),
        disk_file_id: Set(archive_file.disk_file_id.clone()),
        disk_file_path: Set(archive_file.disk_file_path.clone()),
        disk_file_uid: Set(archive_file.disk_file_uid),
        disk_file_gid: Set(archive_file.disk_file_gid),
        size_in_bytes: Set(archive_file.size_in_bytes),
        checksum_blob: Set(archive_file.checksum_blob.clone()),
        storage_class_id: Set(archive_file.storage_class_id),
        archive_file_creation_time: Set(archive_file.creation_time),
        reconciliation_time: Set(archive_file.reconciliation_time),
        reason_log: Set(reason.to_owned()),
        recycle_log_time: Set(now),
        ..Default::default()
    });

    FileRecycleLog::insert_many(entries)
        .exec(db)
        .await
        .map_err(CatalogueError::database_error)?;

    let deleted = TapeFile::delete_many()
        .filter(tape_file::Column::Id.is_in(ids))
        .exec(db)
        .await
        .map_err(CatalogueError::database_error)?;

    Ok(deleted.rows_affected)
}

/// Deletes the recycle log entries of a tape, returning how many there
/// were.
pub(crate) async fn purge_recycle_log_of_tape<C: ConnectionTrait + Send + Sync>(
    db: &C,
    vid: &str,
) -> CatalogueResult<u64> {
    let purged = FileRecycleLog::delete_many()
        .filter(file_recycle_log::Column::Vid.eq(vid))
        .exec(db)
        .await
        .map_err(CatalogueError::database_error)?;

    Ok(purged.rows_affected)
}

async fn storage_class_names<C: ConnectionTrait + Send + Sync>(
    db: &C,
    entries: &[FileRecycleLogModel],
) -> CatalogueResult<HashMap<i64, String>> {
    let mut ids: Vec<i64> = entries.iter().map(|entry| entry.storage_class_id).collect();
    ids.sort_unstable();
    ids.dedup();

    Ok(StorageClass::find()
        .filter(storage_class::Column::Id.is_in(ids))
        .all(db)
        .await
        .map_err(CatalogueError::database_error)?
        .into_iter()
        .map(|sc| (sc.id, sc.name))
        .collect())
}

fn recycle_log_from_model(model: FileRecycleLogModel, storage_class: String) -> types::FileRecycleLog {
    types::FileRecycleLog {
        vid: model.vid,
        fseq: model.fseq as u64,
        block_id: model.block_id as u64,
        copy_nb: model.copy_nb as u64,
        tape_file_creation_time: model.tape_file_creation_time,
        archive_file_id: model.archive_file_id as u64,
        disk_instance: model.disk_instance,
        disk_file_id: model.disk_file_id,
        disk_file_info: DiskFileInfo {
            path: model.disk_file_path,
            owner_uid: model.disk_file_uid as u32,
            gid: model.disk_file_gid as u32,
        },
        size_in_bytes: model.size_in_bytes as u64,
        checksum_blob: model.checksum_blob.0,
        storage_class,
        archive_file_creation_time: model.archive_file_creation_time,
        reconciliation_time: model.reconciliation_time,
        reason_log: model.reason_log,
        recycle_log_time: model.recycle_log_time,
    }
}
