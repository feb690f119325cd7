//! Archived files and their tape copies.
//!
//! Listings can match an unbounded number of files, so they are returned
//! as streams that fetch one page of files at a time. Each call opens a
//! new stream.

use std::collections::HashMap;

use async_stream::try_stream;
use futures::stream::BoxStream;
use sea_orm::entity::prelude::*;
use sea_orm::query::QuerySelect;
use sea_orm::sea_query::{Alias, ConditionalStatement, Expr, Query};
use sea_orm::{Condition, ConnectionTrait, FromQueryResult, QueryOrder, TransactionTrait};
use tracing::instrument;

use crate::database::entity::archive_file::{self, ArchiveFileModel, Entity as ArchiveFile};
use crate::database::entity::storage_class::{self, Entity as StorageClass};
use crate::database::entity::tape_file::{self, Entity as TapeFile, TapeFileModel};
use crate::database::CatalogueDatabase;
use crate::recycle_log::{recycle_tape_files, DELETED_FROM_DISK_INSTANCE};
use crate::error::{CatalogueError, CatalogueResult, EntityType};
use crate::types::{self, ArchiveFileSummary, DiskFileInfo, TapeFileSearchCriteria};
use crate::validation::{db_int, non_empty, non_empty_if_present, non_zero};
use crate::Catalogue;

/// A stream of archived files.
pub type ArchiveFileStream = BoxStream<'static, CatalogueResult<types::ArchiveFile>>;

#[derive(Debug, FromQueryResult)]
struct TapeFileTotals {
    total_bytes: Option<i64>,
    total_files: i64,
}

impl Catalogue {
    /// Returns an archived file with all its copies, superseded ones
    /// included.
    pub async fn get_archive_file_by_id(
        &self,
        archive_file_id: u64,
    ) -> CatalogueResult<types::ArchiveFile> {
        non_zero("archive_file_id", archive_file_id)?;

        let db = self.database().await?;
        load_archive_file(db, archive_file_id).await
    }

    /// Lists the archived files matching all given criteria, by ascending
    /// archive file ID.
    ///
    /// When a VID is given, files only carry their copies on that tape.
    /// Otherwise they carry all of them, superseded ones included.
    #[instrument(skip_all)]
    pub async fn get_archive_files_itor(
        &self,
        criteria: &TapeFileSearchCriteria,
    ) -> CatalogueResult<ArchiveFileStream> {
        self.check_search_criteria(criteria).await?;

        let db = self.database().await?.clone();
        let page_size = self.config().archive_file_listing.page_size;
        let criteria = criteria.clone();

        let stream: ArchiveFileStream = Box::pin(try_stream! {
            let mut after: Option<i64> = None;

            loop {
                let mut query = ArchiveFile::find()
                    .filter(archive_file_condition(&criteria))
                    .order_by_asc(archive_file::Column::ArchiveFileId)
                    .limit(page_size);

                if let Some(last) = after {
                    query = query.filter(archive_file::Column::ArchiveFileId.gt(last));
                }

                let page = query.all(&db).await.map_err(CatalogueError::database_error)?;
                let nb_fetched = page.len() as u64;
                after = page.last().map(|file| file.archive_file_id);

                let files = with_tape_files(&db, page, criteria.vid.as_deref()).await?;
                for file in files {
                    yield file;
                }

                if nb_fetched < page_size {
                    break;
                }
            }
        });

        Ok(stream)
    }

    /// Lists the live copies on a tape from an fSeq onwards, in fSeq order.
    ///
    /// Each file only carries its copy on the tape.
    #[instrument(skip_all, fields(vid = %vid, start_fseq = %start_fseq))]
    pub async fn get_archive_files_for_repack_itor(
        &self,
        vid: &str,
        start_fseq: u64,
    ) -> CatalogueResult<ArchiveFileStream> {
        non_empty("vid", vid)?;
        let start_fseq = db_int("start_fseq", start_fseq)?;

        let db = self.database().await?;
        db.find_tape(vid).await?;

        let db = db.clone();
        let page_size = self.config().archive_file_listing.page_size;
        let vid = vid.to_owned();

        let stream: ArchiveFileStream = Box::pin(try_stream! {
            let mut next_fseq = start_fseq;

            loop {
                let page = repack_page(&db, &vid, next_fseq, page_size).await?;

                if let Some(last_fseq) = page.last_fseq {
                    next_fseq = last_fseq + 1;
                }

                for file in page.files {
                    yield file;
                }

                if page.nb_rows < page_size {
                    break;
                }
            }
        });

        Ok(stream)
    }

    /// Returns up to `max_nb_files` live copies on a tape from an fSeq
    /// onwards, in fSeq order.
    pub async fn get_files_for_repack(
        &self,
        vid: &str,
        start_fseq: u64,
        max_nb_files: u64,
    ) -> CatalogueResult<Vec<types::ArchiveFile>> {
        non_empty("vid", vid)?;
        let start_fseq = db_int("start_fseq", start_fseq)?;

        let db = self.database().await?;
        db.find_tape(vid).await?;

        if max_nb_files == 0 {
            return Ok(Vec::new());
        }

        Ok(repack_page(db, vid, start_fseq, max_nb_files).await?.files)
    }

    /// Sums the live copies of the archived files matching the criteria.
    pub async fn get_tape_file_summary(
        &self,
        criteria: &TapeFileSearchCriteria,
    ) -> CatalogueResult<ArchiveFileSummary> {
        self.check_search_criteria(criteria).await?;

        let db = self.database().await?;

        let mut query = TapeFile::find()
            .select_only()
            .column_as(
                Expr::col(tape_file::Column::LogicalSizeInBytes)
                    .sum()
                    .cast_as(Alias::new("BIGINT")),
                "total_bytes",
            )
            .column_as(Expr::col(tape_file::Column::Id).count(), "total_files")
            .filter(tape_file::Column::SupersededByVid.is_null())
            .filter(
                tape_file::Column::ArchiveFileId.in_subquery(
                    Query::select()
                        .column(archive_file::Column::ArchiveFileId)
                        .from(ArchiveFile)
                        .cond_where(archive_file_condition(criteria))
                        .to_owned(),
                ),
            );

        if let Some(vid) = &criteria.vid {
            query = query.filter(tape_file::Column::Vid.eq(vid.as_str()));
        }

        let totals = query
            .into_model::<TapeFileTotals>()
            .one(db)
            .await
            .map_err(CatalogueError::database_error)?;

        Ok(totals
            .map(|totals| ArchiveFileSummary {
                total_bytes: totals.total_bytes.unwrap_or(0) as u64,
                total_files: totals.total_files as u64,
            })
            .unwrap_or_default())
    }

    /// Deletes an archived file, moving its live copies to the recycle log.
    ///
    /// Superseded copies are dropped. The counters of the tapes holding
    /// the copies are left as they are.
    #[instrument(skip_all, fields(disk_instance = %disk_instance, archive_file_id = %archive_file_id))]
    pub async fn delete_archive_file(
        &self,
        disk_instance: &str,
        archive_file_id: u64,
    ) -> CatalogueResult<()> {
        non_empty("disk_instance", disk_instance)?;
        non_zero("archive_file_id", archive_file_id)?;

        let db = self.database().await?;
        let txn = db.begin().await.map_err(CatalogueError::database_error)?;

        let archive_file = txn.find_archive_file(archive_file_id).await?;

        if archive_file.disk_instance != disk_instance {
            return Err(CatalogueError::user_error(format!(
                "Cannot delete archive file {} from disk instance {}: it belongs to {}",
                archive_file_id, disk_instance, archive_file.disk_instance
            )));
        }

        let live_copies = TapeFile::find()
            .filter(tape_file::Column::ArchiveFileId.eq(archive_file.archive_file_id))
            .filter(tape_file::Column::SupersededByVid.is_null())
            .all(&txn)
            .await
            .map_err(CatalogueError::database_error)?;

        let nb_recycled =
            recycle_tape_files(&txn, &archive_file, live_copies, DELETED_FROM_DISK_INSTANCE)
                .await?;

        TapeFile::delete_many()
            .filter(tape_file::Column::ArchiveFileId.eq(archive_file.archive_file_id))
            .exec(&txn)
            .await
            .map_err(CatalogueError::database_error)?;

        ArchiveFile::delete_by_id(archive_file.archive_file_id)
            .exec(&txn)
            .await
            .map_err(CatalogueError::database_error)?;

        txn.commit().await.map_err(CatalogueError::database_error)?;

        tracing::info!(
            "Deleted archive file {} of {}, moving {} tape copies to the recycle log",
            archive_file_id,
            disk_instance,
            nb_recycled
        );

        Ok(())
    }

    /// Rejects search criteria that are malformed or name missing entries.
    async fn check_search_criteria(&self, criteria: &TapeFileSearchCriteria) -> CatalogueResult<()> {
        non_empty_if_present("disk_instance", criteria.disk_instance.as_deref())?;
        non_empty_if_present("vid", criteria.vid.as_deref())?;

        if let Some(archive_file_id) = criteria.archive_file_id {
            non_zero("archive_file_id", archive_file_id)?;
            db_int("archive_file_id", archive_file_id)?;
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
        }

        let db = self.database().await?;

        if let Some(archive_file_id) = criteria.archive_file_id {
            db.find_archive_file(archive_file_id).await?;
        }

        if let Some(vid) = &criteria.vid {
            db.find_tape(vid).await?;
        }

        Ok(())
    }
}

/// Loads an archived file with all its copies.
pub(crate) async fn load_archive_file<C: ConnectionTrait + Send + Sync>(
    db: &C,
    archive_file_id: u64,
) -> CatalogueResult<types::ArchiveFile> {
    let model = db.find_archive_file(archive_file_id).await?;

    with_tape_files(db, vec![model], None)
        .await?
        .pop()
        .ok_or_else(|| CatalogueError::not_found(EntityType::ArchiveFile, archive_file_id))
}

/// Returns the condition on `archive_file` rows matching the criteria.
///
/// The VID criterion keeps the files with at least one copy on the tape.
fn archive_file_condition(criteria: &TapeFileSearchCriteria) -> Condition {
    let mut condition = Condition::all();

    if let Some(archive_file_id) = criteria.archive_file_id {
        condition = condition.add(archive_file::Column::ArchiveFileId.eq(archive_file_id as i64));
    }

    if let Some(disk_instance) = &criteria.disk_instance {
        condition = condition.add(archive_file::Column::DiskInstance.eq(disk_instance.as_str()));
    }

    if let Some(disk_file_ids) = &criteria.disk_file_ids {
        condition = condition.add(
            archive_file::Column::DiskFileId.is_in(disk_file_ids.iter().map(String::as_str)),
        );
    }

    if let Some(vid) = &criteria.vid {
        condition = condition.add(
            archive_file::Column::ArchiveFileId.in_subquery(
                Query::select()
                    .column(tape_file::Column::ArchiveFileId)
                    .from(TapeFile)
                    .and_where(tape_file::Column::Vid.eq(vid.as_str()))
                    .to_owned(),
            ),
        );
    }

    condition
}

/// One page of live copies on a tape, in fSeq order.
struct RepackPage {
    /// One file per tape copy, so a file with two copies on the tape
    /// appears twice.
    files: Vec<types::ArchiveFile>,

    /// Number of tape copies read from the store.
    nb_rows: u64,

    /// fSeq of the last tape copy read.
    last_fseq: Option<i64>,
}

/// Fetches one page of live copies on a tape for repacking.
async fn repack_page<C: ConnectionTrait + Send + Sync>(
    db: &C,
    vid: &str,
    start_fseq: i64,
    limit: u64,
) -> CatalogueResult<RepackPage> {
    let tape_files = TapeFile::find()
        .filter(tape_file::Column::Vid.eq(vid))
        .filter(tape_file::Column::SupersededByVid.is_null())
        .filter(tape_file::Column::Fseq.gte(start_fseq))
        .order_by_asc(tape_file::Column::Fseq)
        .limit(limit)
        .all(db)
        .await
        .map_err(CatalogueError::database_error)?;

    let nb_rows = tape_files.len() as u64;
    let last_fseq = tape_files.last().map(|tf| tf.fseq);

    let mut ids: Vec<i64> = tape_files.iter().map(|tf| tf.archive_file_id).collect();
    ids.sort_unstable();
    ids.dedup();

    let archive_files: HashMap<i64, ArchiveFileModel> = ArchiveFile::find()
        .filter(archive_file::Column::ArchiveFileId.is_in(ids))
        .all(db)
        .await
        .map_err(CatalogueError::database_error)?
        .into_iter()
        .map(|file| (file.archive_file_id, file))
        .collect();

    let storage_classes = storage_class_names(db, archive_files.values()).await?;

    let mut files = Vec::with_capacity(tape_files.len());
    for tape_file in tape_files {
        let model = archive_files
            .get(&tape_file.archive_file_id)
            .cloned()
            .ok_or_else(|| {
                CatalogueError::not_found(EntityType::ArchiveFile, tape_file.archive_file_id)
            })?;
        let storage_class = storage_classes
            .get(&model.storage_class_id)
            .cloned()
            .unwrap_or_default();
        files.push(archive_file_from_model(model, storage_class, vec![tape_file]));
    }

    Ok(RepackPage {
        files,
        nb_rows,
        last_fseq,
    })
}

/// Attaches their tape copies to archived files, optionally only those
/// on one tape.
async fn with_tape_files<C: ConnectionTrait + Send + Sync>(
    db: &C,
    models: Vec<ArchiveFileModel>,
    vid: Option<&str>,
) -> CatalogueResult<Vec<types::ArchiveFile>> {
    if models.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i64> = models.iter().map(|file| file.archive_file_id).collect();

    let mut query = TapeFile::find()
        .filter(tape_file::Column::ArchiveFileId.is_in(ids))
        .order_by_asc(tape_file::Column::ArchiveFileId)
        .order_by_asc(tape_file::Column::CopyNb)
        .order_by_asc(tape_file::Column::Id);

    if let Some(vid) = vid {
        query = query.filter(tape_file::Column::Vid.eq(vid));
    }

    let mut tape_files: HashMap<i64, Vec<TapeFileModel>> = HashMap::new();
    for tape_file in query.all(db).await.map_err(CatalogueError::database_error)? {
        tape_files
            .entry(tape_file.archive_file_id)
            .or_default()
            .push(tape_file);
    }

    let storage_classes = storage_class_names(db, models.iter()).await?;

    Ok(models
        .into_iter()
        .map(|model| {
            let copies = tape_files.remove(&model.archive_file_id).unwrap_or_default();
            let storage_class = storage_classes
                .get(&model.storage_class_id)
                .cloned()
                .unwrap_or_default();
            archive_file_from_model(model, storage_class, copies)
        })
        .collect())
}

async fn storage_class_names<'a, C: ConnectionTrait + Send + Sync>(
    db: &C,
    models: impl Iterator<Item = &'a ArchiveFileModel>,
) -> CatalogueResult<HashMap<i64, String>> {
    let mut ids: Vec<i64> = models.map(|file| file.storage_class_id).collect();
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

fn archive_file_from_model(
    model: ArchiveFileModel,
    storage_class: String,
    tape_files: Vec<TapeFileModel>,
) -> types::ArchiveFile {
    types::ArchiveFile {
        archive_file_id: model.archive_file_id as u64,
        disk_instance: model.disk_instance,
        disk_file_id: model.disk_file_id,
        disk_file_info: DiskFileInfo {
            path: model.disk_file_path,
            owner_uid: model.disk_file_uid as u32,
            gid: model.disk_file_gid as u32,
        },
        file_size: model.size_in_bytes as u64,
        checksum_blob: model.checksum_blob.0,
        storage_class,
        creation_time: model.creation_time,
        reconciliation_time: model.reconciliation_time,
        tape_files: tape_files.into_iter().map(tape_file_from_model).collect(),
    }
}

fn tape_file_from_model(model: TapeFileModel) -> types::TapeFile {
    types::TapeFile {
        vid: model.vid,
        fseq: model.fseq as u64,
        block_id: model.block_id as u64,
        file_size: model.logical_size_in_bytes as u64,
        copy_nb: model.copy_nb as u64,
        creation_time: model.creation_time,
        superseded_by_vid: model.superseded_by_vid,
        superseded_by_fseq: model.superseded_by_fseq.map(|fseq| fseq as u64),
    }
}
