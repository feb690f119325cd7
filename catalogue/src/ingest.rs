//! Recording of files written to tape.
//!
//! A batch of write reports from a drive is applied in one transaction.
//! Any inconsistent record rejects the whole batch.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::ActiveValue::Set;
use sea_orm::{ConnectionTrait, TransactionTrait};
use tracing::instrument;

use crate::database::entity::archive_file::{self, Entity as ArchiveFile};
use crate::database::entity::tape::{self, Entity as Tape};
use crate::database::entity::tape_file::{self, Entity as TapeFile};
use crate::database::entity::Json;
use crate::database::CatalogueDatabase;
use crate::error::{CatalogueError, CatalogueResult, EntityType};
use crate::types::{TapeFileWritten, TapeItemWritten};
use crate::validation::{self, db_int, non_empty, non_zero};
use crate::Catalogue;
use tapecat::checksum::Error as ChecksumError;
use tapecat::TapecatError;

impl Catalogue {
    /// Records a batch of items written to tape.
    ///
    /// Items may span several tapes. On each tape they must continue the
    /// fSeq sequence without gaps or repeats. A file copy replaces any
    /// live copy with the same copy number, which is then superseded by
    /// the new one.
    #[instrument(skip_all, fields(nb_items = items.len()))]
    pub async fn files_written_to_tape(&self, items: &[TapeItemWritten]) -> CatalogueResult<()> {
        for item in items {
            validate_item(item)?;
        }

        if items.is_empty() {
            return Ok(());
        }

        let mut by_tape: BTreeMap<&str, Vec<&TapeItemWritten>> = BTreeMap::new();
        for item in items {
            by_tape.entry(item.vid()).or_default().push(item);
        }
        for group in by_tape.values_mut() {
            group.sort_by_key(|item| item.fseq());
        }

        let db = self.database().await?;
        let txn = db.begin().await.map_err(CatalogueError::database_error)?;
        let now = Utc::now();

        let mut nb_files = 0;
        for (vid, group) in &by_tape {
            advance_tape(&txn, vid, group, now).await?;

            for item in group {
                if let TapeItemWritten::File(file) = item {
                    record_tape_file(&txn, file, now).await?;
                    nb_files += 1;
                }
            }
        }

        txn.commit().await.map_err(CatalogueError::database_error)?;

        tracing::info!(
            "Recorded {} files and {} placeholders on {} tapes",
            nb_files,
            items.len() - nb_files,
            by_tape.len()
        );

        Ok(())
    }
}

fn validate_item(item: &TapeItemWritten) -> CatalogueResult<()> {
    non_empty("vid", item.vid())?;
    non_zero("fseq", item.fseq())?;
    db_int("fseq", item.fseq())?;
    non_empty("tape_drive", item.tape_drive())?;

    if let TapeItemWritten::File(file) = item {
        non_zero("archive_file_id", file.archive_file_id)?;
        db_int("archive_file_id", file.archive_file_id)?;
        validation::copy_nb(file.copy_nb)?;
        non_empty("disk_instance", &file.disk_instance)?;
        non_empty("disk_file_id", &file.disk_file_id)?;
        non_empty("storage_class_name", &file.storage_class_name)?;
        db_int("size", file.size)?;
        db_int("block_id", file.block_id)?;

        if file.checksum_blob.is_empty() {
            return Err(CatalogueError::EmptyField {
                field: "checksum_blob",
            });
        }
    }

    Ok(())
}

/// Checks that a tape's items continue its fSeq sequence, then moves the
/// tape past them.
///
/// The update only applies if no other writer moved the tape since it was
/// read, which serializes concurrent batches on the same tape.
async fn advance_tape<C: ConnectionTrait + Send + Sync>(
    db: &C,
    vid: &str,
    items: &[&TapeItemWritten],
    now: DateTime<Utc>,
) -> CatalogueResult<()> {
    let tape = db.find_tape(vid).await?;
    let first_fseq = tape.last_fseq as u64 + 1;

    let mut expected = first_fseq;
    let mut data_in_bytes = 0i64;
    let mut nb_files = 0i64;
    let mut drive = "";

    for &item in items {
        if item.fseq() != expected {
            tracing::debug!(
                "Rejecting fSeq {} on {}, expected {}",
                item.fseq(),
                vid,
                expected
            );
            return Err(CatalogueError::TapeFseqMismatch {
                vid: vid.to_owned(),
                expected,
                actual: item.fseq(),
            });
        }

        if let TapeItemWritten::File(file) = item {
            data_in_bytes += file.size as i64;
            nb_files += 1;
        }

        expected += 1;
        drive = item.tape_drive();
    }

    let last_fseq = expected - 1;

    let update = Tape::update_many()
        .col_expr(tape::Column::LastFseq, Expr::value(last_fseq as i64))
        .col_expr(
            tape::Column::DataInBytes,
            Expr::col(tape::Column::DataInBytes).add(data_in_bytes),
        )
        .col_expr(
            tape::Column::NbFiles,
            Expr::col(tape::Column::NbFiles).add(nb_files),
        )
        .col_expr(tape::Column::LastWriteDrive, Expr::value(drive))
        .col_expr(tape::Column::LastWriteTime, Expr::value(now))
        .filter(tape::Column::Vid.eq(vid))
        .filter(tape::Column::LastFseq.eq(tape.last_fseq))
        .exec(db)
        .await
        .map_err(CatalogueError::database_error)?;

    if update.rows_affected == 0 {
        tracing::debug!("Lost the race to write on {}", vid);
        return Err(CatalogueError::TapeFseqMismatch {
            vid: vid.to_owned(),
            expected: first_fseq,
            actual: items.first().map(|item| item.fseq()).unwrap_or(first_fseq),
        });
    }

    Ok(())
}

/// Records a tape copy, creating its archive file on the first copy.
async fn record_tape_file<C: ConnectionTrait + Send + Sync>(
    db: &C,
    file: &TapeFileWritten,
    now: DateTime<Utc>,
) -> CatalogueResult<()> {
    let archive_file_id = file.archive_file_id as i64;

    let existing = ArchiveFile::find_by_id(archive_file_id)
        .one(db)
        .await
        .map_err(CatalogueError::database_error)?;

    match existing {
        Some(existing) => check_consistency(&existing, file)?,
        None => {
            let storage_class = db
                .find_storage_class(&file.disk_instance, &file.storage_class_name)
                .await
                .map_err(|e| e.referenced_by(EntityType::ArchiveFile, file.archive_file_id))?;

            let model = archive_file::ActiveModel {
                archive_file_id: Set(archive_file_id),
                disk_instance: Set(file.disk_instance.clone()),
                disk_file_id: Set(file.disk_file_id.clone()),
                disk_file_path: Set(file.disk_file_path.clone()),
                disk_file_uid: Set(file.disk_file_owner_uid.into()),
                disk_file_gid: Set(file.disk_file_gid.into()),
                size_in_bytes: Set(file.size as i64),
                checksum_blob: Set(Json(file.checksum_blob.clone())),
                storage_class_id: Set(storage_class.id),
                creation_time: Set(now),
                reconciliation_time: Set(now),
            };

            ArchiveFile::insert(model)
                .exec_without_returning(db)
                .await
                .map_err(|e| {
                    CatalogueError::from_write(e, EntityType::ArchiveFile, file.archive_file_id)
                })?;
        }
    }

    let copy_nb = validation::copy_nb(file.copy_nb)?;

    TapeFile::update_many()
        .col_expr(
            tape_file::Column::SupersededByVid,
            Expr::value(file.vid.as_str()),
        )
        .col_expr(
            tape_file::Column::SupersededByFseq,
            Expr::value(file.fseq as i64),
        )
        .filter(tape_file::Column::ArchiveFileId.eq(archive_file_id))
        .filter(tape_file::Column::CopyNb.eq(copy_nb))
        .filter(tape_file::Column::SupersededByVid.is_null())
        .exec(db)
        .await
        .map_err(CatalogueError::database_error)?;

    let model = tape_file::ActiveModel {
        vid: Set(file.vid.clone()),
        fseq: Set(file.fseq as i64),
        block_id: Set(file.block_id as i64),
        logical_size_in_bytes: Set(file.size as i64),
        copy_nb: Set(copy_nb),
        creation_time: Set(now),
        archive_file_id: Set(archive_file_id),
        superseded_by_vid: Set(None),
        superseded_by_fseq: Set(None),
        ..Default::default()
    };

    TapeFile::insert(model)
        .exec(db)
        .await
        .map_err(CatalogueError::database_error)?;

    Ok(())
}

/// Checks that another copy of an archive file describes the same file.
fn check_consistency(
    existing: &archive_file::Model,
    file: &TapeFileWritten,
) -> CatalogueResult<()> {
    if existing.size_in_bytes as u64 != file.size {
        return Err(CatalogueError::FileSizeMismatch {
            archive_file_id: file.archive_file_id,
            vid: file.vid.clone(),
            fseq: file.fseq,
            expected: existing.size_in_bytes as u64,
            actual: file.size,
        });
    }

    existing
        .checksum_blob
        .0
        .validate(&file.checksum_blob)
        .map_err(|e| match e {
            TapecatError::ChecksumError(ChecksumError::TypeMismatch { expected, actual }) => {
                CatalogueError::ChecksumTypeMismatch {
                    archive_file_id: file.archive_file_id,
                    vid: file.vid.clone(),
                    fseq: file.fseq,
                    expected,
                    actual,
                }
            }
            TapecatError::ChecksumError(ChecksumError::ValueMismatch {
                typ,
                expected,
                actual,
            }) => CatalogueError::ChecksumValueMismatch {
                archive_file_id: file.archive_file_id,
                vid: file.vid.clone(),
                fseq: file.fseq,
                expected: format!("{}:{}", typ, expected),
                actual: format!("{}:{}", typ, actual),
            },
            e => e.into(),
        })
}
