//! Tape lifecycle.
//!
//! The flags of a tape are independent of each other. Whether a tape is
//! labelled is derived from the presence of its label log. Transitions
//! caused by drives (labelling, mounting, running out of space) do not
//! touch the modification log, which records administrator actions only.

use chrono::Utc;
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::{Condition, QueryOrder, TransactionTrait};
use tracing::instrument;

use crate::database::entity::tape::{self, Entity as Tape};
use crate::database::{update_entry, CatalogueDatabase};
use crate::error::{CatalogueError, CatalogueResult, EntityType};
use crate::recycle_log::purge_recycle_log_of_tape;
use crate::registry::tapes_from_models;
use crate::types::TapeForWriting;
use crate::validation::non_empty;
use crate::Catalogue;
use tapecat::identity::SecurityIdentity;

impl Catalogue {
    /// Records that a tape was labelled in a drive.
    #[instrument(skip_all, fields(vid = %vid, drive = %drive))]
    pub async fn tape_labelled(&self, vid: &str, drive: &str) -> CatalogueResult<()> {
        non_empty("vid", vid)?;
        non_empty("drive", drive)?;

        self.update_tape_from_drive(
            vid,
            vec![
                (tape::Column::LabelDrive, Expr::value(drive)),
                (tape::Column::LabelTime, Expr::value(Utc::now())),
            ],
        )
        .await?;

        tracing::info!("Tape {} labelled in {}", vid, drive);

        Ok(())
    }

    /// Records that a tape was mounted for writing.
    #[instrument(skip_all, fields(vid = %vid, drive = %drive))]
    pub async fn tape_mounted_for_archive(&self, vid: &str, drive: &str) -> CatalogueResult<()> {
        non_empty("vid", vid)?;
        non_empty("drive", drive)?;

        self.update_tape_from_drive(
            vid,
            vec![
                (
                    tape::Column::WriteMountCount,
                    Expr::col(tape::Column::WriteMountCount).add(1),
                ),
                (tape::Column::LastWriteDrive, Expr::value(drive)),
                (tape::Column::LastWriteTime, Expr::value(Utc::now())),
            ],
        )
        .await?;

        tracing::info!("Tape {} mounted for archive in {}", vid, drive);

        Ok(())
    }

    /// Records that a tape was mounted for reading.
    #[instrument(skip_all, fields(vid = %vid, drive = %drive))]
    pub async fn tape_mounted_for_retrieve(&self, vid: &str, drive: &str) -> CatalogueResult<()> {
        non_empty("vid", vid)?;
        non_empty("drive", drive)?;

        self.update_tape_from_drive(
            vid,
            vec![
                (
                    tape::Column::ReadMountCount,
                    Expr::col(tape::Column::ReadMountCount).add(1),
                ),
                (tape::Column::LastReadDrive, Expr::value(drive)),
                (tape::Column::LastReadTime, Expr::value(Utc::now())),
            ],
        )
        .await?;

        tracing::info!("Tape {} mounted for retrieve in {}", vid, drive);

        Ok(())
    }

    pub async fn set_tape_full(
        &self,
        admin: &SecurityIdentity,
        vid: &str,
        full: bool,
    ) -> CatalogueResult<()> {
        self.modify_tape(admin, vid, tape::Column::IsFull, Expr::value(full))
            .await
    }

    pub async fn set_tape_read_only(
        &self,
        admin: &SecurityIdentity,
        vid: &str,
        read_only: bool,
    ) -> CatalogueResult<()> {
        self.modify_tape(admin, vid, tape::Column::IsReadOnly, Expr::value(read_only))
            .await
    }

    /// Makes a tape read-only after a drive reported an error on it.
    pub async fn set_tape_read_only_on_error(
        &self,
        admin: &SecurityIdentity,
        vid: &str,
    ) -> CatalogueResult<()> {
        self.modify_tape(admin, vid, tape::Column::IsReadOnly, Expr::value(true))
            .await
    }

    pub async fn set_tape_disabled(
        &self,
        admin: &SecurityIdentity,
        vid: &str,
        disabled: bool,
    ) -> CatalogueResult<()> {
        self.modify_tape(admin, vid, tape::Column::IsDisabled, Expr::value(disabled))
            .await
    }

    /// Marks a tape as imported from the legacy system.
    ///
    /// There is no way back.
    pub async fn set_tape_is_from_castor(
        &self,
        admin: &SecurityIdentity,
        vid: &str,
    ) -> CatalogueResult<()> {
        self.modify_tape(admin, vid, tape::Column::IsFromCastor, Expr::value(true))
            .await
    }

    /// Marks a tape as full after a drive hit its end.
    #[instrument(skip_all, fields(vid = %vid))]
    pub async fn no_space_left_on_tape(&self, vid: &str) -> CatalogueResult<()> {
        non_empty("vid", vid)?;

        self.update_tape_from_drive(vid, vec![(tape::Column::IsFull, Expr::value(true))])
            .await?;

        tracing::info!("Tape {} is full", vid);

        Ok(())
    }

    /// Checks that a tape can be labelled without losing live files.
    ///
    /// The `full` flag does not matter.
    pub async fn check_tape_for_label(&self, vid: &str) -> CatalogueResult<()> {
        non_empty("vid", vid)?;

        let db = self.database().await?;
        db.find_tape(vid).await?;

        let nb_live_files = db.count_live_tape_files(vid).await?;
        if nb_live_files != 0 {
            tracing::debug!("Refusing to label {} with {} live files", vid, nb_live_files);
            return Err(CatalogueError::NotEmpty {
                entity: EntityType::Tape,
                key: vid.to_owned(),
                reason: format!("it holds {} live files", nb_live_files),
            });
        }

        Ok(())
    }

    /// Resets a full tape whose files have all been superseded or deleted,
    /// so that it can be written from the start again.
    ///
    /// Superseded copies stay recorded, still pointing at their
    /// replacements. The recycle log entries of the tape are purged, since
    /// their data is about to be overwritten.
    #[instrument(skip_all, fields(vid = %vid))]
    pub async fn reclaim_tape(&self, admin: &SecurityIdentity, vid: &str) -> CatalogueResult<()> {
        non_empty("vid", vid)?;

        let db = self.database().await?;
        let txn = db.begin().await.map_err(CatalogueError::database_error)?;

        let tape = txn.find_tape(vid).await?;

        if !tape.is_full {
            return Err(CatalogueError::user_error(format!(
                "Cannot reclaim tape {}: it is not full",
                vid
            )));
        }

        let nb_live_files = txn.count_live_tape_files(vid).await?;
        if nb_live_files != 0 {
            return Err(CatalogueError::user_error(format!(
                "Cannot reclaim tape {}: it still holds {} live files",
                vid, nb_live_files
            )));
        }

        let updated = update_entry::<Tape, _>(
            &txn,
            admin,
            Condition::all()
                .add(tape::Column::Vid.eq(vid))
                .add(tape::Column::IsFull.eq(true)),
            vec![
                (tape::Column::IsFull, Expr::value(false)),
                (tape::Column::LastFseq, Expr::value(0i64)),
                (tape::Column::DataInBytes, Expr::value(0i64)),
                (tape::Column::NbFiles, Expr::value(0i64)),
            ],
        )
        .await
        .map_err(CatalogueError::database_error)?;

        if updated == 0 {
            return Err(CatalogueError::user_error(format!(
                "Cannot reclaim tape {}: it was modified concurrently",
                vid
            )));
        }

        let nb_purged = purge_recycle_log_of_tape(&txn, vid).await?;

        txn.commit().await.map_err(CatalogueError::database_error)?;

        tracing::info!(
            "Reclaimed tape {} by {}, purging {} recycle log entries",
            vid,
            admin,
            nb_purged
        );

        Ok(())
    }

    /// Returns the tapes of a logical library that can be written to.
    ///
    /// Those are the labelled tapes that are neither disabled, full,
    /// read-only nor imported from the legacy system.
    pub async fn get_tapes_for_writing(
        &self,
        logical_library: &str,
    ) -> CatalogueResult<Vec<TapeForWriting>> {
        non_empty("logical_library", logical_library)?;

        let db = self.database().await?;

        let library = match db.find_logical_library(logical_library).await {
            Ok(library) => library,
            Err(CatalogueError::NotFound { .. }) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let tapes = Tape::find()
            .filter(tape::Column::LogicalLibraryId.eq(library.id))
            .filter(tape::Column::LabelDrive.is_not_null())
            .filter(tape::Column::IsDisabled.eq(false))
            .filter(tape::Column::IsFull.eq(false))
            .filter(tape::Column::IsReadOnly.eq(false))
            .filter(tape::Column::IsFromCastor.eq(false))
            .order_by_asc(tape::Column::Vid)
            .all(db)
            .await
            .map_err(CatalogueError::database_error)?;

        Ok(tapes_from_models(db, tapes)
            .await?
            .into_iter()
            .map(|tape| TapeForWriting {
                vid: tape.vid,
                media_type: tape.media_type,
                vendor: tape.vendor,
                tape_pool: tape.tape_pool_name,
                vo: tape.vo,
                capacity_in_bytes: tape.capacity_in_bytes,
                data_on_tape_in_bytes: tape.data_on_tape_in_bytes,
                last_fseq: tape.last_fseq,
            })
            .collect())
    }

    /// Applies a change reported by a drive, which has no admin identity.
    async fn update_tape_from_drive(
        &self,
        vid: &str,
        changes: Vec<(tape::Column, SimpleExpr)>,
    ) -> CatalogueResult<()> {
        let db = self.database().await?;

        let mut update = Tape::update_many().filter(tape::Column::Vid.eq(vid));
        for (column, value) in changes {
            update = update.col_expr(column, value);
        }

        let result = update.exec(db).await.map_err(CatalogueError::database_error)?;

        if result.rows_affected == 0 {
            return Err(CatalogueError::not_found(EntityType::Tape, vid));
        }

        Ok(())
    }
}
