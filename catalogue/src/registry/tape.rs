use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::ActiveValue::Set;
use sea_orm::{Condition, ConnectionTrait, PaginatorTrait, QueryOrder, TransactionTrait};
use tracing::instrument;

use crate::database::entity::file_recycle_log::{self, Entity as FileRecycleLog};
use crate::database::entity::logical_library::Entity as LogicalLibrary;
use crate::database::entity::media_type::Entity as MediaType;
use crate::database::entity::tape::{self, Entity as Tape, TapeModel};
use crate::database::entity::tape_file::{self, Entity as TapeFile};
use crate::database::entity::tape_pool::{self, Entity as TapePool};
use crate::database::entity::virtual_organization::Entity as VirtualOrganization;
use crate::database::{exists, modify_entry, stamp_creation, CatalogueDatabase};
use crate::error::{CatalogueError, CatalogueResult, EntityType};
use crate::types::{self, CreateTape, TapeLog, TapeSearchCriteria};
use crate::validation::{db_int, non_empty, non_empty_if_present, non_zero};
use crate::Catalogue;
use tapecat::identity::{EntryLog, SecurityIdentity};

impl Catalogue {
    #[instrument(skip_all, fields(vid = %tape.vid, tape_pool = %tape.tape_pool_name))]
    pub async fn create_tape(
        &self,
        admin: &SecurityIdentity,
        tape: &CreateTape,
    ) -> CatalogueResult<()> {
        non_empty("vid", &tape.vid)?;
        non_empty("media_type", &tape.media_type)?;
        non_empty("vendor", &tape.vendor)?;
        non_empty("logical_library_name", &tape.logical_library_name)?;
        non_empty("tape_pool_name", &tape.tape_pool_name)?;
        non_zero("capacity_in_bytes", tape.capacity_in_bytes)?;
        non_empty_if_present("comment", tape.comment.as_deref())?;
        let capacity_in_bytes = db_int("capacity_in_bytes", tape.capacity_in_bytes)?;

        let db = self.database().await?;

        if exists(db.find_tape(&tape.vid).await)? {
            return Err(CatalogueError::already_exists(EntityType::Tape, &tape.vid));
        }

        let media_type = db
            .find_media_type(&tape.media_type)
            .await
            .map_err(|e| e.referenced_by(EntityType::Tape, &tape.vid))?;
        let library = db
            .find_logical_library(&tape.logical_library_name)
            .await
            .map_err(|e| e.referenced_by(EntityType::Tape, &tape.vid))?;
        let pool = db
            .find_tape_pool(&tape.tape_pool_name)
            .await
            .map_err(|e| e.referenced_by(EntityType::Tape, &tape.vid))?;

        let mut model = tape::ActiveModel {
            vid: Set(tape.vid.clone()),
            media_type_id: Set(media_type.id),
            vendor: Set(tape.vendor.clone()),
            logical_library_id: Set(library.id),
            tape_pool_id: Set(pool.id),
            encryption_key_name: Set(None),
            capacity_in_bytes: Set(capacity_in_bytes),
            data_in_bytes: Set(0),
            last_fseq: Set(0),
            nb_files: Set(0),
            is_disabled: Set(tape.disabled),
            is_full: Set(tape.full),
            is_read_only: Set(tape.read_only),
            is_from_castor: Set(false),
            label_drive: Set(None),
            label_time: Set(None),
            last_read_drive: Set(None),
            last_read_time: Set(None),
            last_write_drive: Set(None),
            last_write_time: Set(None),
            read_mount_count: Set(0),
            write_mount_count: Set(0),
            comment: Set(tape.comment.clone()),
            ..Default::default()
        };
        stamp_creation(&mut model, &EntryLog::now(admin));

        Tape::insert(model)
            .exec_without_returning(db)
            .await
            .map_err(|e| CatalogueError::from_write(e, EntityType::Tape, &tape.vid))?;

        tracing::info!(
            "Created tape {} in pool {} by {}",
            tape.vid,
            tape.tape_pool_name,
            admin
        );

        Ok(())
    }

    /// Deletes a tape without live files or recycle log entries.
    ///
    /// Superseded copies still recorded on the tape are deleted with it.
    #[instrument(skip_all, fields(vid = %vid))]
    pub async fn delete_tape(&self, vid: &str) -> CatalogueResult<()> {
        non_empty("vid", vid)?;

        let db = self.database().await?;
        let txn = db.begin().await.map_err(CatalogueError::database_error)?;

        txn.find_tape(vid).await?;

        let nb_live_files = txn.count_live_tape_files(vid).await?;
        if nb_live_files != 0 {
            return Err(CatalogueError::NotEmpty {
                entity: EntityType::Tape,
                key: vid.to_owned(),
                reason: format!("it holds {} live files", nb_live_files),
            });
        }

        let nb_recycled = FileRecycleLog::find()
            .filter(file_recycle_log::Column::Vid.eq(vid))
            .count(&txn)
            .await
            .map_err(CatalogueError::database_error)?;
        if nb_recycled != 0 {
            return Err(CatalogueError::NotEmpty {
                entity: EntityType::Tape,
                key: vid.to_owned(),
                reason: format!("{} of its files are in the recycle log", nb_recycled),
            });
        }

        let superseded = TapeFile::delete_many()
            .filter(tape_file::Column::Vid.eq(vid))
            .exec(&txn)
            .await
            .map_err(CatalogueError::database_error)?;

        Tape::delete_by_id(vid.to_owned())
            .exec(&txn)
            .await
            .map_err(CatalogueError::database_error)?;

        txn.commit().await.map_err(CatalogueError::database_error)?;

        tracing::info!(
            "Deleted tape {} with {} superseded files",
            vid,
            superseded.rows_affected
        );

        Ok(())
    }

    /// Returns the tapes matching all given criteria.
    pub async fn get_tapes(&self, criteria: &TapeSearchCriteria) -> CatalogueResult<Vec<types::Tape>> {
        non_empty_if_present("vid", criteria.vid.as_deref())?;
        non_empty_if_present("media_type", criteria.media_type.as_deref())?;
        non_empty_if_present("vendor", criteria.vendor.as_deref())?;
        non_empty_if_present("logical_library", criteria.logical_library.as_deref())?;
        non_empty_if_present("tape_pool", criteria.tape_pool.as_deref())?;
        non_empty_if_present("vo", criteria.vo.as_deref())?;
        if let Some(capacity) = criteria.capacity_in_bytes {
            non_zero("capacity_in_bytes", capacity)?;
        }

        let db = self.database().await?;
        let mut condition = Condition::all();

        if let Some(vid) = &criteria.vid {
            condition = condition.add(tape::Column::Vid.eq(vid.as_str()));
        }
        if let Some(name) = &criteria.media_type {
            let media_type = db
                .find_media_type(name)
                .await
                .map_err(|e| e.referenced_by(EntityType::Tape, "search criteria"))?;
            condition = condition.add(tape::Column::MediaTypeId.eq(media_type.id));
        }
        if let Some(vendor) = &criteria.vendor {
            condition = condition.add(tape::Column::Vendor.eq(vendor.as_str()));
        }
        if let Some(name) = &criteria.logical_library {
            let library = db
                .find_logical_library(name)
                .await
                .map_err(|e| e.referenced_by(EntityType::Tape, "search criteria"))?;
            condition = condition.add(tape::Column::LogicalLibraryId.eq(library.id));
        }
        if let Some(name) = &criteria.tape_pool {
            let pool = db
                .find_tape_pool(name)
                .await
                .map_err(|e| e.referenced_by(EntityType::Tape, "search criteria"))?;
            condition = condition.add(tape::Column::TapePoolId.eq(pool.id));
        }
        if let Some(name) = &criteria.vo {
            let vo = db
                .find_virtual_organization(name)
                .await
                .map_err(|e| e.referenced_by(EntityType::Tape, "search criteria"))?;
            let pool_ids: Vec<i64> = TapePool::find()
                .filter(tape_pool::Column::VirtualOrganizationId.eq(vo.id))
                .all(db)
                .await
                .map_err(CatalogueError::database_error)?
                .into_iter()
                .map(|pool| pool.id)
                .collect();
            condition = condition.add(tape::Column::TapePoolId.is_in(pool_ids));
        }
        if let Some(capacity) = criteria.capacity_in_bytes {
            let capacity = db_int("capacity_in_bytes", capacity)?;
            condition = condition.add(tape::Column::CapacityInBytes.eq(capacity));
        }
        if let Some(disabled) = criteria.disabled {
            condition = condition.add(tape::Column::IsDisabled.eq(disabled));
        }
        if let Some(full) = criteria.full {
            condition = condition.add(tape::Column::IsFull.eq(full));
        }
        if let Some(read_only) = criteria.read_only {
            condition = condition.add(tape::Column::IsReadOnly.eq(read_only));
        }

        let tapes = Tape::find()
            .filter(condition)
            .order_by_asc(tape::Column::Vid)
            .all(db)
            .await
            .map_err(CatalogueError::database_error)?;

        tapes_from_models(db, tapes).await
    }

    /// Returns the tapes with the given VIDs, keyed by VID.
    ///
    /// Fails if any of them does not exist.
    pub async fn get_tapes_by_vid(
        &self,
        vids: &BTreeSet<String>,
    ) -> CatalogueResult<HashMap<String, types::Tape>> {
        let models = self.find_tapes_by_vid(vids).await?;
        let db = self.database().await?;
        let tapes = tapes_from_models(db, models).await?;

        Ok(tapes.into_iter().map(|t| (t.vid.clone(), t)).collect())
    }

    /// Returns the logical library of each of the given tapes.
    pub async fn get_vid_to_logical_library(
        &self,
        vids: &BTreeSet<String>,
    ) -> CatalogueResult<HashMap<String, String>> {
        let models = self.find_tapes_by_vid(vids).await?;
        let db = self.database().await?;

        let libraries: HashMap<i64, String> = LogicalLibrary::find()
            .all(db)
            .await
            .map_err(CatalogueError::database_error)?
            .into_iter()
            .map(|library| (library.id, library.name))
            .collect();

        Ok(models
            .into_iter()
            .map(|tape| {
                let library = libraries
                    .get(&tape.logical_library_id)
                    .cloned()
                    .unwrap_or_default();
                (tape.vid, library)
            })
            .collect())
    }

    /// Returns the number of live files on a tape.
    pub async fn get_nb_files_on_tape(&self, vid: &str) -> CatalogueResult<u64> {
        non_empty("vid", vid)?;

        let db = self.database().await?;
        db.find_tape(vid).await?;

        db.count_live_tape_files(vid).await
    }

    pub async fn tape_exists(&self, vid: &str) -> CatalogueResult<bool> {
        non_empty("vid", vid)?;

        let db = self.database().await?;

        exists(db.find_tape(vid).await)
    }

    /// Changes the media type of a tape.
    pub async fn modify_tape_media_type(
        &self,
        admin: &SecurityIdentity,
        vid: &str,
        media_type: &str,
    ) -> CatalogueResult<()> {
        non_empty("vid", vid)?;
        non_empty("media_type", media_type)?;

        let db = self.database().await?;
        let media_type = db
            .find_media_type(media_type)
            .await
            .map_err(|e| e.referenced_by(EntityType::Tape, vid))?;

        self.modify_tape(
            admin,
            vid,
            tape::Column::MediaTypeId,
            Expr::value(media_type.id),
        )
        .await
    }

    pub async fn modify_tape_vendor(
        &self,
        admin: &SecurityIdentity,
        vid: &str,
        vendor: &str,
    ) -> CatalogueResult<()> {
        non_empty("vendor", vendor)?;
        self.modify_tape(admin, vid, tape::Column::Vendor, Expr::value(vendor))
            .await
    }

    /// Moves a tape to another logical library.
    pub async fn modify_tape_logical_library_name(
        &self,
        admin: &SecurityIdentity,
        vid: &str,
        logical_library_name: &str,
    ) -> CatalogueResult<()> {
        non_empty("vid", vid)?;
        non_empty("logical_library_name", logical_library_name)?;

        let db = self.database().await?;
        let library = db
            .find_logical_library(logical_library_name)
            .await
            .map_err(|e| e.referenced_by(EntityType::Tape, vid))?;

        self.modify_tape(
            admin,
            vid,
            tape::Column::LogicalLibraryId,
            Expr::value(library.id),
        )
        .await
    }

    /// Moves a tape to another tape pool.
    ///
    /// The occupancy of both pools follows, since it is summed from
    /// their tapes.
    pub async fn modify_tape_tape_pool_name(
        &self,
        admin: &SecurityIdentity,
        vid: &str,
        tape_pool_name: &str,
    ) -> CatalogueResult<()> {
        non_empty("vid", vid)?;
        non_empty("tape_pool_name", tape_pool_name)?;

        let db = self.database().await?;
        let pool = db
            .find_tape_pool(tape_pool_name)
            .await
            .map_err(|e| e.referenced_by(EntityType::Tape, vid))?;

        self.modify_tape(admin, vid, tape::Column::TapePoolId, Expr::value(pool.id))
            .await
    }

    pub async fn modify_tape_capacity_in_bytes(
        &self,
        admin: &SecurityIdentity,
        vid: &str,
        capacity_in_bytes: u64,
    ) -> CatalogueResult<()> {
        non_zero("capacity_in_bytes", capacity_in_bytes)?;
        let value = db_int("capacity_in_bytes", capacity_in_bytes)?;
        self.modify_tape(
            admin,
            vid,
            tape::Column::CapacityInBytes,
            Expr::value(value),
        )
        .await
    }

    /// Sets or clears the name of the key a tape is encrypted with.
    pub async fn modify_tape_encryption_key_name(
        &self,
        admin: &SecurityIdentity,
        vid: &str,
        encryption_key_name: Option<&str>,
    ) -> CatalogueResult<()> {
        non_empty_if_present("encryption_key_name", encryption_key_name)?;
        self.modify_tape(
            admin,
            vid,
            tape::Column::EncryptionKeyName,
            Expr::value(encryption_key_name.map(str::to_owned)),
        )
        .await
    }

    pub async fn modify_tape_comment(
        &self,
        admin: &SecurityIdentity,
        vid: &str,
        comment: Option<&str>,
    ) -> CatalogueResult<()> {
        non_empty_if_present("comment", comment)?;
        self.modify_tape(
            admin,
            vid,
            tape::Column::Comment,
            Expr::value(comment.map(str::to_owned)),
        )
        .await
    }

    /// Changes one column of a tape, stamping its modification log.
    #[instrument(skip_all, fields(vid = %vid, column = ?column))]
    pub(crate) async fn modify_tape(
        &self,
        admin: &SecurityIdentity,
        vid: &str,
        column: tape::Column,
        value: SimpleExpr,
    ) -> CatalogueResult<()> {
        non_empty("vid", vid)?;

        let db = self.database().await?;
        modify_entry::<Tape, _>(
            db,
            admin,
            EntityType::Tape,
            vid,
            Condition::all().add(tape::Column::Vid.eq(vid)),
            vec![(column, value)],
        )
        .await?;

        tracing::info!("Modified {:?} of tape {} by {}", column, vid, admin);

        Ok(())
    }

    async fn find_tapes_by_vid(&self, vids: &BTreeSet<String>) -> CatalogueResult<Vec<TapeModel>> {
        for vid in vids {
            non_empty("vid", vid)?;
        }

        if vids.is_empty() {
            return Ok(Vec::new());
        }

        let db = self.database().await?;

        let tapes = Tape::find()
            .filter(tape::Column::Vid.is_in(vids.iter().map(String::as_str)))
            .all(db)
            .await
            .map_err(CatalogueError::database_error)?;

        if let Some(missing) = vids
            .iter()
            .find(|vid| !tapes.iter().any(|tape| &tape.vid == *vid))
        {
            return Err(CatalogueError::not_found(EntityType::Tape, missing));
        }

        Ok(tapes)
    }
}

/// Builds tape snapshots, resolving the names of their media type,
/// library, pool and virtual organization.
pub(crate) async fn tapes_from_models<C: ConnectionTrait + Send + Sync>(
    db: &C,
    models: Vec<TapeModel>,
) -> CatalogueResult<Vec<types::Tape>> {
    if models.is_empty() {
        return Ok(Vec::new());
    }

    let media_types: HashMap<i64, String> = MediaType::find()
        .all(db)
        .await
        .map_err(CatalogueError::database_error)?
        .into_iter()
        .map(|media_type| (media_type.id, media_type.name))
        .collect();

    let libraries: HashMap<i64, String> = LogicalLibrary::find()
        .all(db)
        .await
        .map_err(CatalogueError::database_error)?
        .into_iter()
        .map(|library| (library.id, library.name))
        .collect();

    let pools: HashMap<i64, (String, String)> = TapePool::find()
        .find_also_related(VirtualOrganization)
        .all(db)
        .await
        .map_err(CatalogueError::database_error)?
        .into_iter()
        .map(|(pool, vo)| (pool.id, (pool.name, vo.map(|vo| vo.name).unwrap_or_default())))
        .collect();

    Ok(models
        .into_iter()
        .map(|model| {
            let media_type = media_types
                .get(&model.media_type_id)
                .cloned()
                .unwrap_or_default();
            let library = libraries
                .get(&model.logical_library_id)
                .cloned()
                .unwrap_or_default();
            let (pool, vo) = pools.get(&model.tape_pool_id).cloned().unwrap_or_default();
            tape_from_model(model, media_type, library, pool, vo)
        })
        .collect())
}

fn tape_log(drive: Option<String>, time: Option<DateTime<Utc>>) -> Option<TapeLog> {
    match (drive, time) {
        (Some(drive), Some(time)) => Some(TapeLog { drive, time }),
        _ => None,
    }
}

fn tape_from_model(
    model: TapeModel,
    media_type: String,
    library: String,
    pool: String,
    vo: String,
) -> types::Tape {
    types::Tape {
        creation_log: model.creation_log(),
        last_modification_log: model.last_modification_log(),
        vid: model.vid,
        media_type,
        vendor: model.vendor,
        logical_library_name: library,
        tape_pool_name: pool,
        vo,
        encryption_key_name: model.encryption_key_name,
        capacity_in_bytes: model.capacity_in_bytes as u64,
        data_on_tape_in_bytes: model.data_in_bytes as u64,
        last_fseq: model.last_fseq as u64,
        nb_physical_files: model.nb_files as u64,
        full: model.is_full,
        disabled: model.is_disabled,
        read_only: model.is_read_only,
        is_from_castor: model.is_from_castor,
        label_log: tape_log(model.label_drive, model.label_time),
        last_read_log: tape_log(model.last_read_drive, model.last_read_time),
        last_write_log: tape_log(model.last_write_drive, model.last_write_time),
        read_mount_count: model.read_mount_count as u64,
        write_mount_count: model.write_mount_count as u64,
        comment: model.comment,
    }
}
