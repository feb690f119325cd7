use std::collections::HashMap;

use sea_orm::entity::prelude::*;
use sea_orm::query::QuerySelect;
use sea_orm::sea_query::{Alias, Expr, SimpleExpr};
use sea_orm::ActiveValue::Set;
use sea_orm::{Condition, ConnectionTrait, FromQueryResult, PaginatorTrait};
use tracing::instrument;

use crate::database::entity::archive_route::{self, Entity as ArchiveRoute};
use crate::database::entity::tape::{self, Entity as Tape};
use crate::database::entity::tape_pool::{self, Entity as TapePool, TapePoolModel};
use crate::database::entity::virtual_organization::Entity as VirtualOrganization;
use crate::database::{exists, modify_entry, stamp_creation, update_entry, CatalogueDatabase};
use crate::error::{CatalogueError, CatalogueResult, EntityType};
use crate::types;
use crate::validation::{db_int, non_empty, non_empty_if_present};
use crate::Catalogue;
use tapecat::identity::{EntryLog, SecurityIdentity};

/// Occupancy of a tape pool, summed over its tapes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct TapePoolOccupancy {
    pub nb_tapes: u64,
    pub capacity_bytes: u64,
    pub data_bytes: u64,
    pub nb_physical_files: u64,
}

#[derive(Debug, FromQueryResult)]
struct TapePoolOccupancyRow {
    tape_pool_id: i64,
    nb_tapes: i64,
    capacity_bytes: Option<i64>,
    data_bytes: Option<i64>,
    nb_physical_files: Option<i64>,
}

/// Sums the occupancy of tape pools from their tapes.
///
/// Pools without tapes are absent from the returned map.
pub(crate) async fn tape_pool_occupancy<C: ConnectionTrait + Send + Sync>(
    db: &C,
    tape_pool_id: Option<i64>,
) -> CatalogueResult<HashMap<i64, TapePoolOccupancy>> {
    let sum = |column: tape::Column| Expr::col(column).sum().cast_as(Alias::new("BIGINT"));

    let mut query = Tape::find()
        .select_only()
        .column(tape::Column::TapePoolId)
        .column_as(Expr::col(tape::Column::Vid).count(), "nb_tapes")
        .column_as(sum(tape::Column::CapacityInBytes), "capacity_bytes")
        .column_as(sum(tape::Column::DataInBytes), "data_bytes")
        .column_as(sum(tape::Column::NbFiles), "nb_physical_files")
        .group_by(tape::Column::TapePoolId);

    if let Some(id) = tape_pool_id {
        query = query.filter(tape::Column::TapePoolId.eq(id));
    }

    let rows = query
        .into_model::<TapePoolOccupancyRow>()
        .all(db)
        .await
        .map_err(CatalogueError::database_error)?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let occupancy = TapePoolOccupancy {
                nb_tapes: row.nb_tapes as u64,
                capacity_bytes: row.capacity_bytes.unwrap_or(0) as u64,
                data_bytes: row.data_bytes.unwrap_or(0) as u64,
                nb_physical_files: row.nb_physical_files.unwrap_or(0) as u64,
            };
            (row.tape_pool_id, occupancy)
        })
        .collect())
}

impl Catalogue {
    #[allow(clippy::too_many_arguments)]
    #[instrument(skip_all, fields(name = %name, vo = %vo))]
    pub async fn create_tape_pool(
        &self,
        admin: &SecurityIdentity,
        name: &str,
        vo: &str,
        nb_partial_tapes: u64,
        encryption: bool,
        supply: Option<&str>,
        comment: &str,
    ) -> CatalogueResult<()> {
        non_empty("name", name)?;
        non_empty("vo", vo)?;
        non_empty_if_present("supply", supply)?;
        non_empty("comment", comment)?;
        let nb_partial_tapes = db_int("nb_partial_tapes", nb_partial_tapes)?;

        let db = self.database().await?;

        if exists(db.find_tape_pool(name).await)? {
            return Err(CatalogueError::already_exists(EntityType::TapePool, name));
        }

        let vo = db
            .find_virtual_organization(vo)
            .await
            .map_err(|e| e.referenced_by(EntityType::TapePool, name))?;

        let mut model = tape_pool::ActiveModel {
            name: Set(name.to_owned()),
            virtual_organization_id: Set(vo.id),
            nb_partial_tapes: Set(nb_partial_tapes),
            is_encrypted: Set(encryption),
            supply: Set(supply.map(str::to_owned)),
            comment: Set(comment.to_owned()),
            ..Default::default()
        };
        stamp_creation(&mut model, &EntryLog::now(admin));

        TapePool::insert(model)
            .exec(db)
            .await
            .map_err(|e| CatalogueError::from_write(e, EntityType::TapePool, name))?;

        tracing::info!("Created tape pool {} of {} by {}", name, vo.name, admin);

        Ok(())
    }

    /// Deletes a tape pool.
    ///
    /// Fails while the pool owns tapes or archive routes target it.
    #[instrument(skip_all, fields(name = %name))]
    pub async fn delete_tape_pool(&self, name: &str) -> CatalogueResult<()> {
        non_empty("name", name)?;

        let db = self.database().await?;
        let pool = db.find_tape_pool(name).await?;

        let nb_tapes = Tape::find()
            .filter(tape::Column::TapePoolId.eq(pool.id))
            .count(db)
            .await
            .map_err(CatalogueError::database_error)?;

        if nb_tapes != 0 {
            return Err(CatalogueError::NotEmpty {
                entity: EntityType::TapePool,
                key: name.to_owned(),
                reason: format!("it owns {} tapes", nb_tapes),
            });
        }

        let nb_routes = ArchiveRoute::find()
            .filter(archive_route::Column::TapePoolId.eq(pool.id))
            .count(db)
            .await
            .map_err(CatalogueError::database_error)?;

        if nb_routes != 0 {
            return Err(CatalogueError::InUse {
                entity: EntityType::TapePool,
                key: name.to_owned(),
                reason: format!("{} archive routes target it", nb_routes),
            });
        }

        TapePool::delete_by_id(pool.id)
            .exec(db)
            .await
            .map_err(CatalogueError::database_error)?;

        tracing::info!("Deleted tape pool {}", name);

        Ok(())
    }

    /// Returns all tape pools with their occupancy.
    pub async fn get_tape_pools(&self) -> CatalogueResult<Vec<types::TapePool>> {
        let db = self.database().await?;

        let pools = TapePool::find()
            .find_also_related(VirtualOrganization)
            .all(db)
            .await
            .map_err(CatalogueError::database_error)?;

        let occupancy = tape_pool_occupancy(db, None).await?;

        Ok(pools
            .into_iter()
            .map(|(pool, vo)| {
                let vo = vo.map(|vo| vo.name).unwrap_or_default();
                let occupancy = occupancy.get(&pool.id).copied().unwrap_or_default();
                tape_pool_from_model(pool, vo, occupancy)
            })
            .collect())
    }

    /// Returns a tape pool with its occupancy, if it exists.
    pub async fn get_tape_pool(&self, name: &str) -> CatalogueResult<Option<types::TapePool>> {
        non_empty("name", name)?;

        let db = self.database().await?;

        let pool = TapePool::find()
            .filter(tape_pool::Column::Name.eq(name))
            .find_also_related(VirtualOrganization)
            .one(db)
            .await
            .map_err(CatalogueError::database_error)?;

        let (pool, vo) = match pool {
            Some(found) => found,
            None => return Ok(None),
        };

        let occupancy = tape_pool_occupancy(db, Some(pool.id))
            .await?
            .remove(&pool.id)
            .unwrap_or_default();
        let vo = vo.map(|vo| vo.name).unwrap_or_default();

        Ok(Some(tape_pool_from_model(pool, vo, occupancy)))
    }

    pub async fn tape_pool_exists(&self, name: &str) -> CatalogueResult<bool> {
        non_empty("name", name)?;

        let db = self.database().await?;

        exists(db.find_tape_pool(name).await)
    }

    /// Moves a tape pool to another virtual organization.
    #[instrument(skip_all, fields(name = %name, vo = %vo))]
    pub async fn modify_tape_pool_vo(
        &self,
        admin: &SecurityIdentity,
        name: &str,
        vo: &str,
    ) -> CatalogueResult<()> {
        non_empty("name", name)?;
        non_empty("vo", vo)?;

        let db = self.database().await?;
        let vo = db
            .find_virtual_organization(vo)
            .await
            .map_err(|e| e.referenced_by(EntityType::TapePool, name))?;

        self.modify_tape_pool(
            admin,
            name,
            tape_pool::Column::VirtualOrganizationId,
            Expr::value(vo.id),
        )
        .await
    }

    pub async fn modify_tape_pool_nb_partial_tapes(
        &self,
        admin: &SecurityIdentity,
        name: &str,
        nb_partial_tapes: u64,
    ) -> CatalogueResult<()> {
        let value = db_int("nb_partial_tapes", nb_partial_tapes)?;
        self.modify_tape_pool(
            admin,
            name,
            tape_pool::Column::NbPartialTapes,
            Expr::value(value),
        )
        .await
    }

    pub async fn modify_tape_pool_comment(
        &self,
        admin: &SecurityIdentity,
        name: &str,
        comment: &str,
    ) -> CatalogueResult<()> {
        non_empty("comment", comment)?;
        self.modify_tape_pool(admin, name, tape_pool::Column::Comment, Expr::value(comment))
            .await
    }

    pub async fn set_tape_pool_encryption(
        &self,
        admin: &SecurityIdentity,
        name: &str,
        encryption: bool,
    ) -> CatalogueResult<()> {
        self.modify_tape_pool(
            admin,
            name,
            tape_pool::Column::IsEncrypted,
            Expr::value(encryption),
        )
        .await
    }

    /// Sets or clears the supply mechanism of a tape pool.
    pub async fn modify_tape_pool_supply(
        &self,
        admin: &SecurityIdentity,
        name: &str,
        supply: Option<&str>,
    ) -> CatalogueResult<()> {
        non_empty_if_present("supply", supply)?;
        self.modify_tape_pool(
            admin,
            name,
            tape_pool::Column::Supply,
            Expr::value(supply.map(str::to_owned)),
        )
        .await
    }

    #[instrument(skip_all, fields(current_name = %current_name, new_name = %new_name))]
    pub async fn modify_tape_pool_name(
        &self,
        admin: &SecurityIdentity,
        current_name: &str,
        new_name: &str,
    ) -> CatalogueResult<()> {
        non_empty("current_name", current_name)?;
        non_empty("new_name", new_name)?;

        let db = self.database().await?;

        if current_name != new_name && exists(db.find_tape_pool(new_name).await)? {
            return Err(CatalogueError::already_exists(EntityType::TapePool, new_name));
        }

        let updated = update_entry::<TapePool, _>(
            db,
            admin,
            Condition::all().add(tape_pool::Column::Name.eq(current_name)),
            vec![(tape_pool::Column::Name, Expr::value(new_name))],
        )
        .await
        .map_err(|e| CatalogueError::from_write(e, EntityType::TapePool, new_name))?;

        if updated == 0 {
            return Err(CatalogueError::not_found(EntityType::TapePool, current_name));
        }

        tracing::info!(
            "Renamed tape pool {} to {} by {}",
            current_name,
            new_name,
            admin
        );

        Ok(())
    }

    #[instrument(skip_all, fields(name = %name, column = ?column))]
    async fn modify_tape_pool(
        &self,
        admin: &SecurityIdentity,
        name: &str,
        column: tape_pool::Column,
        value: SimpleExpr,
    ) -> CatalogueResult<()> {
        non_empty("name", name)?;

        let db = self.database().await?;
        modify_entry::<TapePool, _>(
            db,
            admin,
            EntityType::TapePool,
            name,
            Condition::all().add(tape_pool::Column::Name.eq(name)),
            vec![(column, value)],
        )
        .await?;

        tracing::info!("Modified {:?} of tape pool {} by {}", column, name, admin);

        Ok(())
    }
}

fn tape_pool_from_model(
    model: TapePoolModel,
    vo: String,
    occupancy: TapePoolOccupancy,
) -> types::TapePool {
    types::TapePool {
        creation_log: model.creation_log(),
        last_modification_log: model.last_modification_log(),
        name: model.name,
        vo,
        nb_partial_tapes: model.nb_partial_tapes as u64,
        encryption: model.is_encrypted,
        supply: model.supply,
        nb_tapes: occupancy.nb_tapes,
        capacity_bytes: occupancy.capacity_bytes,
        data_bytes: occupancy.data_bytes,
        nb_physical_files: occupancy.nb_physical_files,
        comment: model.comment,
    }
}
