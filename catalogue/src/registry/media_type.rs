use sea_orm::entity::prelude::*;
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::ActiveValue::Set;
use sea_orm::{Condition, PaginatorTrait, QueryOrder};
use tracing::instrument;

use crate::database::entity::media_type::{self, Entity as MediaType, MediaTypeModel};
use crate::database::entity::tape::{self, Entity as Tape};
use crate::database::{exists, modify_entry, stamp_creation, update_entry, CatalogueDatabase};
use crate::error::{CatalogueError, CatalogueResult, EntityType};
use crate::types::{self, CreateMediaType};
use crate::validation::{db_int, non_empty, non_zero};
use crate::Catalogue;
use tapecat::identity::{EntryLog, SecurityIdentity};

impl Catalogue {
    #[instrument(skip_all, fields(name = %media_type.name))]
    pub async fn create_media_type(
        &self,
        admin: &SecurityIdentity,
        media_type: &CreateMediaType,
    ) -> CatalogueResult<()> {
        non_empty("name", &media_type.name)?;
        non_empty("cartridge", &media_type.cartridge)?;
        non_zero("capacity_in_bytes", media_type.capacity_in_bytes)?;
        non_empty("comment", &media_type.comment)?;
        let capacity_in_bytes = db_int("capacity_in_bytes", media_type.capacity_in_bytes)?;
        let min_lpos = optional_db_int("min_lpos", media_type.min_lpos)?;
        let max_lpos = optional_db_int("max_lpos", media_type.max_lpos)?;

        let db = self.database().await?;

        if exists(db.find_media_type(&media_type.name).await)? {
            return Err(CatalogueError::already_exists(
                EntityType::MediaType,
                &media_type.name,
            ));
        }

        let mut model = media_type::ActiveModel {
            name: Set(media_type.name.clone()),
            cartridge: Set(media_type.cartridge.clone()),
            capacity_in_bytes: Set(capacity_in_bytes),
            primary_density_code: Set(media_type.primary_density_code.map(i32::from)),
            secondary_density_code: Set(media_type.secondary_density_code.map(i32::from)),
            nb_wraps: Set(media_type.nb_wraps.map(i64::from)),
            min_lpos: Set(min_lpos),
            max_lpos: Set(max_lpos),
            comment: Set(media_type.comment.clone()),
            ..Default::default()
        };
        stamp_creation(&mut model, &EntryLog::now(admin));

        MediaType::insert(model)
            .exec(db)
            .await
            .map_err(|e| CatalogueError::from_write(e, EntityType::MediaType, &media_type.name))?;

        tracing::info!("Created media type {} by {}", media_type.name, admin);

        Ok(())
    }

    /// Deletes a media type that no tape is of.
    #[instrument(skip_all, fields(name = %name))]
    pub async fn delete_media_type(&self, name: &str) -> CatalogueResult<()> {
        non_empty("name", name)?;

        let db = self.database().await?;
        let media_type = db.find_media_type(name).await?;

        let nb_tapes = Tape::find()
            .filter(tape::Column::MediaTypeId.eq(media_type.id))
            .count(db)
            .await
            .map_err(CatalogueError::database_error)?;

        if nb_tapes != 0 {
            return Err(CatalogueError::InUse {
                entity: EntityType::MediaType,
                key: name.to_owned(),
                reason: format!("{} tapes are of this type", nb_tapes),
            });
        }

        MediaType::delete_by_id(media_type.id)
            .exec(db)
            .await
            .map_err(CatalogueError::database_error)?;

        tracing::info!("Deleted media type {}", name);

        Ok(())
    }

    pub async fn get_media_types(&self) -> CatalogueResult<Vec<types::MediaType>> {
        let db = self.database().await?;

        let media_types = MediaType::find()
            .order_by_asc(media_type::Column::Name)
            .all(db)
            .await
            .map_err(CatalogueError::database_error)?;

        Ok(media_types.into_iter().map(media_type_from_model).collect())
    }

    /// Returns the media type of a tape.
    pub async fn get_media_type_by_vid(&self, vid: &str) -> CatalogueResult<types::MediaType> {
        non_empty("vid", vid)?;

        let db = self.database().await?;
        let tape = db.find_tape(vid).await?;

        let media_type = MediaType::find_by_id(tape.media_type_id)
            .one(db)
            .await
            .map_err(CatalogueError::database_error)?
            .ok_or_else(|| {
                CatalogueError::referential_violation(
                    EntityType::Tape,
                    vid,
                    EntityType::MediaType,
                    tape.media_type_id,
                )
            })?;

        Ok(media_type_from_model(media_type))
    }

    #[instrument(skip_all, fields(current_name = %current_name, new_name = %new_name))]
    pub async fn modify_media_type_name(
        &self,
        admin: &SecurityIdentity,
        current_name: &str,
        new_name: &str,
    ) -> CatalogueResult<()> {
        non_empty("current_name", current_name)?;
        non_empty("new_name", new_name)?;

        let db = self.database().await?;

        if current_name != new_name && exists(db.find_media_type(new_name).await)? {
            return Err(CatalogueError::already_exists(EntityType::MediaType, new_name));
        }

        let updated = update_entry::<MediaType, _>(
            db,
            admin,
            Condition::all().add(media_type::Column::Name.eq(current_name)),
            vec![(media_type::Column::Name, Expr::value(new_name))],
        )
        .await
        .map_err(|e| CatalogueError::from_write(e, EntityType::MediaType, new_name))?;

        if updated == 0 {
            return Err(CatalogueError::not_found(EntityType::MediaType, current_name));
        }

        tracing::info!(
            "Renamed media type {} to {} by {}",
            current_name,
            new_name,
            admin
        );

        Ok(())
    }

    pub async fn modify_media_type_cartridge(
        &self,
        admin: &SecurityIdentity,
        name: &str,
        cartridge: &str,
    ) -> CatalogueResult<()> {
        non_empty("cartridge", cartridge)?;
        self.modify_media_type(
            admin,
            name,
            media_type::Column::Cartridge,
            Expr::value(cartridge),
        )
        .await
    }

    pub async fn modify_media_type_capacity_in_bytes(
        &self,
        admin: &SecurityIdentity,
        name: &str,
        capacity_in_bytes: u64,
    ) -> CatalogueResult<()> {
        non_zero("capacity_in_bytes", capacity_in_bytes)?;
        let value = db_int("capacity_in_bytes", capacity_in_bytes)?;
        self.modify_media_type(
            admin,
            name,
            media_type::Column::CapacityInBytes,
            Expr::value(value),
        )
        .await
    }

    pub async fn modify_media_type_primary_density_code(
        &self,
        admin: &SecurityIdentity,
        name: &str,
        primary_density_code: Option<u8>,
    ) -> CatalogueResult<()> {
        self.modify_media_type(
            admin,
            name,
            media_type::Column::PrimaryDensityCode,
            Expr::value(primary_density_code.map(i32::from)),
        )
        .await
    }

    pub async fn modify_media_type_secondary_density_code(
        &self,
        admin: &SecurityIdentity,
        name: &str,
        secondary_density_code: Option<u8>,
    ) -> CatalogueResult<()> {
        self.modify_media_type(
            admin,
            name,
            media_type::Column::SecondaryDensityCode,
            Expr::value(secondary_density_code.map(i32::from)),
        )
        .await
    }

    pub async fn modify_media_type_nb_wraps(
        &self,
        admin: &SecurityIdentity,
        name: &str,
        nb_wraps: Option<u32>,
    ) -> CatalogueResult<()> {
        self.modify_media_type(
            admin,
            name,
            media_type::Column::NbWraps,
            Expr::value(nb_wraps.map(i64::from)),
        )
        .await
    }

    pub async fn modify_media_type_min_lpos(
        &self,
        admin: &SecurityIdentity,
        name: &str,
        min_lpos: Option<u64>,
    ) -> CatalogueResult<()> {
        let value = optional_db_int("min_lpos", min_lpos)?;
        self.modify_media_type(admin, name, media_type::Column::MinLpos, Expr::value(value))
            .await
    }

    pub async fn modify_media_type_max_lpos(
        &self,
        admin: &SecurityIdentity,
        name: &str,
        max_lpos: Option<u64>,
    ) -> CatalogueResult<()> {
        let value = optional_db_int("max_lpos", max_lpos)?;
        self.modify_media_type(admin, name, media_type::Column::MaxLpos, Expr::value(value))
            .await
    }

    pub async fn modify_media_type_comment(
        &self,
        admin: &SecurityIdentity,
        name: &str,
        comment: &str,
    ) -> CatalogueResult<()> {
        non_empty("comment", comment)?;
        self.modify_media_type(
            admin,
            name,
            media_type::Column::Comment,
            Expr::value(comment),
        )
        .await
    }

    #[instrument(skip_all, fields(name = %name, column = ?column))]
    async fn modify_media_type(
        &self,
        admin: &SecurityIdentity,
        name: &str,
        column: media_type::Column,
        value: SimpleExpr,
    ) -> CatalogueResult<()> {
        non_empty("name", name)?;

        let db = self.database().await?;
        modify_entry::<MediaType, _>(
            db,
            admin,
            EntityType::MediaType,
            name,
            Condition::all().add(media_type::Column::Name.eq(name)),
            vec![(column, value)],
        )
        .await?;

        tracing::info!("Modified {:?} of media type {} by {}", column, name, admin);

        Ok(())
    }
}

fn optional_db_int(field: &'static str, value: Option<u64>) -> CatalogueResult<Option<i64>> {
    value.map(|value| db_int(field, value)).transpose()
}

fn media_type_from_model(model: MediaTypeModel) -> types::MediaType {
    types::MediaType {
        creation_log: model.creation_log(),
        last_modification_log: model.last_modification_log(),
        name: model.name,
        cartridge: model.cartridge,
        capacity_in_bytes: model.capacity_in_bytes as u64,
        primary_density_code: model.primary_density_code.map(|code| code as u8),
        secondary_density_code: model.secondary_density_code.map(|code| code as u8),
        nb_wraps: model.nb_wraps.map(|wraps| wraps as u32),
        min_lpos: model.min_lpos.map(|lpos| lpos as u64),
        max_lpos: model.max_lpos.map(|lpos| lpos as u64),
        comment: model.comment,
    }
}
