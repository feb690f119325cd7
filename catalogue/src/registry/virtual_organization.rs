use sea_orm::entity::prelude::*;
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::ActiveValue::Set;
use sea_orm::{Condition, PaginatorTrait};
use tracing::instrument;

use crate::database::entity::tape_pool::{self, Entity as TapePool};
use crate::database::entity::virtual_organization::{
    self, Entity as VirtualOrganization, VirtualOrganizationModel,
};
use crate::database::{exists, modify_entry, stamp_creation, update_entry, CatalogueDatabase};
use crate::error::{CatalogueError, CatalogueResult, EntityType};
use crate::types::{self, CreateVirtualOrganization};
use crate::validation::{db_int, non_empty};
use crate::Catalogue;
use tapecat::identity::{EntryLog, SecurityIdentity};

impl Catalogue {
    #[instrument(skip_all, fields(name = %vo.name))]
    pub async fn create_virtual_organization(
        &self,
        admin: &SecurityIdentity,
        vo: &CreateVirtualOrganization,
    ) -> CatalogueResult<()> {
        non_empty("name", &vo.name)?;
        non_empty("comment", &vo.comment)?;
        let read_max_drives = db_int("read_max_drives", vo.read_max_drives)?;
        let write_max_drives = db_int("write_max_drives", vo.write_max_drives)?;
        let max_file_size = db_int("max_file_size", vo.max_file_size)?;

        let db = self.database().await?;

        let existing = VirtualOrganization::find()
            .filter(virtual_organization::Column::Name.eq(vo.name.as_str()))
            .one(db)
            .await
            .map_err(CatalogueError::database_error)?;

        if existing.is_some() {
            return Err(CatalogueError::already_exists(
                EntityType::VirtualOrganization,
                &vo.name,
            ));
        }

        let mut model = virtual_organization::ActiveModel {
            name: Set(vo.name.clone()),
            read_max_drives: Set(read_max_drives),
            write_max_drives: Set(write_max_drives),
            max_file_size: Set(max_file_size),
            comment: Set(vo.comment.clone()),
            ..Default::default()
        };
        stamp_creation(&mut model, &EntryLog::now(admin));

        VirtualOrganization::insert(model)
            .exec(db)
            .await
            .map_err(|e| {
                CatalogueError::from_write(e, EntityType::VirtualOrganization, &vo.name)
            })?;

        tracing::info!("Created virtual organization {} by {}", vo.name, admin);

        Ok(())
    }

    #[instrument(skip_all, fields(name = %name))]
    pub async fn delete_virtual_organization(&self, name: &str) -> CatalogueResult<()> {
        non_empty("name", name)?;

        let db = self.database().await?;
        let vo = db.find_virtual_organization(name).await?;

        let nb_pools = TapePool::find()
            .filter(tape_pool::Column::VirtualOrganizationId.eq(vo.id))
            .count(db)
            .await
            .map_err(CatalogueError::database_error)?;

        if nb_pools != 0 {
            return Err(CatalogueError::InUse {
                entity: EntityType::VirtualOrganization,
                key: name.to_owned(),
                reason: format!("{} tape pools belong to it", nb_pools),
            });
        }

        VirtualOrganization::delete_by_id(vo.id)
            .exec(db)
            .await
            .map_err(CatalogueError::database_error)?;

        tracing::info!("Deleted virtual organization {}", name);

        Ok(())
    }

    pub async fn get_virtual_organizations(
        &self,
    ) -> CatalogueResult<Vec<types::VirtualOrganization>> {
        let db = self.database().await?;

        let vos = VirtualOrganization::find()
            .all(db)
            .await
            .map_err(CatalogueError::database_error)?;

        Ok(vos.into_iter().map(vo_from_model).collect())
    }

    /// Returns the virtual organization owning a tape pool.
    pub async fn get_virtual_organization_of_tape_pool(
        &self,
        tape_pool_name: &str,
    ) -> CatalogueResult<types::VirtualOrganization> {
        non_empty("tape_pool_name", tape_pool_name)?;

        let db = self.database().await?;
        let pool = db.find_tape_pool(tape_pool_name).await?;

        let vo = VirtualOrganization::find_by_id(pool.virtual_organization_id)
            .one(db)
            .await
            .map_err(CatalogueError::database_error)?
            .ok_or_else(|| {
                CatalogueError::referential_violation(
                    EntityType::TapePool,
                    tape_pool_name,
                    EntityType::VirtualOrganization,
                    pool.virtual_organization_id,
                )
            })?;

        Ok(vo_from_model(vo))
    }

    #[instrument(skip_all, fields(current_name = %current_name, new_name = %new_name))]
    pub async fn modify_virtual_organization_name(
        &self,
        admin: &SecurityIdentity,
        current_name: &str,
        new_name: &str,
    ) -> CatalogueResult<()> {
        non_empty("current_name", current_name)?;
        non_empty("new_name", new_name)?;

        let db = self.database().await?;

        if current_name != new_name && exists(db.find_virtual_organization(new_name).await)? {
            return Err(CatalogueError::already_exists(
                EntityType::VirtualOrganization,
                new_name,
            ));
        }

        let updated = update_entry::<VirtualOrganization, _>(
            db,
            admin,
            Condition::all().add(virtual_organization::Column::Name.eq(current_name)),
            vec![(virtual_organization::Column::Name, Expr::value(new_name))],
        )
        .await
        .map_err(|e| CatalogueError::from_write(e, EntityType::VirtualOrganization, new_name))?;

        if updated == 0 {
            return Err(CatalogueError::not_found(
                EntityType::VirtualOrganization,
                current_name,
            ));
        }

        tracing::info!(
            "Renamed virtual organization {} to {} by {}",
            current_name,
            new_name,
            admin
        );

        Ok(())
    }

    pub async fn modify_virtual_organization_read_max_drives(
        &self,
        admin: &SecurityIdentity,
        name: &str,
        read_max_drives: u64,
    ) -> CatalogueResult<()> {
        let value = db_int("read_max_drives", read_max_drives)?;
        self.modify_virtual_organization(
            admin,
            name,
            virtual_organization::Column::ReadMaxDrives,
            Expr::value(value),
        )
        .await
    }

    pub async fn modify_virtual_organization_write_max_drives(
        &self,
        admin: &SecurityIdentity,
        name: &str,
        write_max_drives: u64,
    ) -> CatalogueResult<()> {
        let value = db_int("write_max_drives", write_max_drives)?;
        self.modify_virtual_organization(
            admin,
            name,
            virtual_organization::Column::WriteMaxDrives,
            Expr::value(value),
        )
        .await
    }

    pub async fn modify_virtual_organization_max_file_size(
        &self,
        admin: &SecurityIdentity,
        name: &str,
        max_file_size: u64,
    ) -> CatalogueResult<()> {
        let value = db_int("max_file_size", max_file_size)?;
        self.modify_virtual_organization(
            admin,
            name,
            virtual_organization::Column::MaxFileSize,
            Expr::value(value),
        )
        .await
    }

    pub async fn modify_virtual_organization_comment(
        &self,
        admin: &SecurityIdentity,
        name: &str,
        comment: &str,
    ) -> CatalogueResult<()> {
        non_empty("comment", comment)?;
        self.modify_virtual_organization(
            admin,
            name,
            virtual_organization::Column::Comment,
            Expr::value(comment),
        )
        .await
    }

    #[instrument(skip_all, fields(name = %name, column = ?column))]
    async fn modify_virtual_organization(
        &self,
        admin: &SecurityIdentity,
        name: &str,
        column: virtual_organization::Column,
        value: SimpleExpr,
    ) -> CatalogueResult<()> {
        non_empty("name", name)?;

        let db = self.database().await?;
        modify_entry::<VirtualOrganization, _>(
            db,
            admin,
            EntityType::VirtualOrganization,
            name,
            Condition::all().add(virtual_organization::Column::Name.eq(name)),
            vec![(column, value)],
        )
        .await?;

        tracing::info!(
            "Modified {:?} of virtual organization {} by {}",
            column,
            name,
            admin
        );

        Ok(())
    }
}

fn vo_from_model(model: VirtualOrganizationModel) -> types::VirtualOrganization {
    types::VirtualOrganization {
        creation_log: model.creation_log(),
        last_modification_log: model.last_modification_log(),
        name: model.name,
        read_max_drives: model.read_max_drives as u64,
        write_max_drives: model.write_max_drives as u64,
        max_file_size: model.max_file_size as u64,
        comment: model.comment,
    }
}
