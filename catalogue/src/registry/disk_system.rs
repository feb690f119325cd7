use sea_orm::entity::prelude::*;
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::ActiveValue::Set;
use sea_orm::{Condition, PaginatorTrait};
use tracing::instrument;

use crate::database::entity::disk_system::{self, DiskSystemModel, Entity as DiskSystem};
use crate::database::{modify_entry, stamp_creation};
use crate::error::{CatalogueError, CatalogueResult, EntityType};
use crate::types::{self, CreateDiskSystem};
use crate::validation::{db_int, file_regexp, non_empty, non_zero};
use crate::Catalogue;
use tapecat::identity::{EntryLog, SecurityIdentity};

impl Catalogue {
    #[instrument(skip_all, fields(name = %disk_system.name))]
    pub async fn create_disk_system(
        &self,
        admin: &SecurityIdentity,
        disk_system: &CreateDiskSystem,
    ) -> CatalogueResult<()> {
        non_empty("name", &disk_system.name)?;
        file_regexp(&disk_system.file_regexp)?;
        non_empty("free_space_query_url", &disk_system.free_space_query_url)?;
        non_zero("refresh_interval", disk_system.refresh_interval)?;
        non_zero("targeted_free_space", disk_system.targeted_free_space)?;
        non_zero("sleep_time", disk_system.sleep_time)?;
        non_empty("comment", &disk_system.comment)?;
        let refresh_interval = db_int("refresh_interval", disk_system.refresh_interval)?;
        let targeted_free_space = db_int("targeted_free_space", disk_system.targeted_free_space)?;
        let sleep_time = db_int("sleep_time", disk_system.sleep_time)?;

        let db = self.database().await?;

        let nb_existing = DiskSystem::find()
            .filter(disk_system::Column::Name.eq(disk_system.name.as_str()))
            .count(db)
            .await
            .map_err(CatalogueError::database_error)?;

        if nb_existing != 0 {
            return Err(CatalogueError::already_exists(
                EntityType::DiskSystem,
                &disk_system.name,
            ));
        }

        let mut model = disk_system::ActiveModel {
            name: Set(disk_system.name.clone()),
            file_regexp: Set(disk_system.file_regexp.clone()),
            free_space_query_url: Set(disk_system.free_space_query_url.clone()),
            refresh_interval: Set(refresh_interval),
            targeted_free_space: Set(targeted_free_space),
            sleep_time: Set(sleep_time),
            comment: Set(disk_system.comment.clone()),
            ..Default::default()
        };
        stamp_creation(&mut model, &EntryLog::now(admin));

        DiskSystem::insert(model)
            .exec(db)
            .await
            .map_err(|e| CatalogueError::from_write(e, EntityType::DiskSystem, &disk_system.name))?;

        tracing::info!("Created disk system {} by {}", disk_system.name, admin);

        Ok(())
    }

    #[instrument(skip_all, fields(name = %name))]
    pub async fn delete_disk_system(&self, name: &str) -> CatalogueResult<()> {
        non_empty("name", name)?;

        let db = self.database().await?;

        let deletion = DiskSystem::delete_many()
            .filter(disk_system::Column::Name.eq(name))
            .exec(db)
            .await
            .map_err(CatalogueError::database_error)?;

        if deletion.rows_affected == 0 {
            return Err(CatalogueError::not_found(EntityType::DiskSystem, name));
        }

        tracing::info!("Deleted disk system {}", name);

        Ok(())
    }

    pub async fn get_all_disk_systems(&self) -> CatalogueResult<Vec<types::DiskSystem>> {
        let db = self.database().await?;

        let disk_systems = DiskSystem::find()
            .all(db)
            .await
            .map_err(CatalogueError::database_error)?;

        Ok(disk_systems.into_iter().map(disk_system_from_model).collect())
    }

    pub async fn disk_system_exists(&self, name: &str) -> CatalogueResult<bool> {
        non_empty("name", name)?;

        let db = self.database().await?;

        let nb_existing = DiskSystem::find()
            .filter(disk_system::Column::Name.eq(name))
            .count(db)
            .await
            .map_err(CatalogueError::database_error)?;

        Ok(nb_existing != 0)
    }

    pub async fn modify_disk_system_file_regexp(
        &self,
        admin: &SecurityIdentity,
        name: &str,
        regexp: &str,
    ) -> CatalogueResult<()> {
        file_regexp(regexp)?;
        self.modify_disk_system(
            admin,
            name,
            disk_system::Column::FileRegexp,
            Expr::value(regexp),
        )
        .await
    }

    pub async fn modify_disk_system_free_space_query_url(
        &self,
        admin: &SecurityIdentity,
        name: &str,
        free_space_query_url: &str,
    ) -> CatalogueResult<()> {
        non_empty("free_space_query_url", free_space_query_url)?;
        self.modify_disk_system(
            admin,
            name,
            disk_system::Column::FreeSpaceQueryUrl,
            Expr::value(free_space_query_url),
        )
        .await
    }

    pub async fn modify_disk_system_refresh_interval(
        &self,
        admin: &SecurityIdentity,
        name: &str,
        refresh_interval: u64,
    ) -> CatalogueResult<()> {
        non_zero("refresh_interval", refresh_interval)?;
        let value = db_int("refresh_interval", refresh_interval)?;
        self.modify_disk_system(
            admin,
            name,
            disk_system::Column::RefreshInterval,
            Expr::value(value),
        )
        .await
    }

    pub async fn modify_disk_system_targeted_free_space(
        &self,
        admin: &SecurityIdentity,
        name: &str,
        targeted_free_space: u64,
    ) -> CatalogueResult<()> {
        non_zero("targeted_free_space", targeted_free_space)?;
        let value = db_int("targeted_free_space", targeted_free_space)?;
        self.modify_disk_system(
            admin,
            name,
            disk_system::Column::TargetedFreeSpace,
            Expr::value(value),
        )
        .await
    }

    pub async fn modify_disk_system_sleep_time(
        &self,
        admin: &SecurityIdentity,
        name: &str,
        sleep_time: u64,
    ) -> CatalogueResult<()> {
        non_zero("sleep_time", sleep_time)?;
        let value = db_int("sleep_time", sleep_time)?;
        self.modify_disk_system(
            admin,
            name,
            disk_system::Column::SleepTime,
            Expr::value(value),
        )
        .await
    }

    pub async fn modify_disk_system_comment(
        &self,
        admin: &SecurityIdentity,
        name: &str,
        comment: &str,
    ) -> CatalogueResult<()> {
        non_empty("comment", comment)?;
        self.modify_disk_system(
            admin,
            name,
            disk_system::Column::Comment,
            Expr::value(comment),
        )
        .await
    }

    #[instrument(skip_all, fields(name = %name, column = ?column))]
    async fn modify_disk_system(
        &self,
        admin: &SecurityIdentity,
        name: &str,
        column: disk_system::Column,
        value: SimpleExpr,
    ) -> CatalogueResult<()> {
        non_empty("name", name)?;

        let db = self.database().await?;
        modify_entry::<DiskSystem, _>(
            db,
            admin,
            EntityType::DiskSystem,
            name,
            Condition::all().add(disk_system::Column::Name.eq(name)),
            vec![(column, value)],
        )
        .await?;

        tracing::info!("Modified {:?} of disk system {} by {}", column, name, admin);

        Ok(())
    }
}

fn disk_system_from_model(model: DiskSystemModel) -> types::DiskSystem {
    types::DiskSystem {
        creation_log: model.creation_log(),
        last_modification_log: model.last_modification_log(),
        name: model.name,
        file_regexp: model.file_regexp,
        free_space_query_url: model.free_space_query_url,
        refresh_interval: model.refresh_interval as u64,
        targeted_free_space: model.targeted_free_space as u64,
        sleep_time: model.sleep_time as u64,
        comment: model.comment,
    }
}
