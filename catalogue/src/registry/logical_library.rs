use sea_orm::entity::prelude::*;
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::ActiveValue::Set;
use sea_orm::{Condition, PaginatorTrait};
use tracing::instrument;

use crate::database::entity::logical_library::{
    self, Entity as LogicalLibrary, LogicalLibraryModel,
};
use crate::database::entity::tape::{self, Entity as Tape};
use crate::database::{exists, modify_entry, stamp_creation, update_entry, CatalogueDatabase};
use crate::error::{CatalogueError, CatalogueResult, EntityType};
use crate::types;
use crate::validation::non_empty;
use crate::Catalogue;
use tapecat::identity::{EntryLog, SecurityIdentity};

impl Catalogue {
    #[instrument(skip_all, fields(name = %name))]
    pub async fn create_logical_library(
        &self,
        admin: &SecurityIdentity,
        name: &str,
        is_disabled: bool,
        comment: &str,
    ) -> CatalogueResult<()> {
        non_empty("name", name)?;
        non_empty("comment", comment)?;

        let db = self.database().await?;

        if exists(db.find_logical_library(name).await)? {
            return Err(CatalogueError::already_exists(
                EntityType::LogicalLibrary,
                name,
            ));
        }

        let mut model = logical_library::ActiveModel {
            name: Set(name.to_owned()),
            is_disabled: Set(is_disabled),
            comment: Set(comment.to_owned()),
            ..Default::default()
        };
        stamp_creation(&mut model, &EntryLog::now(admin));

        LogicalLibrary::insert(model)
            .exec(db)
            .await
            .map_err(|e| CatalogueError::from_write(e, EntityType::LogicalLibrary, name))?;

        tracing::info!("Created logical library {} by {}", name, admin);

        Ok(())
    }

    /// Deletes a logical library that contains no tapes.
    #[instrument(skip_all, fields(name = %name))]
    pub async fn delete_logical_library(&self, name: &str) -> CatalogueResult<()> {
        non_empty("name", name)?;

        let db = self.database().await?;
        let library = db.find_logical_library(name).await?;

        let nb_tapes = Tape::find()
            .filter(tape::Column::LogicalLibraryId.eq(library.id))
            .count(db)
            .await
            .map_err(CatalogueError::database_error)?;

        if nb_tapes != 0 {
            return Err(CatalogueError::NotEmpty {
                entity: EntityType::LogicalLibrary,
                key: name.to_owned(),
                reason: format!("it contains {} tapes", nb_tapes),
            });
        }

        LogicalLibrary::delete_by_id(library.id)
            .exec(db)
            .await
            .map_err(CatalogueError::database_error)?;

        tracing::info!("Deleted logical library {}", name);

        Ok(())
    }

    pub async fn get_logical_libraries(&self) -> CatalogueResult<Vec<types::LogicalLibrary>> {
        let db = self.database().await?;

        let libraries = LogicalLibrary::find()
            .all(db)
            .await
            .map_err(CatalogueError::database_error)?;

        Ok(libraries.into_iter().map(library_from_model).collect())
    }

    #[instrument(skip_all, fields(current_name = %current_name, new_name = %new_name))]
    pub async fn modify_logical_library_name(
        &self,
        admin: &SecurityIdentity,
        current_name: &str,
        new_name: &str,
    ) -> CatalogueResult<()> {
        non_empty("current_name", current_name)?;
        non_empty("new_name", new_name)?;

        let db = self.database().await?;

        if current_name != new_name && exists(db.find_logical_library(new_name).await)? {
            return Err(CatalogueError::already_exists(
                EntityType::LogicalLibrary,
                new_name,
            ));
        }

        let updated = update_entry::<LogicalLibrary, _>(
            db,
            admin,
            Condition::all().add(logical_library::Column::Name.eq(current_name)),
            vec![(logical_library::Column::Name, Expr::value(new_name))],
        )
        .await
        .map_err(|e| CatalogueError::from_write(e, EntityType::LogicalLibrary, new_name))?;

        if updated == 0 {
            return Err(CatalogueError::not_found(
                EntityType::LogicalLibrary,
                current_name,
            ));
        }

        tracing::info!(
            "Renamed logical library {} to {} by {}",
            current_name,
            new_name,
            admin
        );

        Ok(())
    }

    pub async fn modify_logical_library_comment(
        &self,
        admin: &SecurityIdentity,
        name: &str,
        comment: &str,
    ) -> CatalogueResult<()> {
        non_empty("comment", comment)?;
        self.modify_logical_library(
            admin,
            name,
            logical_library::Column::Comment,
            Expr::value(comment),
        )
        .await
    }

    pub async fn set_logical_library_disabled(
        &self,
        admin: &SecurityIdentity,
        name: &str,
        disabled: bool,
    ) -> CatalogueResult<()> {
        self.modify_logical_library(
            admin,
            name,
            logical_library::Column::IsDisabled,
            Expr::value(disabled),
        )
        .await
    }

    #[instrument(skip_all, fields(name = %name, column = ?column))]
    async fn modify_logical_library(
        &self,
        admin: &SecurityIdentity,
        name: &str,
        column: logical_library::Column,
        value: SimpleExpr,
    ) -> CatalogueResult<()> {
        non_empty("name", name)?;

        let db = self.database().await?;
        modify_entry::<LogicalLibrary, _>(
            db,
            admin,
            EntityType::LogicalLibrary,
            name,
            Condition::all().add(logical_library::Column::Name.eq(name)),
            vec![(column, value)],
        )
        .await?;

        tracing::info!(
            "Modified {:?} of logical library {} by {}",
            column,
            name,
            admin
        );

        Ok(())
    }
}

fn library_from_model(model: LogicalLibraryModel) -> types::LogicalLibrary {
    types::LogicalLibrary {
        creation_log: model.creation_log(),
        last_modification_log: model.last_modification_log(),
        name: model.name,
        is_disabled: model.is_disabled,
        comment: model.comment,
    }
}
