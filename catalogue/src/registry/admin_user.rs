use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::ActiveValue::Set;
use sea_orm::Condition;
use tracing::instrument;

use crate::database::entity::admin_user::{self, AdminUserModel, Entity as AdminUser};
use crate::database::{modify_entry, stamp_creation};
use crate::error::{CatalogueError, CatalogueResult, EntityType};
use crate::types;
use crate::validation::non_empty;
use crate::Catalogue;
use tapecat::identity::{EntryLog, SecurityIdentity};

impl Catalogue {
    #[instrument(skip_all, fields(name = %name))]
    pub async fn create_admin_user(
        &self,
        admin: &SecurityIdentity,
        name: &str,
        comment: &str,
    ) -> CatalogueResult<()> {
        non_empty("name", name)?;
        non_empty("comment", comment)?;

        let db = self.database().await?;

        let existing = AdminUser::find()
            .filter(admin_user::Column::Name.eq(name))
            .one(db)
            .await
            .map_err(CatalogueError::database_error)?;

        if existing.is_some() {
            return Err(CatalogueError::already_exists(EntityType::AdminUser, name));
        }

        let mut model = admin_user::ActiveModel {
            name: Set(name.to_owned()),
            comment: Set(comment.to_owned()),
            ..Default::default()
        };
        stamp_creation(&mut model, &EntryLog::now(admin));

        AdminUser::insert(model)
            .exec(db)
            .await
            .map_err(|e| CatalogueError::from_write(e, EntityType::AdminUser, name))?;

        tracing::info!("Created admin user {} by {}", name, admin);

        Ok(())
    }

    #[instrument(skip_all, fields(name = %name))]
    pub async fn delete_admin_user(&self, name: &str) -> CatalogueResult<()> {
        non_empty("name", name)?;

        let db = self.database().await?;

        let deletion = AdminUser::delete_many()
            .filter(admin_user::Column::Name.eq(name))
            .exec(db)
            .await
            .map_err(CatalogueError::database_error)?;

        if deletion.rows_affected == 0 {
            return Err(CatalogueError::not_found(EntityType::AdminUser, name));
        }

        tracing::info!("Deleted admin user {}", name);

        Ok(())
    }

    pub async fn get_admin_users(&self) -> CatalogueResult<Vec<types::AdminUser>> {
        let db = self.database().await?;

        let users = AdminUser::find()
            .all(db)
            .await
            .map_err(CatalogueError::database_error)?;

        Ok(users.into_iter().map(admin_user_from_model).collect())
    }

    #[instrument(skip_all, fields(name = %name))]
    pub async fn modify_admin_user_comment(
        &self,
        admin: &SecurityIdentity,
        name: &str,
        comment: &str,
    ) -> CatalogueResult<()> {
        non_empty("name", name)?;
        non_empty("comment", comment)?;

        let db = self.database().await?;
        modify_entry::<AdminUser, _>(
            db,
            admin,
            EntityType::AdminUser,
            name,
            Condition::all().add(admin_user::Column::Name.eq(name)),
            vec![(admin_user::Column::Comment, Expr::value(comment))],
        )
        .await?;

        tracing::info!("Modified comment of admin user {} by {}", name, admin);

        Ok(())
    }

    /// Returns whether the identity is that of a registered administrator.
    pub async fn is_admin(&self, admin: &SecurityIdentity) -> CatalogueResult<bool> {
        let db = self.database().await?;

        let user = AdminUser::find()
            .filter(admin_user::Column::Name.eq(admin.username.as_str()))
            .one(db)
            .await
            .map_err(CatalogueError::database_error)?;

        Ok(user.is_some())
    }
}

fn admin_user_from_model(model: AdminUserModel) -> types::AdminUser {
    types::AdminUser {
        creation_log: model.creation_log(),
        last_modification_log: model.last_modification_log(),
        name: model.name,
        comment: model.comment,
    }
}
