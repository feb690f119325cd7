use sea_orm::entity::prelude::*;
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::ActiveValue::Set;
use sea_orm::{Condition, PaginatorTrait};
use tracing::instrument;

use crate::database::entity::mount_policy::{self, Entity as MountPolicy, MountPolicyModel};
use crate::database::entity::requester_group_mount_rule::{
    self, Entity as RequesterGroupMountRule,
};
use crate::database::entity::requester_mount_rule::{self, Entity as RequesterMountRule};
use crate::database::{exists, modify_entry, stamp_creation, CatalogueDatabase};
use crate::error::{CatalogueError, CatalogueResult, EntityType};
use crate::types::{self, CreateMountPolicy};
use crate::validation::{db_int, non_empty};
use crate::Catalogue;
use tapecat::identity::{EntryLog, SecurityIdentity};

impl Catalogue {
    #[instrument(skip_all, fields(name = %policy.name))]
    pub async fn create_mount_policy(
        &self,
        admin: &SecurityIdentity,
        policy: &CreateMountPolicy,
    ) -> CatalogueResult<()> {
        non_empty("name", &policy.name)?;
        non_empty("comment", &policy.comment)?;
        let archive_priority = db_int("archive_priority", policy.archive_priority)?;
        let archive_min_request_age =
            db_int("archive_min_request_age", policy.archive_min_request_age)?;
        let retrieve_priority = db_int("retrieve_priority", policy.retrieve_priority)?;
        let retrieve_min_request_age =
            db_int("retrieve_min_request_age", policy.retrieve_min_request_age)?;
        let max_drives_allowed = db_int("max_drives_allowed", policy.max_drives_allowed)?;

        let db = self.database().await?;

        if exists(db.find_mount_policy(&policy.name).await)? {
            return Err(CatalogueError::already_exists(
                EntityType::MountPolicy,
                &policy.name,
            ));
        }

        let mut model = mount_policy::ActiveModel {
            name: Set(policy.name.clone()),
            archive_priority: Set(archive_priority),
            archive_min_request_age: Set(archive_min_request_age),
            retrieve_priority: Set(retrieve_priority),
            retrieve_min_request_age: Set(retrieve_min_request_age),
            max_drives_allowed: Set(max_drives_allowed),
            comment: Set(policy.comment.clone()),
            ..Default::default()
        };
        stamp_creation(&mut model, &EntryLog::now(admin));

        MountPolicy::insert(model)
            .exec(db)
            .await
            .map_err(|e| CatalogueError::from_write(e, EntityType::MountPolicy, &policy.name))?;

        tracing::info!("Created mount policy {} by {}", policy.name, admin);

        Ok(())
    }

    /// Deletes a mount policy that no mount rule applies.
    #[instrument(skip_all, fields(name = %name))]
    pub async fn delete_mount_policy(&self, name: &str) -> CatalogueResult<()> {
        non_empty("name", name)?;

        let db = self.database().await?;
        let policy = db.find_mount_policy(name).await?;

        let nb_requester_rules = RequesterMountRule::find()
            .filter(requester_mount_rule::Column::MountPolicyId.eq(policy.id))
            .count(db)
            .await
            .map_err(CatalogueError::database_error)?;
        let nb_group_rules = RequesterGroupMountRule::find()
            .filter(requester_group_mount_rule::Column::MountPolicyId.eq(policy.id))
            .count(db)
            .await
            .map_err(CatalogueError::database_error)?;

        if nb_requester_rules + nb_group_rules != 0 {
            return Err(CatalogueError::InUse {
                entity: EntityType::MountPolicy,
                key: name.to_owned(),
                reason: format!(
                    "{} requester rules and {} requester group rules apply it",
                    nb_requester_rules, nb_group_rules
                ),
            });
        }

        MountPolicy::delete_by_id(policy.id)
            .exec(db)
            .await
            .map_err(CatalogueError::database_error)?;

        tracing::info!("Deleted mount policy {}", name);

        Ok(())
    }

    pub async fn get_mount_policies(&self) -> CatalogueResult<Vec<types::MountPolicy>> {
        let db = self.database().await?;

        let policies = MountPolicy::find()
            .all(db)
            .await
            .map_err(CatalogueError::database_error)?;

        Ok(policies.into_iter().map(mount_policy_from_model).collect())
    }

    pub async fn modify_mount_policy_archive_priority(
        &self,
        admin: &SecurityIdentity,
        name: &str,
        archive_priority: u64,
    ) -> CatalogueResult<()> {
        let value = db_int("archive_priority", archive_priority)?;
        self.modify_mount_policy(
            admin,
            name,
            mount_policy::Column::ArchivePriority,
            Expr::value(value),
        )
        .await
    }

    pub async fn modify_mount_policy_archive_min_request_age(
        &self,
        admin: &SecurityIdentity,
        name: &str,
        min_request_age: u64,
    ) -> CatalogueResult<()> {
        let value = db_int("archive_min_request_age", min_request_age)?;
        self.modify_mount_policy(
            admin,
            name,
            mount_policy::Column::ArchiveMinRequestAge,
            Expr::value(value),
        )
        .await
    }

    pub async fn modify_mount_policy_retrieve_priority(
        &self,
        admin: &SecurityIdentity,
        name: &str,
        retrieve_priority: u64,
    ) -> CatalogueResult<()> {
        let value = db_int("retrieve_priority", retrieve_priority)?;
        self.modify_mount_policy(
            admin,
            name,
            mount_policy::Column::RetrievePriority,
            Expr::value(value),
        )
        .await
    }

    pub async fn modify_mount_policy_retrieve_min_request_age(
        &self,
        admin: &SecurityIdentity,
        name: &str,
        min_request_age: u64,
    ) -> CatalogueResult<()> {
        let value = db_int("retrieve_min_request_age", min_request_age)?;
        self.modify_mount_policy(
            admin,
            name,
            mount_policy::Column::RetrieveMinRequestAge,
            Expr::value(value),
        )
        .await
    }

    pub async fn modify_mount_policy_max_drives_allowed(
        &self,
        admin: &SecurityIdentity,
        name: &str,
        max_drives_allowed: u64,
    ) -> CatalogueResult<()> {
        let value = db_int("max_drives_allowed", max_drives_allowed)?;
        self.modify_mount_policy(
            admin,
            name,
            mount_policy::Column::MaxDrivesAllowed,
            Expr::value(value),
        )
        .await
    }

    pub async fn modify_mount_policy_comment(
        &self,
        admin: &SecurityIdentity,
        name: &str,
        comment: &str,
    ) -> CatalogueResult<()> {
        non_empty("comment", comment)?;
        self.modify_mount_policy(
            admin,
            name,
            mount_policy::Column::Comment,
            Expr::value(comment),
        )
        .await
    }

    #[instrument(skip_all, fields(name = %name, column = ?column))]
    async fn modify_mount_policy(
        &self,
        admin: &SecurityIdentity,
        name: &str,
        column: mount_policy::Column,
        value: SimpleExpr,
    ) -> CatalogueResult<()> {
        non_empty("name", name)?;

        let db = self.database().await?;
        modify_entry::<MountPolicy, _>(
            db,
            admin,
            EntityType::MountPolicy,
            name,
            Condition::all().add(mount_policy::Column::Name.eq(name)),
            vec![(column, value)],
        )
        .await?;

        tracing::info!("Modified {:?} of mount policy {} by {}", column, name, admin);

        Ok(())
    }
}

pub(crate) fn mount_policy_from_model(model: MountPolicyModel) -> types::MountPolicy {
    types::MountPolicy {
        creation_log: model.creation_log(),
        last_modification_log: model.last_modification_log(),
        name: model.name,
        archive_priority: model.archive_priority as u64,
        archive_min_request_age: model.archive_min_request_age as u64,
        retrieve_priority: model.retrieve_priority as u64,
        retrieve_min_request_age: model.retrieve_min_request_age as u64,
        max_drives_allowed: model.max_drives_allowed as u64,
        comment: model.comment,
    }
}
