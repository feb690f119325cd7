//! Requester and requester group mount rules.
//!
//! Both kinds of rule are keyed by disk instance and a name, the
//! requester's or the group's, and only differ in that name column.

use sea_orm::entity::prelude::*;
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::ActiveValue::Set;
use sea_orm::{Condition, ConnectionTrait};
use tracing::instrument;

use crate::database::entity::mount_policy::{Entity as MountPolicy, MountPolicyModel};
use crate::database::entity::requester_group_mount_rule::{
    self, Entity as RequesterGroupMountRule,
};
use crate::database::entity::requester_mount_rule::{self, Entity as RequesterMountRule};
use crate::database::entity::Provenance;
use crate::database::{modify_entry, stamp_creation, CatalogueDatabase};
use crate::error::{CatalogueError, CatalogueResult, EntityType};
use crate::types;
use crate::validation::non_empty;
use crate::Catalogue;
use tapecat::identity::{EntryLog, SecurityIdentity};

/// The columns shared by both kinds of mount rule.
trait MountRuleEntity: Provenance {
    const ENTITY_TYPE: EntityType;
    const DISK_INSTANCE: Self::Column;
    const NAME: Self::Column;
    const MOUNT_POLICY_ID: Self::Column;
    const COMMENT: Self::Column;
}

impl MountRuleEntity for RequesterMountRule {
    const ENTITY_TYPE: EntityType = EntityType::RequesterMountRule;
    const DISK_INSTANCE: Self::Column = requester_mount_rule::Column::DiskInstance;
    const NAME: Self::Column = requester_mount_rule::Column::RequesterName;
    const MOUNT_POLICY_ID: Self::Column = requester_mount_rule::Column::MountPolicyId;
    const COMMENT: Self::Column = requester_mount_rule::Column::Comment;
}

impl MountRuleEntity for RequesterGroupMountRule {
    const ENTITY_TYPE: EntityType = EntityType::RequesterGroupMountRule;
    const DISK_INSTANCE: Self::Column = requester_group_mount_rule::Column::DiskInstance;
    const NAME: Self::Column = requester_group_mount_rule::Column::RequesterGroupName;
    const MOUNT_POLICY_ID: Self::Column = requester_group_mount_rule::Column::MountPolicyId;
    const COMMENT: Self::Column = requester_group_mount_rule::Column::Comment;
}

impl Catalogue {
    /// Applies a mount policy to the requests of a requester.
    #[instrument(skip_all, fields(mount_policy = %mount_policy, disk_instance = %disk_instance, requester_name = %requester_name))]
    pub async fn create_requester_mount_rule(
        &self,
        admin: &SecurityIdentity,
        mount_policy: &str,
        disk_instance: &str,
        requester_name: &str,
        comment: &str,
    ) -> CatalogueResult<()> {
        let policy = self
            .prepare_mount_rule::<RequesterMountRule>(
                mount_policy,
                disk_instance,
                requester_name,
                comment,
            )
            .await?;

        let mut model = requester_mount_rule::ActiveModel {
            disk_instance: Set(disk_instance.to_owned()),
            requester_name: Set(requester_name.to_owned()),
            mount_policy_id: Set(policy.id),
            comment: Set(comment.to_owned()),
            ..Default::default()
        };
        stamp_creation(&mut model, &EntryLog::now(admin));

        let key = rule_key(disk_instance, requester_name);
        let db = self.database().await?;
        RequesterMountRule::insert(model)
            .exec(db)
            .await
            .map_err(|e| CatalogueError::from_write(e, EntityType::RequesterMountRule, &key))?;

        tracing::info!(
            "Created requester mount rule {} applying {} by {}",
            key,
            mount_policy,
            admin
        );

        Ok(())
    }

    /// Applies a mount policy to the requests of a requester group.
    #[instrument(skip_all, fields(mount_policy = %mount_policy, disk_instance = %disk_instance, requester_group_name = %requester_group_name))]
    pub async fn create_requester_group_mount_rule(
        &self,
        admin: &SecurityIdentity,
        mount_policy: &str,
        disk_instance: &str,
        requester_group_name: &str,
        comment: &str,
    ) -> CatalogueResult<()> {
        let policy = self
            .prepare_mount_rule::<RequesterGroupMountRule>(
                mount_policy,
                disk_instance,
                requester_group_name,
                comment,
            )
            .await?;

        let mut model = requester_group_mount_rule::ActiveModel {
            disk_instance: Set(disk_instance.to_owned()),
            requester_group_name: Set(requester_group_name.to_owned()),
            mount_policy_id: Set(policy.id),
            comment: Set(comment.to_owned()),
            ..Default::default()
        };
        stamp_creation(&mut model, &EntryLog::now(admin));

        let key = rule_key(disk_instance, requester_group_name);
        let db = self.database().await?;
        RequesterGroupMountRule::insert(model)
            .exec(db)
            .await
            .map_err(|e| {
                CatalogueError::from_write(e, EntityType::RequesterGroupMountRule, &key)
            })?;

        tracing::info!(
            "Created requester group mount rule {} applying {} by {}",
            key,
            mount_policy,
            admin
        );

        Ok(())
    }

    pub async fn delete_requester_mount_rule(
        &self,
        disk_instance: &str,
        requester_name: &str,
    ) -> CatalogueResult<()> {
        self.delete_mount_rule::<RequesterMountRule>(disk_instance, requester_name)
            .await
    }

    pub async fn delete_requester_group_mount_rule(
        &self,
        disk_instance: &str,
        requester_group_name: &str,
    ) -> CatalogueResult<()> {
        self.delete_mount_rule::<RequesterGroupMountRule>(disk_instance, requester_group_name)
            .await
    }

    pub async fn get_requester_mount_rules(&self) -> CatalogueResult<Vec<types::MountRule>> {
        let db = self.database().await?;

        let rules = RequesterMountRule::find()
            .find_also_related(MountPolicy)
            .all(db)
            .await
            .map_err(CatalogueError::database_error)?;

        Ok(rules
            .into_iter()
            .map(|(rule, policy)| types::MountRule {
                creation_log: rule.creation_log(),
                last_modification_log: rule.last_modification_log(),
                disk_instance: rule.disk_instance,
                name: rule.requester_name,
                mount_policy: policy_name(policy),
                comment: rule.comment,
            })
            .collect())
    }

    pub async fn get_requester_group_mount_rules(&self) -> CatalogueResult<Vec<types::MountRule>> {
        let db = self.database().await?;

        let rules = RequesterGroupMountRule::find()
            .find_also_related(MountPolicy)
            .all(db)
            .await
            .map_err(CatalogueError::database_error)?;

        Ok(rules
            .into_iter()
            .map(|(rule, policy)| types::MountRule {
                creation_log: rule.creation_log(),
                last_modification_log: rule.last_modification_log(),
                disk_instance: rule.disk_instance,
                name: rule.requester_group_name,
                mount_policy: policy_name(policy),
                comment: rule.comment,
            })
            .collect())
    }

    pub async fn modify_requester_mount_rule_policy(
        &self,
        admin: &SecurityIdentity,
        disk_instance: &str,
        requester_name: &str,
        mount_policy: &str,
    ) -> CatalogueResult<()> {
        self.modify_mount_rule_policy::<RequesterMountRule>(
            admin,
            disk_instance,
            requester_name,
            mount_policy,
        )
        .await
    }

    pub async fn modify_requester_group_mount_rule_policy(
        &self,
        admin: &SecurityIdentity,
        disk_instance: &str,
        requester_group_name: &str,
        mount_policy: &str,
    ) -> CatalogueResult<()> {
        self.modify_mount_rule_policy::<RequesterGroupMountRule>(
            admin,
            disk_instance,
            requester_group_name,
            mount_policy,
        )
        .await
    }

    pub async fn modify_requester_mount_rule_comment(
        &self,
        admin: &SecurityIdentity,
        disk_instance: &str,
        requester_name: &str,
        comment: &str,
    ) -> CatalogueResult<()> {
        non_empty("comment", comment)?;
        self.modify_mount_rule::<RequesterMountRule>(
            admin,
            disk_instance,
            requester_name,
            RequesterMountRule::COMMENT,
            Expr::value(comment),
        )
        .await
    }

    pub async fn modify_requester_group_mount_rule_comment(
        &self,
        admin: &SecurityIdentity,
        disk_instance: &str,
        requester_group_name: &str,
        comment: &str,
    ) -> CatalogueResult<()> {
        non_empty("comment", comment)?;
        self.modify_mount_rule::<RequesterGroupMountRule>(
            admin,
            disk_instance,
            requester_group_name,
            RequesterGroupMountRule::COMMENT,
            Expr::value(comment),
        )
        .await
    }

    /// Validates a new rule and resolves the mount policy it applies.
    async fn prepare_mount_rule<E: MountRuleEntity>(
        &self,
        mount_policy: &str,
        disk_instance: &str,
        name: &str,
        comment: &str,
    ) -> CatalogueResult<MountPolicyModel> {
        non_empty("mount_policy", mount_policy)?;
        non_empty("disk_instance", disk_instance)?;
        non_empty("name", name)?;
        non_empty("comment", comment)?;

        let key = rule_key(disk_instance, name);
        let db = self.database().await?;

        if find_rule::<E, _>(db, disk_instance, name).await?.is_some() {
            return Err(CatalogueError::already_exists(E::ENTITY_TYPE, key));
        }

        db.find_mount_policy(mount_policy)
            .await
            .map_err(|e| e.referenced_by(E::ENTITY_TYPE, &key))
    }

    #[instrument(skip_all, fields(entity = %E::ENTITY_TYPE, disk_instance = %disk_instance, name = %name))]
    async fn delete_mount_rule<E: MountRuleEntity>(
        &self,
        disk_instance: &str,
        name: &str,
    ) -> CatalogueResult<()> {
        non_empty("disk_instance", disk_instance)?;
        non_empty("name", name)?;

        let key = rule_key(disk_instance, name);
        let db = self.database().await?;

        let deletion = E::delete_many()
            .filter(rule_condition::<E>(disk_instance, name))
            .exec(db)
            .await
            .map_err(CatalogueError::database_error)?;

        if deletion.rows_affected == 0 {
            return Err(CatalogueError::not_found(E::ENTITY_TYPE, key));
        }

        tracing::info!("Deleted {} {}", E::ENTITY_TYPE, key);

        Ok(())
    }

    async fn modify_mount_rule_policy<E: MountRuleEntity>(
        &self,
        admin: &SecurityIdentity,
        disk_instance: &str,
        name: &str,
        mount_policy: &str,
    ) -> CatalogueResult<()> {
        non_empty("mount_policy", mount_policy)?;

        let db = self.database().await?;
        let policy = db
            .find_mount_policy(mount_policy)
            .await
            .map_err(|e| e.referenced_by(E::ENTITY_TYPE, rule_key(disk_instance, name)))?;

        self.modify_mount_rule::<E>(
            admin,
            disk_instance,
            name,
            E::MOUNT_POLICY_ID,
            Expr::value(policy.id),
        )
        .await
    }

    #[instrument(skip_all, fields(entity = %E::ENTITY_TYPE, disk_instance = %disk_instance, name = %name, column = ?column))]
    async fn modify_mount_rule<E: MountRuleEntity>(
        &self,
        admin: &SecurityIdentity,
        disk_instance: &str,
        name: &str,
        column: E::Column,
        value: SimpleExpr,
    ) -> CatalogueResult<()> {
        non_empty("disk_instance", disk_instance)?;
        non_empty("name", name)?;

        let key = rule_key(disk_instance, name);
        let db = self.database().await?;
        modify_entry::<E, _>(
            db,
            admin,
            E::ENTITY_TYPE,
            &key,
            rule_condition::<E>(disk_instance, name),
            vec![(column, value)],
        )
        .await?;

        tracing::info!("Modified {:?} of {} {} by {}", column, E::ENTITY_TYPE, key, admin);

        Ok(())
    }
}

/// Finds the mount policy applied to a requester by a requester rule.
pub(crate) async fn requester_rule_policy<C: ConnectionTrait + Send + Sync>(
    db: &C,
    disk_instance: &str,
    requester_name: &str,
) -> CatalogueResult<Option<MountPolicyModel>> {
    find_rule_policy::<RequesterMountRule, C>(db, disk_instance, requester_name).await
}

/// Finds the mount policy applied to a requester group by a group rule.
pub(crate) async fn group_rule_policy<C: ConnectionTrait + Send + Sync>(
    db: &C,
    disk_instance: &str,
    requester_group_name: &str,
) -> CatalogueResult<Option<MountPolicyModel>> {
    find_rule_policy::<RequesterGroupMountRule, C>(db, disk_instance, requester_group_name).await
}

async fn find_rule_policy<E, C>(
    db: &C,
    disk_instance: &str,
    name: &str,
) -> CatalogueResult<Option<MountPolicyModel>>
where
    E: MountRuleEntity + Related<MountPolicy>,
    C: ConnectionTrait + Send + Sync,
{
    let rule = E::find()
        .filter(rule_condition::<E>(disk_instance, name))
        .find_also_related(MountPolicy)
        .one(db)
        .await
        .map_err(CatalogueError::database_error)?;

    Ok(rule.and_then(|(_, policy)| policy))
}

async fn find_rule<E: MountRuleEntity, C: ConnectionTrait + Send + Sync>(
    db: &C,
    disk_instance: &str,
    name: &str,
) -> CatalogueResult<Option<E::Model>> {
    E::find()
        .filter(rule_condition::<E>(disk_instance, name))
        .one(db)
        .await
        .map_err(CatalogueError::database_error)
}

fn rule_condition<E: MountRuleEntity>(disk_instance: &str, name: &str) -> Condition {
    Condition::all()
        .add(E::DISK_INSTANCE.eq(disk_instance))
        .add(E::NAME.eq(name))
}

fn rule_key(disk_instance: &str, name: &str) -> String {
    format!("{}:{}", disk_instance, name)
}

fn policy_name(policy: Option<MountPolicyModel>) -> String {
    policy.map(|p| p.name).unwrap_or_default()
}
