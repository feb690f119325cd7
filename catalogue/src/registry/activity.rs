use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::ActiveValue::Set;
use sea_orm::{Condition, ConnectionTrait};
use tracing::instrument;

use crate::database::entity::activities_fair_share_weight::{
    self, ActivitiesFairShareWeightModel, Entity as ActivitiesFairShareWeight,
};
use crate::database::{modify_entry, stamp_creation};
use crate::error::{CatalogueError, CatalogueResult, EntityType};
use crate::types;
use crate::validation::{fair_share_weight, non_empty};
use crate::Catalogue;
use tapecat::identity::{EntryLog, SecurityIdentity};

impl Catalogue {
    /// Sets the fair share weight of a retrieve activity.
    #[instrument(skip_all, fields(disk_instance = %disk_instance, activity = %activity, weight = %weight))]
    pub async fn create_activities_fair_share_weight(
        &self,
        admin: &SecurityIdentity,
        disk_instance: &str,
        activity: &str,
        weight: f64,
        comment: &str,
    ) -> CatalogueResult<()> {
        non_empty("disk_instance", disk_instance)?;
        non_empty("activity", activity)?;
        fair_share_weight(weight)?;
        non_empty("comment", comment)?;

        let key = activity_key(disk_instance, activity);
        let db = self.database().await?;

        if find_weight(db, disk_instance, activity).await?.is_some() {
            return Err(CatalogueError::already_exists(
                EntityType::ActivityFairShareWeight,
                key,
            ));
        }

        let mut model = activities_fair_share_weight::ActiveModel {
            disk_instance: Set(disk_instance.to_owned()),
            activity: Set(activity.to_owned()),
            weight: Set(weight),
            comment: Set(comment.to_owned()),
            ..Default::default()
        };
        stamp_creation(&mut model, &EntryLog::now(admin));

        ActivitiesFairShareWeight::insert(model)
            .exec(db)
            .await
            .map_err(|e| {
                CatalogueError::from_write(e, EntityType::ActivityFairShareWeight, &key)
            })?;

        tracing::info!("Set fair share weight of {} to {} by {}", key, weight, admin);

        Ok(())
    }

    /// Changes the fair share weight of a retrieve activity.
    #[instrument(skip_all, fields(disk_instance = %disk_instance, activity = %activity, weight = %weight))]
    pub async fn modify_activities_fair_share_weight(
        &self,
        admin: &SecurityIdentity,
        disk_instance: &str,
        activity: &str,
        weight: f64,
        comment: &str,
    ) -> CatalogueResult<()> {
        non_empty("disk_instance", disk_instance)?;
        non_empty("activity", activity)?;
        fair_share_weight(weight)?;
        non_empty("comment", comment)?;

        let key = activity_key(disk_instance, activity);
        let db = self.database().await?;

        modify_entry::<ActivitiesFairShareWeight, _>(
            db,
            admin,
            EntityType::ActivityFairShareWeight,
            &key,
            activity_condition(disk_instance, activity),
            vec![
                (
                    activities_fair_share_weight::Column::Weight,
                    Expr::value(weight),
                ),
                (
                    activities_fair_share_weight::Column::Comment,
                    Expr::value(comment),
                ),
            ],
        )
        .await?;

        tracing::info!("Set fair share weight of {} to {} by {}", key, weight, admin);

        Ok(())
    }

    #[instrument(skip_all, fields(disk_instance = %disk_instance, activity = %activity))]
    pub async fn delete_activities_fair_share_weight(
        &self,
        disk_instance: &str,
        activity: &str,
    ) -> CatalogueResult<()> {
        non_empty("disk_instance", disk_instance)?;
        non_empty("activity", activity)?;

        let key = activity_key(disk_instance, activity);
        let db = self.database().await?;

        let deletion = ActivitiesFairShareWeight::delete_many()
            .filter(activity_condition(disk_instance, activity))
            .exec(db)
            .await
            .map_err(CatalogueError::database_error)?;

        if deletion.rows_affected == 0 {
            return Err(CatalogueError::not_found(
                EntityType::ActivityFairShareWeight,
                key,
            ));
        }

        tracing::info!("Deleted fair share weight of {}", key);

        Ok(())
    }

    pub async fn get_activities_fair_share_weights(
        &self,
    ) -> CatalogueResult<Vec<types::ActivityFairShareWeight>> {
        let db = self.database().await?;

        let weights = ActivitiesFairShareWeight::find()
            .all(db)
            .await
            .map_err(CatalogueError::database_error)?;

        Ok(weights.into_iter().map(weight_from_model).collect())
    }
}

/// Finds the fair share weight of an activity, if one is configured.
pub(crate) async fn find_weight<C: ConnectionTrait + Send + Sync>(
    db: &C,
    disk_instance: &str,
    activity: &str,
) -> CatalogueResult<Option<ActivitiesFairShareWeightModel>> {
    ActivitiesFairShareWeight::find()
        .filter(activity_condition(disk_instance, activity))
        .one(db)
        .await
        .map_err(CatalogueError::database_error)
}

fn activity_condition(disk_instance: &str, activity: &str) -> Condition {
    Condition::all()
        .add(activities_fair_share_weight::Column::DiskInstance.eq(disk_instance))
        .add(activities_fair_share_weight::Column::Activity.eq(activity))
}

fn activity_key(disk_instance: &str, activity: &str) -> String {
    format!("{}:{}", disk_instance, activity)
}

fn weight_from_model(model: ActivitiesFairShareWeightModel) -> types::ActivityFairShareWeight {
    types::ActivityFairShareWeight {
        creation_log: model.creation_log(),
        last_modification_log: model.last_modification_log(),
        disk_instance: model.disk_instance,
        activity: model.activity,
        weight: model.weight,
        comment: model.comment,
    }
}
