//! Database entities.
//!
//! We use SeaORM and target PostgreSQL (production) and SQLite (development).
//!
//! Counters and sizes are unsigned in the public API but stored as
//! `BIGINT`, which both backends support natively.

/// Implements [`Provenance`] and the entry log accessors for an entity
/// module whose model carries the six standard log columns.
macro_rules! entry_logs {
    () => {
        impl super::Provenance for Entity {
            const CREATION_LOG_USER_NAME: Column = Column::CreationLogUserName;
            const CREATION_LOG_HOST_NAME: Column = Column::CreationLogHostName;
            const CREATION_LOG_TIME: Column = Column::CreationLogTime;
            const LAST_UPDATE_USER_NAME: Column = Column::LastUpdateUserName;
            const LAST_UPDATE_HOST_NAME: Column = Column::LastUpdateHostName;
            const LAST_UPDATE_TIME: Column = Column::LastUpdateTime;
        }

        impl Model {
            /// Returns who created the entry.
            pub fn creation_log(&self) -> ::tapecat::identity::EntryLog {
                ::tapecat::identity::EntryLog {
                    username: self.creation_log_user_name.clone(),
                    host: self.creation_log_host_name.clone(),
                    time: self.creation_log_time,
                }
            }

            /// Returns who last modified the entry.
            pub fn last_modification_log(&self) -> ::tapecat::identity::EntryLog {
                ::tapecat::identity::EntryLog {
                    username: self.last_update_user_name.clone(),
                    host: self.last_update_host_name.clone(),
                    time: self.last_update_time,
                }
            }
        }
    };
}

pub mod activities_fair_share_weight;
pub mod admin_user;
pub mod archive_file;
pub mod archive_file_id;
pub mod archive_route;
pub mod catalogue_schema;
pub mod disk_system;
pub mod file_recycle_log;
pub mod logical_library;
pub mod media_type;
pub mod mount_policy;
pub mod requester_group_mount_rule;
pub mod requester_mount_rule;
pub mod storage_class;
pub mod tape;
pub mod tape_file;
pub mod tape_pool;
pub mod virtual_organization;

use sea_orm::entity::prelude::*;
use sea_orm::entity::Value;
use sea_orm::sea_query::{ArrayType, ColumnType, ValueType, ValueTypeErr};
use sea_orm::{QueryResult, TryGetError, TryGetable};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// An entity whose rows record who created and last modified them.
pub trait Provenance: EntityTrait {
    const CREATION_LOG_USER_NAME: Self::Column;
    const CREATION_LOG_HOST_NAME: Self::Column;
    const CREATION_LOG_TIME: Self::Column;
    const LAST_UPDATE_USER_NAME: Self::Column;
    const LAST_UPDATE_HOST_NAME: Self::Column;
    const LAST_UPDATE_TIME: Self::Column;
}

/// A value that is stored in the database as JSON.
///
/// Used for checksum blobs, which have a variable number of entries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Json<T>(pub T);

impl<T: Serialize + DeserializeOwned> From<Json<T>> for Value {
    fn from(value: Json<T>) -> Self {
        let opt = serde_json::to_string(&value).ok().map(Box::new);

        Value::String(opt)
    }
}

impl<T: Serialize + DeserializeOwned> TryGetable for Json<T> {
    fn try_get_by<I: sea_orm::ColIdx>(res: &QueryResult, idx: I) -> Result<Self, TryGetError> {
        let json_str: String = res.try_get_by(idx).map_err(TryGetError::DbErr)?;

        serde_json::from_str(&json_str).map_err(|e| TryGetError::DbErr(DbErr::Json(e.to_string())))
    }
}

impl<T: Serialize + DeserializeOwned> ValueType for Json<T> {
    fn try_from(v: Value) -> Result<Self, ValueTypeErr> {
        match v {
            Value::String(Some(x)) => Ok(Json(serde_json::from_str(&x).map_err(|_| ValueTypeErr)?)),
            _ => Err(ValueTypeErr),
        }
    }

    fn type_name() -> String {
        stringify!(Json<T>).to_owned()
    }

    fn column_type() -> ColumnType {
        ColumnType::Text
    }

    fn array_type() -> ArrayType {
        ArrayType::String
    }
}
