//! The tape catalogue.
//!
//! The authoritative record of the administrative entities of a tape
//! storage service and of every archived file and its tape copies.
//! All operations go through [`Catalogue`].

#![deny(
    asm_sub_register,
    deprecated,
    missing_abi,
    unsafe_code,
    unused_macros,
    unused_must_use,
    unused_unsafe
)]
#![deny(clippy::from_over_into, clippy::needless_question_mark)]
#![cfg_attr(
    not(debug_assertions),
    deny(unused_imports, unused_mut, unused_variables,)
)]

pub mod archive_file;
pub mod config;
pub mod database;
pub mod error;
mod ingest;
mod lifecycle;
mod queue;
mod recycle_log;
mod registry;
pub mod types;
pub mod validation;

#[cfg(test)]
mod tests;

use anyhow::Result;
use sea_orm::{query::Statement, ConnectionTrait, Database, DatabaseConnection, EntityTrait};
use tokio::sync::OnceCell;
use tracing::instrument;

use config::Config;
use database::entity::catalogue_schema::Entity as CatalogueSchema;
use database::migration::{Migrator, MigratorTrait};
use types::SchemaVersion;

pub use archive_file::ArchiveFileStream;
pub use recycle_log::{FileRecycleLogStream, DELETED_FROM_DISK_INSTANCE};
pub use error::{CatalogueError, CatalogueResult, EntityType, ErrorKind};

/// The catalogue.
///
/// Holds no state of its own besides the connection pool, so any number
/// of instances, in any number of processes, may share one database.
#[derive(Debug)]
pub struct Catalogue {
    /// The catalogue configuration.
    config: Config,

    /// Handle to the database.
    database: OnceCell<DatabaseConnection>,
}

impl Catalogue {
    /// Creates a catalogue that connects on first use.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            database: OnceCell::new(),
        }
    }

    /// Creates a catalogue on top of an existing connection.
    pub fn with_connection(config: Config, database: DatabaseConnection) -> Self {
        Self {
            config,
            database: OnceCell::from(database),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns a handle to the database.
    pub async fn database(&self) -> CatalogueResult<&DatabaseConnection> {
        self.database
            .get_or_try_init(|| async {
                Database::connect(self.config.database.connect_options())
                    .await
                    .map_err(CatalogueError::database_error)
            })
            .await
    }

    /// Brings the schema up to date.
    #[instrument(skip_all)]
    pub async fn run_migrations(&self) -> CatalogueResult<()> {
        let db = self.database().await?;
        Migrator::up(db, None)
            .await
            .map_err(CatalogueError::database_error)
    }

    /// Makes one round-trip to the database.
    pub async fn ping(&self) -> CatalogueResult<()> {
        let db = self.database().await?;
        let stmt = Statement::from_string(db.get_database_backend(), "SELECT 1;".to_string());

        db.execute(stmt)
            .await
            .map_err(CatalogueError::database_error)?;

        Ok(())
    }

    /// Returns the version of the schema in the database.
    pub async fn get_schema_version(&self) -> CatalogueResult<SchemaVersion> {
        let db = self.database().await?;
        let schema = CatalogueSchema::find()
            .one(db)
            .await
            .map_err(CatalogueError::database_error)?
            .ok_or_else(|| CatalogueError::user_error("The catalogue schema is not initialized"))?;

        Ok(SchemaVersion {
            major: schema.schema_version_major as u32,
            minor: schema.schema_version_minor as u32,
        })
    }
}

/// Runs database migrations.
pub async fn run_migrations(config: Config) -> Result<()> {
    eprintln!("Running migrations...");

    let catalogue = Catalogue::new(config);
    catalogue.run_migrations().await?;

    eprintln!("Completed migrations");

    Ok(())
}
