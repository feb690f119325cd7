mod command;

use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use enum_as_inner::EnumAsInner;
use tracing_error::ErrorLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use command::check_config::{self, CheckConfig};
use command::db_migrations::{self, DbMigrations};
use command::list_tapes::{self, ListTapes};
use command::ping::{self, Ping};
use command::reclaim_tape::{self, ReclaimTape};
use command::schema_version::{self, SchemaVersion};
use command::tape_file_summary::{self, TapeFileSummary};
use command::tapes_for_writing::{self, TapesForWriting};
use tapecat::identity::SecurityIdentity;
use tapecat_catalogue::config;

/// Tape catalogue administration utilities.
#[derive(Debug, Parser)]
#[clap(version)]
#[clap(propagate_version = true)]
pub struct Opts {
    /// Path to the config file.
    #[clap(short = 'f', long)]
    config: Option<PathBuf>,

    /// The administrator to record in the entry logs.
    ///
    /// Defaults to $USER.
    #[clap(long)]
    admin_user: Option<String>,

    /// The host to record in the entry logs.
    ///
    /// Defaults to $HOSTNAME, or "localhost" if it isn't set.
    #[clap(long)]
    admin_host: Option<String>,

    /// The sub-command.
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, EnumAsInner)]
pub enum Command {
    DbMigrations(DbMigrations),
    CheckConfig(CheckConfig),
    Ping(Ping),
    SchemaVersion(SchemaVersion),
    ListTapes(ListTapes),
    TapesForWriting(TapesForWriting),
    ReclaimTape(ReclaimTape),
    TapeFileSummary(TapeFileSummary),
}

impl Opts {
    /// Returns the identity mutating commands act as.
    pub fn admin(&self) -> Result<SecurityIdentity> {
        let username = match &self.admin_user {
            Some(user) => user.clone(),
            None => env::var("USER")
                .map_err(|_| anyhow!("$USER is not set, pass --admin-user"))?,
        };

        let host = self
            .admin_host
            .clone()
            .or_else(|| env::var("HOSTNAME").ok())
            .unwrap_or_else(|| "localhost".to_string());

        Ok(SecurityIdentity::new(username, host))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let opts = Opts::parse();
    let config = config::load_config(opts.config.as_deref())?;

    match opts.command {
        Command::DbMigrations(_) => db_migrations::run(config, opts).await?,
        Command::CheckConfig(_) => check_config::run(config, opts).await?,
        Command::Ping(_) => ping::run(config, opts).await?,
        Command::SchemaVersion(_) => schema_version::run(config, opts).await?,
        Command::ListTapes(_) => list_tapes::run(config, opts).await?,
        Command::TapesForWriting(_) => tapes_for_writing::run(config, opts).await?,
        Command::ReclaimTape(_) => reclaim_tape::run(config, opts).await?,
        Command::TapeFileSummary(_) => tape_file_summary::run(config, opts).await?,
    }

    Ok(())
}

fn init_logging() {
    let env_filter = EnvFilter::from_default_env();
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(env_filter);

    let error_layer = ErrorLayer::default();

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(error_layer)
        .init();
}
