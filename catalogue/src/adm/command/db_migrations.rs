use anyhow::Result;
use clap::Parser;

use crate::Opts;
use tapecat_catalogue::config::Config;

/// Run pending database migrations.
#[derive(Debug, Parser)]
pub struct DbMigrations {}

pub async fn run(config: Config, _opts: Opts) -> Result<()> {
    tapecat_catalogue::run_migrations(config).await
}
