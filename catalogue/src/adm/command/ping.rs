use anyhow::Result;
use clap::Parser;

use crate::Opts;
use tapecat_catalogue::config::Config;
use tapecat_catalogue::Catalogue;

/// Check that the database is reachable.
#[derive(Debug, Parser)]
pub struct Ping {}

pub async fn run(config: Config, _opts: Opts) -> Result<()> {
    let catalogue = Catalogue::new(config);
    catalogue.ping().await?;

    println!("OK");

    Ok(())
}
