use anyhow::Result;
use clap::Parser;

use crate::Opts;
use tapecat_catalogue::config::Config;
use tapecat_catalogue::Catalogue;

/// Print the version of the catalogue schema.
#[derive(Debug, Parser)]
pub struct SchemaVersion {}

pub async fn run(config: Config, _opts: Opts) -> Result<()> {
    let catalogue = Catalogue::new(config);
    let version = catalogue.get_schema_version().await?;

    println!("{}.{}", version.major, version.minor);

    Ok(())
}
