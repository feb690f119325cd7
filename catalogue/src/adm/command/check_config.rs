use anyhow::Result;
use clap::Parser;

use crate::Opts;
use tapecat_catalogue::config::Config;

/// Load and print the configuration.
///
/// The database URL is never printed.
#[derive(Debug, Parser)]
pub struct CheckConfig {}

pub async fn run(config: Config, _opts: Opts) -> Result<()> {
    eprintln!("Configuration is valid");
    println!("{:#?}", config);

    Ok(())
}
