use anyhow::{anyhow, Result};
use clap::Parser;

use crate::Opts;
use tapecat_catalogue::config::Config;
use tapecat_catalogue::Catalogue;

/// List the tapes of a logical library that can be written to, as JSON.
#[derive(Debug, Parser)]
pub struct TapesForWriting {
    /// The logical library.
    #[clap(long)]
    logical_library: String,
}

pub async fn run(config: Config, opts: Opts) -> Result<()> {
    let sub = opts
        .command
        .as_tapes_for_writing()
        .ok_or_else(|| anyhow!("Not a tapes-for-writing command"))?;

    let catalogue = Catalogue::new(config);
    let tapes = catalogue
        .get_tapes_for_writing(&sub.logical_library)
        .await?;

    println!("{}", serde_json::to_string_pretty(&tapes)?);

    Ok(())
}
