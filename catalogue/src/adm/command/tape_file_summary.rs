use anyhow::{anyhow, Result};
use clap::Parser;

use crate::Opts;
use tapecat_catalogue::config::Config;
use tapecat_catalogue::types::TapeFileSearchCriteria;
use tapecat_catalogue::Catalogue;

/// Print the number and total size of the live tape copies matching the criteria.
#[derive(Debug, Parser)]
pub struct TapeFileSummary {
    /// Only count copies on this tape.
    #[clap(long)]
    vid: Option<String>,

    /// Only count files of this disk instance.
    #[clap(long)]
    disk_instance: Option<String>,
}

pub async fn run(config: Config, opts: Opts) -> Result<()> {
    let sub = opts
        .command
        .as_tape_file_summary()
        .ok_or_else(|| anyhow!("Not a tape-file-summary command"))?;

    let criteria = TapeFileSearchCriteria {
        vid: sub.vid.clone(),
        disk_instance: sub.disk_instance.clone(),
        ..Default::default()
    };

    let catalogue = Catalogue::new(config);
    let summary = catalogue.get_tape_file_summary(&criteria).await?;

    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
