use anyhow::{anyhow, Result};
use clap::Parser;

use crate::Opts;
use tapecat_catalogue::config::Config;
use tapecat_catalogue::Catalogue;

/// Reclaim a full tape that no longer holds any live file.
///
/// The tape becomes writable again from fSeq 1.
#[derive(Debug, Parser)]
pub struct ReclaimTape {
    /// The VID of the tape.
    #[clap(long)]
    vid: String,
}

pub async fn run(config: Config, opts: Opts) -> Result<()> {
    let sub = opts
        .command
        .as_reclaim_tape()
        .ok_or_else(|| anyhow!("Not a reclaim-tape command"))?;
    let admin = opts.admin()?;

    let catalogue = Catalogue::new(config);
    catalogue.reclaim_tape(&admin, &sub.vid).await?;

    eprintln!("Reclaimed tape {}", sub.vid);

    Ok(())
}
