use anyhow::{anyhow, Result};
use clap::Parser;

use crate::Opts;
use tapecat_catalogue::config::Config;
use tapecat_catalogue::types::TapeSearchCriteria;
use tapecat_catalogue::Catalogue;

/// List tapes as JSON.
///
/// For example, to list the full tapes of the pool `ctaprod`:
///
/// $ tapecatadm list-tapes --tape-pool ctaprod --full true
#[derive(Debug, Parser)]
pub struct ListTapes {
    /// Only list the tape with this VID.
    #[clap(long)]
    vid: Option<String>,

    /// Only list tapes in this tape pool.
    #[clap(long)]
    tape_pool: Option<String>,

    /// Only list tapes in this logical library.
    #[clap(long)]
    logical_library: Option<String>,

    /// Only list tapes of this virtual organization.
    #[clap(long)]
    vo: Option<String>,

    /// Only list tapes that are full, or not full.
    #[clap(long)]
    full: Option<bool>,

    /// Only list tapes that are disabled, or enabled.
    #[clap(long)]
    disabled: Option<bool>,
}

pub async fn run(config: Config, opts: Opts) -> Result<()> {
    let sub = opts
        .command
        .as_list_tapes()
        .ok_or_else(|| anyhow!("Not a list-tapes command"))?;

    let criteria = TapeSearchCriteria {
        vid: sub.vid.clone(),
        tape_pool: sub.tape_pool.clone(),
        logical_library: sub.logical_library.clone(),
        vo: sub.vo.clone(),
        full: sub.full,
        disabled: sub.disabled,
        ..Default::default()
    };

    let catalogue = Catalogue::new(config);
    let tapes = catalogue.get_tapes(&criteria).await?;

    println!("{}", serde_json::to_string_pretty(&tapes)?);

    Ok(())
}
