//! List published firmware for a model

use crate::cli::ReleaseArgs;

use super::{
    catalog_for, channel_from_flag, print_releases, select_model, with_fetch_retry, CliResult,
};
use padflash_core::catalog::FirmwareCatalog;

pub fn run(args: &ReleaseArgs, server: Option<&str>) -> CliResult<()> {
    let model = select_model(args.model.as_deref())?;
    let channel = channel_from_flag(args.beta);
    let catalog = catalog_for(server)?;

    println!("Fetching firmware list for {}...", model.name);
    let releases = with_fetch_retry(false, || catalog.releases(model, channel))?;
    print_releases(&releases);
    Ok(())
}
