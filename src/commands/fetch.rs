//! Download firmware without flashing

use std::path::PathBuf;

use padflash_core::catalog::FirmwareCatalog;
use padflash_fetch::{download_release, FetchConfig};

use crate::cli::ReleaseArgs;

use super::progress::DownloadBar;
use super::{
    cancel_token, catalog_for, channel_from_flag, print_releases, select_model, select_release,
    with_fetch_retry, CliResult,
};

pub fn run(args: &ReleaseArgs, dir: Option<PathBuf>, server: Option<&str>) -> CliResult<()> {
    let model = select_model(args.model.as_deref())?;
    let channel = channel_from_flag(args.beta);
    let catalog = catalog_for(server)?;

    println!("Fetching firmware list for {}...", model.name);
    let releases = with_fetch_retry(false, || catalog.releases(model, channel))?;
    print_releases(&releases);

    let release = select_release(&releases, args.fw_version.as_deref(), false)?;

    let mut config = FetchConfig::default();
    if let Some(dir) = dir {
        config.scratch_dir = dir;
    }

    let artifact = with_fetch_retry(false, || {
        let mut bar = DownloadBar::new();
        let result = download_release(
            &catalog,
            release,
            &config,
            cancel_token(),
            &mut |got, total| bar.update(got, total),
        );
        bar.finish(if result.is_ok() {
            "Download complete"
        } else {
            "Download failed"
        });
        result
    })?;

    println!(
        "Downloaded {} ({} bytes) to {}",
        release.version,
        artifact.size_bytes,
        artifact.local_path.display()
    );
    println!("Flash it with: padflash flash --input {}", artifact.local_path.display());
    Ok(())
}
