//! The full pipeline: locate, fetch, flash, clean up

use std::path::PathBuf;

use padflash_core::catalog::FirmwareCatalog;
use padflash_core::flash::{flash_artifact, FlashConfig};
use padflash_core::session::FlashSession;
use padflash_core::Error;
use padflash_fetch::{download_release, FetchConfig};

use crate::cli::ReleaseArgs;
use crate::transports;

use super::progress::{DownloadBar, FlashBar};
use super::{
    cancel_token, catalog_for, channel_from_flag, confirm, enumerate_devices, print_releases,
    prompt_line, select_device, select_model, select_release, with_fetch_retry, CliResult,
};

pub struct UpdateArgs<'a> {
    pub release: &'a ReleaseArgs,
    pub transport: &'a str,
    pub device: Option<usize>,
    pub dir: Option<PathBuf>,
    pub keep: bool,
    pub yes: bool,
    pub server: Option<&'a str>,
}

pub fn run(args: UpdateArgs<'_>) -> CliResult<()> {
    let needs_device = transports::needs_real_device(args.transport);

    // Cheap presence check before touching the network: no controller on
    // the bus means no amount of downloading will help
    if needs_device && enumerate_devices()?.is_empty() {
        return Err(Error::DeviceNotFound.into());
    }

    let model = select_model(args.release.model.as_deref())?;
    println!("Selected: {}", model.name);

    let channel = channel_from_flag(args.release.beta);
    let catalog = catalog_for(args.server)?;

    println!("Fetching firmware list for {}...", model.name);
    let releases = with_fetch_retry(args.yes, || catalog.releases(model, channel))?;
    print_releases(&releases);

    let release = select_release(&releases, args.release.fw_version.as_deref(), args.yes)?;
    println!("\nUsing version {} ({})", release.version, channel);

    let mut config = FetchConfig::default();
    if let Some(dir) = args.dir {
        config.scratch_dir = dir;
    }

    let artifact = with_fetch_retry(args.yes, || {
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

    println!("Downloaded {}", artifact.local_path.display());

    if needs_device {
        print_bootloader_instructions();
        if !args.yes {
            prompt_line("Press Enter when ready... ")?;
        }
    }

    let descriptor = if needs_device {
        select_device(enumerate_devices()?, args.device, args.yes)?
    } else {
        transports::emulated_descriptor()
    };

    println!(
        "\nTarget: {} (VID {:04X} PID {:04X})",
        descriptor.display_name, descriptor.vendor_id, descriptor.product_id
    );

    if !confirm("Proceed with firmware update?", args.yes)? {
        println!("Update cancelled.");
        println!("Firmware image kept at {}", artifact.local_path.display());
        return Ok(());
    }

    let mut session = FlashSession::new(descriptor, artifact)?;
    let image = session.artifact().read_image()?;
    let mut transport = transports::open_transport(args.transport, session.device())?;

    println!("Do not disconnect the controller while flashing.");
    let outcome = flash_artifact(
        &mut session,
        &mut transport,
        &image,
        &FlashConfig::default(),
        &mut FlashBar::new(),
    );

    let artifact = session.into_artifact();
    match outcome {
        Ok(report) => {
            println!("Firmware update completed ({} bytes written).", report.bytes_written);
            println!("The controller may restart on its own; otherwise unplug and replug it.");

            if args.keep {
                println!("Firmware image kept at {}", artifact.local_path.display());
            } else if confirm("Delete the downloaded firmware image?", args.yes)? {
                artifact.remove();
            } else {
                println!("Firmware image kept at {}", artifact.local_path.display());
            }
            Ok(())
        }
        Err(e) => {
            // Keep the image so a deliberate retry does not re-download;
            // the retry itself must be a fresh, confirmed invocation
            eprintln!(
                "Firmware image kept at {} for a retry.",
                artifact.local_path.display()
            );
            Err(e.into())
        }
    }
}

fn print_bootloader_instructions() {
    println!();
    println!("============================================================");
    println!("  Put the controller in bootloader mode:");
    println!("    1. Hold L1 + R1 + START for 3 seconds");
    println!("    2. The status LED blinks RED");
    println!("    3. Connect the controller via USB cable");
    println!("============================================================");
}
