//! Flash a local firmware image

use std::path::Path;

use padflash_core::artifact::FirmwareArtifact;
use padflash_core::flash::{flash_artifact, FlashConfig};
use padflash_core::session::FlashSession;

use crate::transports;

use super::progress::FlashBar;
use super::{confirm, enumerate_devices, select_device, CliResult};

pub fn run(
    input: &Path,
    transport_spec: &str,
    device_index: Option<usize>,
    assume_yes: bool,
) -> CliResult<()> {
    let image = std::fs::read(input)?;
    println!("Read {} bytes from {:?}", image.len(), input);

    let descriptor = if transports::needs_real_device(transport_spec) {
        select_device(enumerate_devices()?, device_index, assume_yes)?
    } else {
        transports::emulated_descriptor()
    };

    println!(
        "Target: {} (VID {:04X} PID {:04X})",
        descriptor.display_name, descriptor.vendor_id, descriptor.product_id
    );

    if !confirm("Proceed with firmware update?", assume_yes)? {
        println!("Update cancelled.");
        return Ok(());
    }

    let artifact = FirmwareArtifact {
        source_url: format!("file://{}", input.display()),
        local_path: input.to_path_buf(),
        size_bytes: image.len() as u64,
        checksum: None,
    };
    let mut session = FlashSession::new(descriptor, artifact)?;

    // Open the exclusive handle only now, after the user committed
    let mut transport = transports::open_transport(transport_spec, session.device())?;

    println!("Do not disconnect the controller while flashing.");
    let report = flash_artifact(
        &mut session,
        &mut transport,
        &image,
        &FlashConfig::default(),
        &mut FlashBar::new(),
    )?;

    println!(
        "Flashed {} bytes in {} chunks (crc32 {:08x}).",
        report.bytes_written, report.chunks, report.crc32
    );
    println!("The controller may restart on its own; otherwise unplug and replug it.");
    Ok(())
}
