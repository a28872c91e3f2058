//! Model table and attached-device listings

use padflash_core::device::MODELS;

use super::{enumerate_devices, CliResult};

/// `padflash models`
pub fn models() {
    println!("Supported controllers:\n");
    for model in MODELS {
        let pids: Vec<String> = model
            .product_ids
            .iter()
            .map(|pid| format!("{:04X}", pid))
            .collect();
        println!(
            "  {:22} VID 2DC8, PID {}  (catalog type {})",
            model.name,
            pids.join("/"),
            model.api_type
        );
    }
}

/// `padflash devices`
pub fn devices() -> CliResult<()> {
    let found = enumerate_devices()?;

    if found.is_empty() {
        println!("No supported controllers attached.");
        println!("If yours is plugged in, check hidraw permissions and bootloader mode.");
        return Ok(());
    }

    println!("Attached controllers:\n");
    for (i, d) in found.iter().enumerate() {
        println!(
            "  {:2}. {} (VID {:04X} PID {:04X}) at {}",
            i,
            d.display_name,
            d.vendor_id,
            d.product_id,
            d.path
        );
    }
    println!("\nUse --device <n> to pick one when several are attached.");
    Ok(())
}
