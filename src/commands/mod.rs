//! Command implementations and shared interactive helpers

pub mod fetch;
pub mod flash;
pub mod list;
pub mod progress;
pub mod releases;
pub mod update;

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use padflash_core::cancel::CancelToken;
use padflash_core::catalog::{FirmwareChannel, FirmwareRelease};
use padflash_core::device::{find_model, locate_one, DeviceDescriptor, SupportedModel, MODELS};
use padflash_core::Error;
use padflash_fetch::VendorCatalog;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

// ============================================================================
// SIGINT -> CancelToken
// ============================================================================

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

extern "C" fn handle_sigint(_signum: libc::c_int) {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

/// Route Ctrl-C into the cancel token polled by downloads.
///
/// Flashing deliberately does not poll the token: breaking off mid-write
/// leaves the controller half-programmed.
pub fn install_sigint_handler() {
    let handler = handle_sigint as extern "C" fn(libc::c_int);
    unsafe {
        libc::signal(libc::SIGINT, handler as libc::sighandler_t);
    }
}

/// Token observed by long-running downloads
pub fn cancel_token() -> CancelToken {
    CancelToken::new(&INTERRUPTED)
}

// ============================================================================
// Interactive helpers
// ============================================================================

/// Prompt on stdout and read one trimmed line
pub(crate) fn prompt_line(prompt: &str) -> CliResult<String> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut line = String::new();
    match io::stdin().read_line(&mut line) {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::Interrupted => return Err(Error::Cancelled.into()),
        Err(e) => return Err(e.into()),
    }
    if INTERRUPTED.load(Ordering::SeqCst) {
        return Err(Error::Cancelled.into());
    }
    Ok(line.trim().to_string())
}

/// Yes/no question; `assume_yes` short-circuits for non-interactive runs
pub(crate) fn confirm(question: &str, assume_yes: bool) -> CliResult<bool> {
    if assume_yes {
        return Ok(true);
    }
    let answer = prompt_line(&format!("{} (y/n): ", question))?;
    Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
}

/// Read a 1-based selection below `count`
pub(crate) fn choose_index(count: usize, prompt: &str) -> CliResult<usize> {
    loop {
        let answer = prompt_line(prompt)?;
        match answer.parse::<usize>() {
            Ok(n) if n >= 1 && n <= count => return Ok(n - 1),
            _ => println!("Invalid selection. Please try again."),
        }
    }
}

/// Resolve a model argument, or run the numbered menu from the table
pub(crate) fn select_model(arg: Option<&str>) -> CliResult<&'static SupportedModel> {
    if let Some(name) = arg {
        return find_model(name).ok_or_else(|| {
            format!(
                "Unknown model: {} (run `padflash models` for the supported list)",
                name
            )
            .into()
        });
    }

    println!("Supported controllers:\n");
    for (i, model) in MODELS.iter().enumerate() {
        println!("  {:2}. {}", i + 1, model.name);
    }
    println!();

    let index = choose_index(MODELS.len(), "Enter the number of your controller: ")?;
    Ok(&MODELS[index])
}

/// Print a numbered release listing
pub(crate) fn print_releases(releases: &[FirmwareRelease]) {
    println!("\nAvailable firmware versions:\n");
    for (i, fw) in releases.iter().enumerate() {
        let beta = if fw.beta { " (BETA)" } else { "" };
        println!(
            "  {:2}. Version {} - {} ({:.1} KB){}",
            i + 1,
            fw.version,
            if fw.date.is_empty() { "unknown date" } else { fw.date.as_str() },
            fw.size_bytes as f64 / 1024.0,
            beta
        );
    }
}

/// Pick a release by version argument, menu, or newest-first default
pub(crate) fn select_release<'a>(
    releases: &'a [FirmwareRelease],
    wanted: Option<&str>,
    assume_yes: bool,
) -> CliResult<&'a FirmwareRelease> {
    if let Some(version) = wanted {
        return releases
            .iter()
            .find(|r| r.version == version)
            .ok_or_else(|| format!("Version {} is not in the catalog", version).into());
    }

    // Newest first; non-interactive runs take it without asking
    if assume_yes {
        return Ok(&releases[0]);
    }

    let index = choose_index(
        releases.len(),
        "\nEnter the number of the firmware to use: ",
    )?;
    Ok(&releases[index])
}

/// Apply the ambiguity policy: one match passes through, several need an
/// explicit pick (`--device` or the interactive menu), zero is an error
pub(crate) fn select_device(
    mut matches: Vec<DeviceDescriptor>,
    index: Option<usize>,
    assume_yes: bool,
) -> CliResult<DeviceDescriptor> {
    if let Some(i) = index {
        if matches.is_empty() {
            return Err(Error::DeviceNotFound.into());
        }
        if i >= matches.len() {
            return Err(format!(
                "--device {} is out of range ({} controllers attached)",
                i,
                matches.len()
            )
            .into());
        }
        return Ok(matches.remove(i));
    }

    match locate_one(matches.clone()) {
        Ok(device) => Ok(device),
        Err(Error::DeviceAmbiguous { count }) if !assume_yes => {
            println!("\nSeveral supported controllers are attached:\n");
            for (i, d) in matches.iter().enumerate() {
                println!(
                    "  {:2}. {} (PID {:04X}) at {}",
                    i + 1,
                    d.display_name,
                    d.product_id,
                    d.path
                );
            }
            let picked = choose_index(count, "\nEnter the number of the controller to flash: ")?;
            Ok(matches.remove(picked))
        }
        Err(e) => Err(e.into()),
    }
}

/// Enumerate attached supported controllers via the HID backend
pub(crate) fn enumerate_devices() -> CliResult<Vec<DeviceDescriptor>> {
    #[cfg(feature = "hid")]
    {
        Ok(padflash_hid::enumerate_supported()?)
    }
    #[cfg(not(feature = "hid"))]
    {
        Err("HID support not compiled in (rebuild with the `hid` feature)".into())
    }
}

/// Build the catalog client, honoring a `--server` override
pub(crate) fn catalog_for(server: Option<&str>) -> CliResult<VendorCatalog> {
    let catalog = match server {
        Some(base) => VendorCatalog::with_base_url(base)?,
        None => VendorCatalog::new()?,
    };
    Ok(catalog)
}

/// Channel selection from the `--beta` flag
pub(crate) fn channel_from_flag(beta: bool) -> FirmwareChannel {
    if beta {
        FirmwareChannel::Beta
    } else {
        FirmwareChannel::Stable
    }
}

/// Run a fetch-side operation, offering a confirmed retry on transient
/// failures. Terminal failures and non-interactive runs fail straight
/// through.
pub(crate) fn with_fetch_retry<T>(
    assume_yes: bool,
    mut operation: impl FnMut() -> padflash_core::Result<T>,
) -> CliResult<T> {
    loop {
        match operation() {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && !assume_yes => {
                eprintln!("{}", e);
                if !confirm("That looks transient. Retry?", false)? {
                    return Err(e.into());
                }
            }
            Err(e) => return Err(e.into()),
        }
    }
}
