//! padflash - Firmware updater for 8BitDo game controllers
//!
//! Detects supported controllers over USB/HID, downloads firmware from
//! the vendor's catalog, and flashes it to the device.
//!
//! # Architecture
//!
//! The pipeline is strictly sequential: locate -> fetch -> flash ->
//! cleanup. The CLI here is thin glue; the stages live in:
//! - `padflash-core` - device table, session state machine, flash engine
//! - `padflash-fetch` - catalog client and artifact downloader
//! - `padflash-hid` / `padflash-dummy` - transports behind the
//!   `DeviceTransport` trait, so the same engine drives real hardware
//!   and the in-memory emulator

mod cli;
mod commands;
mod transports;

use clap::Parser;
use cli::{Cli, Commands};
use commands::update::UpdateArgs;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    commands::install_sigint_handler();

    let server = cli.server.as_deref();

    match cli.command {
        Commands::Models => {
            commands::list::models();
            Ok(())
        }
        Commands::Devices => commands::list::devices(),
        Commands::Releases { release } => commands::releases::run(&release, server),
        Commands::Fetch { release, dir } => commands::fetch::run(&release, dir, server),
        Commands::Flash {
            input,
            transport,
            device,
            yes,
        } => commands::flash::run(&input, &transport, device, yes),
        Commands::Update {
            release,
            transport,
            device,
            dir,
            keep,
            yes,
        } => commands::update::run(UpdateArgs {
            release: &release,
            transport: &transport,
            device,
            dir,
            keep,
            yes,
            server,
        }),
    }
}
