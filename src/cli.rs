//! CLI argument parsing

use crate::transports;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Generate dynamic help text for the transport argument
fn transport_help() -> String {
    format!(
        "Transport to use [available: {}]",
        transports::transport_names_short()
    )
}

#[derive(Parser)]
#[command(name = "padflash")]
#[command(author, version, about = "Firmware updater for 8BitDo controllers", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Firmware server base URL (defaults to the vendor server)
    #[arg(long, global = true)]
    pub server: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Release selection options shared across commands
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ReleaseArgs {
    /// Controller model name (see `padflash models`); prompts when omitted
    #[arg(short, long)]
    pub model: Option<String>,

    /// Include beta firmware
    #[arg(long)]
    pub beta: bool,

    /// Pick a specific version instead of the newest
    #[arg(long)]
    pub fw_version: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List supported controller models
    Models,

    /// List attached supported controllers
    Devices,

    /// List published firmware for a model
    Releases {
        #[command(flatten)]
        release: ReleaseArgs,
    },

    /// Download firmware without flashing
    Fetch {
        #[command(flatten)]
        release: ReleaseArgs,

        /// Scratch directory for downloads
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Flash a local firmware image
    Flash {
        /// Input image path
        #[arg(short, long)]
        input: PathBuf,

        /// Transport to use
        #[arg(short, long, default_value = "hid", help = transport_help())]
        transport: String,

        /// Device index when several controllers match (see `padflash devices`)
        #[arg(long)]
        device: Option<usize>,

        /// Answer prompts with yes (non-interactive)
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Download the newest firmware and flash it
    Update {
        #[command(flatten)]
        release: ReleaseArgs,

        /// Transport to use
        #[arg(short, long, default_value = "hid", help = transport_help())]
        transport: String,

        /// Device index when several controllers match
        #[arg(long)]
        device: Option<usize>,

        /// Scratch directory for downloads
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Keep the downloaded image after flashing
        #[arg(long)]
        keep: bool,

        /// Answer prompts with yes (non-interactive)
        #[arg(short = 'y', long)]
        yes: bool,
    },
}
