//! Firmware catalog abstraction
//!
//! The vendor's catalog API is deliberately hidden behind a trait so the
//! concrete HTTP client (`padflash-fetch`) can be swapped without touching
//! the orchestration core, and so tests can feed canned release lists.

use std::fmt;

use crate::device::SupportedModel;
use crate::error::Result;

/// Release track for firmware versions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirmwareChannel {
    /// Production releases only
    Stable,
    /// Production plus pre-release builds
    Beta,
}

impl FirmwareChannel {
    /// Whether pre-release builds should be offered
    pub fn includes_beta(self) -> bool {
        matches!(self, FirmwareChannel::Beta)
    }
}

impl fmt::Display for FirmwareChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FirmwareChannel::Stable => write!(f, "stable"),
            FirmwareChannel::Beta => write!(f, "beta"),
        }
    }
}

/// One published firmware build for a model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmwareRelease {
    /// Version string as published (e.g. "1.35")
    pub version: String,
    /// Publication date as published, empty when unknown
    pub date: String,
    /// Declared image size; 0 when the catalog does not state one
    pub size_bytes: u64,
    /// Server-relative download path
    pub remote_path: String,
    /// True for pre-release builds
    pub beta: bool,
    /// Hex-encoded CRC-32 of the image, when the catalog publishes one
    pub checksum: Option<String>,
}

impl FirmwareRelease {
    /// File name component of the remote path, for local storage
    pub fn file_name(&self) -> &str {
        self.remote_path
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or("firmware.bin")
    }
}

/// Capability to resolve a (model, channel) pair to downloadable releases
pub trait FirmwareCatalog {
    /// List releases for a model on a channel, newest first.
    ///
    /// Fails with `NotAvailable` when the catalog has nothing for the
    /// pair, and `Network`/`Timeout` on transport trouble.
    fn releases(
        &self,
        model: &SupportedModel,
        channel: FirmwareChannel,
    ) -> Result<Vec<FirmwareRelease>>;

    /// Absolute download URL for a release
    fn download_url(&self, release: &FirmwareRelease) -> String;
}
