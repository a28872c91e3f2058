//! Downloaded firmware artifacts

use std::path::PathBuf;

/// A firmware image committed to local scratch storage.
///
/// Created by the fetcher only after the transfer completed and passed its
/// integrity checks; partial downloads never become artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmwareArtifact {
    /// Where the image was downloaded from
    pub source_url: String,
    /// Committed location inside the scratch directory
    pub local_path: PathBuf,
    /// Size on disk
    pub size_bytes: u64,
    /// Hex-encoded CRC-32 the catalog declared, if any
    pub checksum: Option<String>,
}

impl FirmwareArtifact {
    /// Read the full image into memory for flashing
    pub fn read_image(&self) -> std::io::Result<Vec<u8>> {
        std::fs::read(&self.local_path)
    }

    /// Best-effort cleanup of the local file.
    ///
    /// Failing to delete is logged and swallowed; this is housekeeping,
    /// not correctness.
    pub fn remove(self) {
        if !self.local_path.exists() {
            return;
        }
        match std::fs::remove_file(&self.local_path) {
            Ok(()) => log::info!("removed {}", self.local_path.display()),
            Err(e) => log::warn!("failed to remove {}: {}", self.local_path.display(), e),
        }
    }
}
