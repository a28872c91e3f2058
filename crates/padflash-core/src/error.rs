//! Error types shared across the padflash crates

use std::time::Duration;

use thiserror::Error;

use crate::catalog::FirmwareChannel;

/// Top-level error type for the update pipeline
#[derive(Debug, Error)]
pub enum Error {
    /// No supported controller is attached (or visible to this user)
    #[error(
        "no supported controller found; check the USB cable, permissions, \
         and that the pad is in bootloader mode"
    )]
    DeviceNotFound,

    /// More than one supported controller is attached; the caller must
    /// pick one explicitly instead of us guessing
    #[error("{count} supported controllers attached; select one with --device")]
    DeviceAmbiguous {
        /// Number of matching controllers
        count: usize,
    },

    /// Talking to the firmware server failed
    #[error("network error talking to the firmware server: {0}")]
    Network(String),

    /// The catalog has nothing published for this model/channel
    #[error("no {channel} firmware published for {model}")]
    NotAvailable {
        /// Model display name
        model: String,
        /// Requested release channel
        channel: FirmwareChannel,
    },

    /// A downloaded image failed its size or checksum check
    #[error("firmware image failed integrity check: {0}")]
    Integrity(String),

    /// I/O failed while data was in flight to the controller. The device
    /// state is indeterminate; it must be power cycled before any retry.
    #[error(
        "flash I/O failed at offset {offset:#x}: {reason} \
         (power cycle the controller before retrying)"
    )]
    FlashIo {
        /// Byte offset of the chunk that failed
        offset: u64,
        /// Underlying failure description
        reason: String,
    },

    /// A bounded wait elapsed without the peer responding
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// The user interrupted a long-running operation
    #[error("cancelled")]
    Cancelled,

    /// Opening or driving a transport failed outside an active transfer
    #[error("transport error: {0}")]
    Transport(String),

    /// Local filesystem trouble (scratch directory, temp files)
    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the caller may offer a confirmed retry of a *fetch-side*
    /// failure. Flash failures are never retried through this predicate:
    /// the flasher reports them as [`Error::FlashIo`] or a terminal
    /// [`Error::Timeout`] after the session has already moved to Failed,
    /// and a retry there requires a fresh, explicitly confirmed run.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Network(_) | Error::Timeout(_))
    }
}

/// Result type alias using the pipeline error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(Error::Network("reset by peer".into()).is_transient());
        assert!(Error::Timeout(Duration::from_secs(10)).is_transient());

        assert!(!Error::DeviceNotFound.is_transient());
        assert!(!Error::Integrity("short file".into()).is_transient());
        assert!(!Error::FlashIo {
            offset: 0x40,
            reason: "report dropped".into()
        }
        .is_transient());
        assert!(!Error::Cancelled.is_transient());
    }
}
