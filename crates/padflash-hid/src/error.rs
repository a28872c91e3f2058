//! Error types for HID transport operations

use thiserror::Error;

/// HID specific errors
#[derive(Debug, Error)]
pub enum HidTransportError {
    /// Failed to initialize the HID backend
    #[error("failed to initialize HID backend: {0}")]
    Init(#[source] hidapi::HidError),

    /// Failed to open a device node
    #[error("failed to open {path}: {source}")]
    Open {
        /// Device node path
        path: String,
        #[source]
        source: hidapi::HidError,
    },

    /// Device path contained an interior NUL byte
    #[error("device path {0:?} is not a valid C string")]
    BadPath(String),

    /// A report write failed
    #[error("HID write failed: {0}")]
    Write(#[source] hidapi::HidError),

    /// A report read failed
    #[error("HID read failed: {0}")]
    Read(#[source] hidapi::HidError),

    /// The device accepted fewer bytes than one full report
    #[error("short report: wrote {wrote} of {expected} bytes")]
    ShortWrite {
        /// Bytes the device accepted
        wrote: usize,
        /// Full report length
        expected: usize,
    },

    /// The device answered with something other than an ack
    #[error("unexpected report {0:#04x} while waiting for ack")]
    UnexpectedReport(u8),
}

impl From<HidTransportError> for padflash_core::Error {
    fn from(e: HidTransportError) -> Self {
        padflash_core::Error::Transport(e.to_string())
    }
}

/// Result type for HID transport operations
pub type Result<T> = std::result::Result<T, HidTransportError>;
