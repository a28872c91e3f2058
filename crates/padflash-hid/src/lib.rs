//! padflash-hid - USB/HID device access
//!
//! Two concerns live here: finding supported controllers among the
//! OS-visible HID devices, and the report-framed transport used to push
//! firmware to a controller in bootloader mode.
//!
//! # System Requirements
//!
//! - hidapi system library (`libhidapi-dev` on Debian/Ubuntu)
//! - Read/write access to the controller's hidraw node; a udev rule for
//!   vendor id 2dc8 or running as root

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod enumerate;
pub mod error;
pub mod transport;

pub use enumerate::enumerate_supported;
pub use error::HidTransportError;
pub use transport::{HidTransport, DATA_PAYLOAD_LEN, REPORT_LEN};
