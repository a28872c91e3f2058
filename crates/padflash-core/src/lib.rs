//! padflash-core - Orchestration core for controller firmware updates
//!
//! This crate holds everything about the update pipeline that is not tied
//! to a concrete transport or network client: the supported-device table
//! and locator matching, the firmware catalog and device transport
//! capability traits, the per-invocation flash session, and the chunked
//! flash engine with device-side verification.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    CLI (bin/padflash)                   │
//! │  menus, prompts, progress rendering                     │
//! └─────────────────────────────────────────────────────────┘
//!                  │                          │
//!                  ▼                          ▼
//! ┌───────────────────────────┐  ┌───────────────────────────┐
//! │   padflash-fetch          │  │  Transport crates         │
//! │ - FirmwareCatalog impl    │  │  - padflash-hid (real)    │
//! │ - artifact downloader     │  │  - padflash-dummy (test)  │
//! └───────────────────────────┘  └───────────────────────────┘
//!                  │                          │
//!                  └──────────┬───────────────┘
//!                             ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │              padflash-core (this crate)                 │
//! │  device table + matching, FlashSession, flash engine,   │
//! │  error taxonomy, cancellation                           │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! The pipeline is strictly sequential: locate, fetch, flash, clean up.
//! Nothing here spawns threads or holds more than one device handle.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod artifact;
pub mod cancel;
pub mod catalog;
pub mod device;
pub mod error;
pub mod flash;
pub mod session;
pub mod transport;

pub use artifact::FirmwareArtifact;
pub use cancel::CancelToken;
pub use catalog::{FirmwareCatalog, FirmwareChannel, FirmwareRelease};
pub use device::{DeviceDescriptor, SupportedModel, MODELS, VENDOR_ID};
pub use error::{Error, Result};
pub use flash::{flash_artifact, FlashConfig, FlashProgress, FlashReport, NoProgress};
pub use session::{FlashSession, SessionState};
pub use transport::{DeviceTransport, TransferStatus};
