//! padflash-fetch - Firmware retrieval
//!
//! Two pieces, matching the two halves of the fetch stage:
//!
//! - [`VendorCatalog`] resolves a (model, channel) pair to concrete
//!   releases through the vendor's HTTP API.
//! - [`download_release`] / [`fetch_latest`] stream an image into scratch
//!   storage with an atomic commit, integrity verification, and
//!   cancellation on user interrupt.
//!
//! Failures follow the pipeline taxonomy: `Network` and `Timeout` are
//! transient and may be retried after the caller confirms; `NotAvailable`
//! and `Integrity` are terminal.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod catalog;
pub mod download;

pub use catalog::{VendorCatalog, DEFAULT_BASE_URL};
pub use download::{download_release, fetch_latest, FetchConfig, ProgressFn};
