//! Supported-controller enumeration
//!
//! Scans OS-visible HID devices and hands their raw identities to the
//! core matcher. The `HidApi` handle is dropped before returning, so no
//! probe handle stays open between enumeration and the flasher claiming
//! the device node.

use hidapi::HidApi;
use padflash_core::device::{match_supported, DeviceDescriptor, RawHidDevice};
use padflash_core::Result;

use crate::error::HidTransportError;

/// Enumerate attached controllers that appear in the supported table
pub fn enumerate_supported() -> Result<Vec<DeviceDescriptor>> {
    let api = HidApi::new().map_err(HidTransportError::Init)?;

    let raw: Vec<RawHidDevice> = api
        .device_list()
        .map(|info| RawHidDevice {
            vendor_id: info.vendor_id(),
            product_id: info.product_id(),
            product_string: info.product_string().map(str::to_owned),
            path: info.path().to_string_lossy().into_owned(),
        })
        .collect();

    log::debug!("HID scan saw {} device interface(s)", raw.len());
    Ok(match_supported(raw))
}
