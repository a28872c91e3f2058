//! Supported controller table and device matching
//!
//! The locator is split in two: OS-level HID enumeration lives in
//! `padflash-hid`, while the matching against the supported-model table is
//! pure code here so it can be exercised without hardware.

use crate::error::{Error, Result};

/// USB vendor id shared by all supported controllers
pub const VENDOR_ID: u16 = 0x2DC8;

/// One entry of the static supported-model table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupportedModel {
    /// Human-readable model name
    pub name: &'static str,
    /// Selector code the firmware catalog uses for this model
    pub api_type: u16,
    /// Known product ids, bootloader mode included
    pub product_ids: &'static [u16],
}

impl SupportedModel {
    /// Whether this model answers to the given (vendor, product) pair
    pub fn matches(&self, vendor_id: u16, product_id: u16) -> bool {
        vendor_id == VENDOR_ID && self.product_ids.contains(&product_id)
    }
}

/// Supported controllers, sorted by display name
pub static MODELS: &[SupportedModel] = &[
    SupportedModel { name: "Arcade Stick", api_type: 34, product_ids: &[0x5100] },
    SupportedModel { name: "Arcade Stick Receiver", api_type: 35, product_ids: &[0x5101] },
    SupportedModel { name: "F30 Arcade Stick", api_type: 5, product_ids: &[0x1005] },
    SupportedModel { name: "F30 GamePad", api_type: 2, product_ids: &[0x1002] },
    SupportedModel { name: "F30 Pro", api_type: 1, product_ids: &[0x9000] },
    SupportedModel { name: "Lite GamePad", api_type: 28, product_ids: &[0x3001] },
    SupportedModel { name: "M30", api_type: 23, product_ids: &[0x5006] },
    SupportedModel { name: "N30 GamePad", api_type: 2, product_ids: &[0x1003] },
    SupportedModel { name: "N30 NS GamePad", api_type: 18, product_ids: &[0x2012] },
    SupportedModel { name: "N30 Pro", api_type: 1, product_ids: &[0x9001] },
    SupportedModel { name: "N30 Pro 2", api_type: 13, product_ids: &[0x6002] },
    SupportedModel { name: "Pro 2", api_type: 33, product_ids: &[0x6003] },
    SupportedModel { name: "Pro 2 Wired", api_type: 37, product_ids: &[0x3106] },
    SupportedModel { name: "SF30 Pro", api_type: 9, product_ids: &[0x6001] },
    SupportedModel { name: "SN30 GamePad", api_type: 3, product_ids: &[0x2003] },
    SupportedModel { name: "SN30 Pro", api_type: 9, product_ids: &[0x6000] },
    SupportedModel { name: "SN30 Pro+", api_type: 25, product_ids: &[0x6101] },
];

/// Look up a model by display name (case-insensitive)
pub fn find_model(name: &str) -> Option<&'static SupportedModel> {
    MODELS.iter().find(|m| m.name.eq_ignore_ascii_case(name))
}

/// An attached controller we know how to update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    /// USB vendor id
    pub vendor_id: u16,
    /// USB product id
    pub product_id: u16,
    /// Model name from the table, or the device-reported product string
    pub display_name: String,
    /// Opaque OS device node, used later to open an exclusive handle
    pub path: String,
}

impl DeviceDescriptor {
    /// The supported-model entry this descriptor was matched against
    pub fn model(&self) -> Option<&'static SupportedModel> {
        MODELS
            .iter()
            .find(|m| m.matches(self.vendor_id, self.product_id))
    }
}

/// Raw identity of an OS-visible HID device, decoupled from the HID
/// backend so matching stays testable
#[derive(Debug, Clone)]
pub struct RawHidDevice {
    /// USB vendor id
    pub vendor_id: u16,
    /// USB product id
    pub product_id: u16,
    /// Device-reported product string, if any
    pub product_string: Option<String>,
    /// OS device node path
    pub path: String,
}

/// Filter an enumeration down to supported controllers.
///
/// Unsupported (vendor, product) pairs are dropped; duplicate paths (a
/// gamepad exposing several HID interfaces on one node) collapse to one
/// descriptor.
pub fn match_supported<I>(devices: I) -> Vec<DeviceDescriptor>
where
    I: IntoIterator<Item = RawHidDevice>,
{
    let mut found: Vec<DeviceDescriptor> = Vec::new();

    for raw in devices {
        let Some(model) = MODELS
            .iter()
            .find(|m| m.matches(raw.vendor_id, raw.product_id))
        else {
            continue;
        };

        if found.iter().any(|d| d.path == raw.path) {
            continue;
        }

        let display_name = raw
            .product_string
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| model.name.to_string());

        log::debug!(
            "matched {} at {} (VID={:04X} PID={:04X})",
            display_name,
            raw.path,
            raw.vendor_id,
            raw.product_id
        );

        found.push(DeviceDescriptor {
            vendor_id: raw.vendor_id,
            product_id: raw.product_id,
            display_name,
            path: raw.path,
        });
    }

    found
}

/// Reduce a match set to the single device the pipeline will flash.
///
/// Zero matches is a cabling/permissions problem the user has to fix, so
/// it is never retried here. More than one match is surfaced as
/// [`Error::DeviceAmbiguous`] rather than picking the first hit; the CLI
/// turns that into an explicit selection step.
pub fn locate_one(mut matches: Vec<DeviceDescriptor>) -> Result<DeviceDescriptor> {
    match matches.len() {
        0 => Err(Error::DeviceNotFound),
        1 => Ok(matches.remove(0)),
        count => Err(Error::DeviceAmbiguous { count }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(vid: u16, pid: u16, path: &str) -> RawHidDevice {
        RawHidDevice {
            vendor_id: vid,
            product_id: pid,
            product_string: None,
            path: path.to_string(),
        }
    }

    #[test]
    fn supported_pairs_match_exactly() {
        let devices = vec![
            raw(VENDOR_ID, 0x6000, "/dev/hidraw0"), // SN30 Pro
            raw(0x054C, 0x09CC, "/dev/hidraw1"),    // unsupported vendor
            raw(VENDOR_ID, 0xFFFF, "/dev/hidraw2"), // unsupported product
        ];

        let matches = match_supported(devices);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].product_id, 0x6000);
        assert_eq!(matches[0].display_name, "SN30 Pro");
        assert_eq!(matches[0].model().unwrap().api_type, 9);
    }

    #[test]
    fn duplicate_paths_collapse() {
        let devices = vec![
            raw(VENDOR_ID, 0x6000, "/dev/hidraw0"),
            raw(VENDOR_ID, 0x6000, "/dev/hidraw0"),
        ];
        assert_eq!(match_supported(devices).len(), 1);
    }

    #[test]
    fn product_string_wins_over_table_name() {
        let mut device = raw(VENDOR_ID, 0x6003, "/dev/hidraw4");
        device.product_string = Some("8BitDo Pro 2".to_string());
        let matches = match_supported(vec![device]);
        assert_eq!(matches[0].display_name, "8BitDo Pro 2");
    }

    #[test]
    fn locate_one_policy() {
        assert!(matches!(locate_one(vec![]), Err(Error::DeviceNotFound)));

        let one = match_supported(vec![raw(VENDOR_ID, 0x5006, "/dev/hidraw0")]);
        assert_eq!(locate_one(one).unwrap().display_name, "M30");

        let two = match_supported(vec![
            raw(VENDOR_ID, 0x5006, "/dev/hidraw0"),
            raw(VENDOR_ID, 0x6000, "/dev/hidraw1"),
        ]);
        assert!(matches!(
            locate_one(two),
            Err(Error::DeviceAmbiguous { count: 2 })
        ));
    }

    #[test]
    fn find_model_is_case_insensitive() {
        assert!(find_model("sn30 pro").is_some());
        assert!(find_model("SN30 PRO+").is_some());
        assert!(find_model("PS5 DualSense").is_none());
    }
}
