//! Transport registry
//!
//! Opens transports by name and hides the concrete crates from the
//! command implementations. Transport strings follow the
//! `name:key1=value1,key2=value2` convention.

use std::collections::HashMap;

use padflash_core::device::DeviceDescriptor;
use padflash_core::transport::DeviceTransport;

/// Information about a transport
pub struct TransportInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Short description
    pub description: &'static str,
}

/// Get information about all transports enabled at compile time
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_transports() -> Vec<TransportInfo> {
    let mut transports = Vec::new();

    #[cfg(feature = "hid")]
    transports.push(TransportInfo {
        name: "hid",
        description: "USB HID report transport (requires hidraw access)",
    });

    #[cfg(feature = "dummy")]
    transports.push(TransportInfo {
        name: "dummy",
        description: "In-memory bootloader emulator (chunk=<n>,capacity=<n>)",
    });

    transports
}

/// Generate a short list of transport names for CLI help
pub fn transport_names_short() -> String {
    let transports = available_transports();
    if transports.is_empty() {
        return "none (recompile with features)".to_string();
    }
    let names: Vec<&str> = transports.iter().map(|t| t.name).collect();
    names.join(", ")
}

/// Parsed transport parameters
pub struct TransportParams {
    /// Transport name (canonical)
    pub name: String,
    /// Key-value parameters
    pub params: HashMap<String, String>,
}

/// Parse a transport string into name and parameters
///
/// Format: "name" or "name:key1=value1,key2=value2"
pub fn parse_transport_params(s: &str) -> Result<TransportParams, Box<dyn std::error::Error>> {
    let (name, opts_str) = s.split_once(':').unwrap_or((s, ""));

    let mut params = HashMap::new();
    if !opts_str.is_empty() {
        for opt in opts_str.split(',') {
            if let Some((key, value)) = opt.split_once('=') {
                params.insert(key.to_string(), value.to_string());
            } else {
                return Err(
                    format!("Invalid parameter format: '{}' (expected key=value)", opt).into(),
                );
            }
        }
    }

    Ok(TransportParams {
        name: name.to_string(),
        params,
    })
}

/// Whether this transport flashes a physical controller.
///
/// The dummy transport needs no attached device; commands skip
/// enumeration and use a placeholder descriptor instead.
pub fn needs_real_device(spec: &str) -> bool {
    match parse_transport_params(spec) {
        Ok(params) => params.name != "dummy",
        Err(_) => true,
    }
}

/// Placeholder descriptor for transports that emulate the device
pub fn emulated_descriptor() -> DeviceDescriptor {
    DeviceDescriptor {
        vendor_id: padflash_core::VENDOR_ID,
        product_id: 0x6000,
        display_name: "Emulated SN30 Pro".to_string(),
        path: "dummy".to_string(),
    }
}

/// Open a transport on a located device
pub fn open_transport(
    spec: &str,
    descriptor: &DeviceDescriptor,
) -> Result<Box<dyn DeviceTransport>, Box<dyn std::error::Error>> {
    let params = parse_transport_params(spec)?;

    match params.name.as_str() {
        #[cfg(feature = "hid")]
        "hid" => open_hid(descriptor),

        #[cfg(feature = "dummy")]
        "dummy" => open_dummy(&params),

        _ => Err(format!("Unknown transport: {}", params.name).into()),
    }
}

#[cfg(feature = "hid")]
fn open_hid(
    descriptor: &DeviceDescriptor,
) -> Result<Box<dyn DeviceTransport>, Box<dyn std::error::Error>> {
    log::info!("Opening HID transport...");

    let transport = padflash_hid::HidTransport::open(descriptor).map_err(|e| {
        format!(
            "Failed to open {}: {}\nMake sure the controller is connected, in bootloader mode, \
             and that you have hidraw permissions.",
            descriptor.path, e
        )
    })?;

    Ok(Box::new(transport))
}

#[cfg(feature = "dummy")]
fn open_dummy(
    params: &TransportParams,
) -> Result<Box<dyn DeviceTransport>, Box<dyn std::error::Error>> {
    let mut config = padflash_dummy::DummyConfig::default();

    if let Some(chunk) = params.params.get("chunk") {
        config.max_chunk_len = chunk
            .parse()
            .map_err(|_| format!("Invalid chunk size: {}", chunk))?;
    }
    if let Some(capacity) = params.params.get("capacity") {
        config.capacity = capacity
            .parse()
            .map_err(|_| format!("Invalid capacity: {}", capacity))?;
    }

    Ok(Box::new(padflash_dummy::DummyTransport::new(config)))
}
