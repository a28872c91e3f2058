//! Vendor firmware catalog client
//!
//! The vendor publishes firmware through a single endpoint: a POST to
//! `/firmware/select` with the model's selector code in a `Type` header
//! and `Beta: 1` to include pre-release builds. The reply is JSON with a
//! `msgState` flag and a `list` of builds, newest first.

use std::time::Duration;

use padflash_core::catalog::{FirmwareCatalog, FirmwareChannel, FirmwareRelease};
use padflash_core::device::SupportedModel;
use padflash_core::error::{Error, Result};
use serde::Deserialize;

/// Default firmware distribution server
pub const DEFAULT_BASE_URL: &str = "http://dl.8bitdo.com:8080";

const SELECT_PATH: &str = "/firmware/select";
const CATALOG_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct SelectReply {
    #[serde(rename = "msgState")]
    msg_state: i64,
    #[serde(default)]
    list: Vec<ReleaseEntry>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ReleaseEntry {
    #[serde(default)]
    version: String,
    #[serde(default)]
    date: String,
    #[serde(rename = "fileSize", default)]
    file_size: u64,
    #[serde(rename = "filePathName", default)]
    file_path_name: String,
    #[serde(default)]
    beta: bool,
    #[serde(default)]
    crc32: Option<String>,
}

impl ReleaseEntry {
    /// Entries without a download path cannot be fetched and are dropped
    fn into_release(self) -> Option<FirmwareRelease> {
        if self.file_path_name.is_empty() {
            log::warn!(
                "catalog entry for version {:?} has no download path, skipping",
                self.version
            );
            return None;
        }
        Some(FirmwareRelease {
            version: self.version,
            date: self.date,
            size_bytes: self.file_size,
            remote_path: self.file_path_name,
            beta: self.beta,
            checksum: self.crc32,
        })
    }
}

/// Catalog client for the vendor's firmware distribution server
pub struct VendorCatalog {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl VendorCatalog {
    /// Client against the default vendor server
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Client against an alternate server (mirrors, test fixtures)
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(CATALOG_TIMEOUT)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

impl FirmwareCatalog for VendorCatalog {
    fn releases(
        &self,
        model: &SupportedModel,
        channel: FirmwareChannel,
    ) -> Result<Vec<FirmwareRelease>> {
        let url = format!("{}{}", self.base_url, SELECT_PATH);
        log::info!(
            "querying {} for {} ({} channel)",
            url,
            model.name,
            channel
        );

        let response = self
            .client
            .post(&url)
            .header("Type", model.api_type.to_string())
            .header("Beta", if channel.includes_beta() { "1" } else { "0" })
            .send()
            .map_err(|e| classify(e, &url, CATALOG_TIMEOUT))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Network(format!(
                "firmware server replied {} for {}",
                status, url
            )));
        }

        let reply: SelectReply = response
            .json()
            .map_err(|e| Error::Network(format!("malformed catalog reply: {}", e)))?;

        if reply.msg_state != 1 {
            if let Some(message) = reply.error {
                log::warn!("catalog refused the query: {}", message);
            }
            return Err(Error::NotAvailable {
                model: model.name.to_string(),
                channel,
            });
        }

        let releases: Vec<FirmwareRelease> = reply
            .list
            .into_iter()
            .filter_map(ReleaseEntry::into_release)
            // The server is expected to honor the Beta header; drop
            // pre-release entries on the stable channel regardless
            .filter(|r| channel.includes_beta() || !r.beta)
            .collect();

        if releases.is_empty() {
            return Err(Error::NotAvailable {
                model: model.name.to_string(),
                channel,
            });
        }

        log::debug!("{} release(s) for {}", releases.len(), model.name);
        Ok(releases)
    }

    fn download_url(&self, release: &FirmwareRelease) -> String {
        if release.remote_path.starts_with('/') {
            format!("{}{}", self.base_url, release.remote_path)
        } else {
            format!("{}/{}", self.base_url, release.remote_path)
        }
    }
}

/// Map a transport-level HTTP failure onto the pipeline taxonomy
pub(crate) fn classify(error: reqwest::Error, url: &str, timeout: Duration) -> Error {
    if error.is_timeout() {
        Error::Timeout(timeout)
    } else {
        Error::Network(format!("request to {} failed: {}", url, error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_select_reply() {
        let json = r#"{
            "msgState": 1,
            "list": [
                {
                    "version": "1.35",
                    "date": "2023-09-01",
                    "fileSize": 131072,
                    "filePathName": "/firmware/pro2/fw_v1.35.dat",
                    "beta": false,
                    "crc32": "89abcdef"
                },
                {
                    "version": "1.36b1",
                    "date": "2023-10-12",
                    "fileSize": 131080,
                    "filePathName": "/firmware/pro2/fw_v1.36b1.dat",
                    "beta": true
                }
            ]
        }"#;

        let reply: SelectReply = serde_json::from_str(json).unwrap();
        assert_eq!(reply.msg_state, 1);
        assert_eq!(reply.list.len(), 2);

        let stable = reply.list[0].clone().into_release().unwrap();
        assert_eq!(stable.version, "1.35");
        assert_eq!(stable.size_bytes, 131072);
        assert_eq!(stable.checksum.as_deref(), Some("89abcdef"));
        assert!(!stable.beta);
    }

    #[test]
    fn decode_refusal_reply() {
        let json = r#"{"msgState": 0, "error": "unknown type"}"#;
        let reply: SelectReply = serde_json::from_str(json).unwrap();
        assert_eq!(reply.msg_state, 0);
        assert!(reply.list.is_empty());
        assert_eq!(reply.error.as_deref(), Some("unknown type"));
    }

    #[test]
    fn entry_without_path_is_dropped() {
        let entry = ReleaseEntry {
            version: "1.0".into(),
            date: String::new(),
            file_size: 100,
            file_path_name: String::new(),
            beta: false,
            crc32: None,
        };
        assert!(entry.into_release().is_none());
    }

    #[test]
    fn download_url_joins_paths() {
        let catalog = VendorCatalog::with_base_url("http://mirror.test:8080/").unwrap();
        let mut release = FirmwareRelease {
            version: "1.0".into(),
            date: String::new(),
            size_bytes: 0,
            remote_path: "/firmware/fw.dat".into(),
            beta: false,
            checksum: None,
        };
        assert_eq!(
            catalog.download_url(&release),
            "http://mirror.test:8080/firmware/fw.dat"
        );

        release.remote_path = "firmware/fw.dat".into();
        assert_eq!(
            catalog.download_url(&release),
            "http://mirror.test:8080/firmware/fw.dat"
        );
    }
}
