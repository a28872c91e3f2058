//! Artifact download with atomic commit
//!
//! Images stream into a uniquely named temp file inside the scratch
//! directory and are renamed to their stable path only after the transfer
//! completed and passed its integrity checks. A crash, cancellation, or
//! failed check therefore never leaves a partial file that could be
//! mistaken for a valid artifact.

use std::io::{Read, Write};
use std::path::PathBuf;
use std::time::Duration;

use padflash_core::artifact::FirmwareArtifact;
use padflash_core::cancel::CancelToken;
use padflash_core::catalog::{FirmwareCatalog, FirmwareChannel, FirmwareRelease};
use padflash_core::device::SupportedModel;
use padflash_core::error::{Error, Result};
use padflash_core::flash::CRC32;

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);
const COPY_BUF_LEN: usize = 64 * 1024;

/// Where and how downloads happen
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Scratch directory for committed artifacts and in-flight temp files
    pub scratch_dir: PathBuf,
    /// Bound on each network read
    pub timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            scratch_dir: std::env::temp_dir().join("padflash"),
            timeout: DOWNLOAD_TIMEOUT,
        }
    }
}

/// Progress callback: bytes received so far, declared total when known
pub type ProgressFn<'a> = &'a mut dyn FnMut(u64, Option<u64>);

/// Fetch the newest release for a model on a channel.
///
/// This is the one-call form of the fetch stage: resolve the catalog,
/// take the newest build, download and commit it.
pub fn fetch_latest(
    catalog: &dyn FirmwareCatalog,
    model: &SupportedModel,
    channel: FirmwareChannel,
    config: &FetchConfig,
    cancel: CancelToken,
    on_progress: ProgressFn<'_>,
) -> Result<FirmwareArtifact> {
    let releases = catalog.releases(model, channel)?;
    // releases() guarantees a non-empty list, newest first
    download_release(catalog, &releases[0], config, cancel, on_progress)
}

/// Download one specific release into the scratch directory
pub fn download_release(
    catalog: &dyn FirmwareCatalog,
    release: &FirmwareRelease,
    config: &FetchConfig,
    cancel: CancelToken,
    on_progress: ProgressFn<'_>,
) -> Result<FirmwareArtifact> {
    let url = catalog.download_url(release);
    log::info!("downloading {}", url);

    let client = reqwest::blocking::Client::builder()
        .timeout(config.timeout)
        .build()
        .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;

    let response = client
        .get(&url)
        .send()
        .map_err(|e| crate::catalog::classify(e, &url, config.timeout))?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::Network(format!(
            "firmware server replied {} for {}",
            status, url
        )));
    }

    store_stream(response, release, &url, config, cancel, on_progress)
}

/// Stream `reader` to disk and commit on success.
///
/// Split from the HTTP plumbing so the commit protocol, integrity checks,
/// and cancellation can be exercised with in-memory readers.
fn store_stream<R: Read>(
    mut reader: R,
    release: &FirmwareRelease,
    source_url: &str,
    config: &FetchConfig,
    cancel: CancelToken,
    on_progress: ProgressFn<'_>,
) -> Result<FirmwareArtifact> {
    std::fs::create_dir_all(&config.scratch_dir)?;

    let final_path = config.scratch_dir.join(release.file_name());
    let declared = (release.size_bytes > 0).then_some(release.size_bytes);

    // Dropping the temp file before persist() deletes it, which is
    // exactly what every error path below wants
    let mut tmp = tempfile::Builder::new()
        .prefix(".")
        .suffix(".part")
        .tempfile_in(&config.scratch_dir)?;

    let mut digest = CRC32.digest();
    let mut buf = [0u8; COPY_BUF_LEN];
    let mut total = 0u64;

    loop {
        cancel.check()?;

        let n = reader.read(&mut buf).map_err(|e| match e.kind() {
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => {
                Error::Timeout(config.timeout)
            }
            _ => Error::Network(format!("download of {} failed: {}", source_url, e)),
        })?;
        if n == 0 {
            break;
        }

        tmp.write_all(&buf[..n])?;
        digest.update(&buf[..n]);
        total += n as u64;
        on_progress(total, declared);
    }

    if total == 0 {
        return Err(Error::Integrity(format!(
            "{} produced a zero-byte download",
            source_url
        )));
    }

    if let Some(expected) = declared {
        if total != expected {
            return Err(Error::Integrity(format!(
                "downloaded {} bytes but the catalog declared {}",
                total, expected
            )));
        }
    }

    let computed = digest.finalize();
    if let Some(expected) = &release.checksum {
        let expected = u32::from_str_radix(expected.trim(), 16).map_err(|_| {
            Error::Integrity(format!("catalog checksum {:?} is not valid hex", expected))
        })?;
        if computed != expected {
            return Err(Error::Integrity(format!(
                "checksum mismatch: computed {:08x}, catalog declared {:08x}",
                computed, expected
            )));
        }
    }

    tmp.flush()?;
    tmp.persist(&final_path).map_err(|e| Error::Io(e.error))?;

    log::info!(
        "committed {} ({} bytes, crc32 {:08x})",
        final_path.display(),
        total,
        computed
    );

    Ok(FirmwareArtifact {
        source_url: source_url.to_string(),
        local_path: final_path,
        size_bytes: total,
        checksum: release.checksum.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::atomic::AtomicBool;

    fn release(size: u64, checksum: Option<&str>) -> FirmwareRelease {
        FirmwareRelease {
            version: "1.0".into(),
            date: "2024-01-01".into(),
            size_bytes: size,
            remote_path: "/firmware/fw_test.dat".into(),
            beta: false,
            checksum: checksum.map(str::to_string),
        }
    }

    fn config_in(dir: &tempfile::TempDir) -> FetchConfig {
        FetchConfig {
            scratch_dir: dir.path().to_path_buf(),
            timeout: Duration::from_secs(5),
        }
    }

    fn fresh_token() -> CancelToken {
        // Each test leaks one flag; tokens need 'static storage
        let flag: &'static AtomicBool = Box::leak(Box::new(AtomicBool::new(false)));
        CancelToken::new(flag)
    }

    fn dir_entry_count(dir: &tempfile::TempDir) -> usize {
        std::fs::read_dir(dir.path()).unwrap().count()
    }

    #[test]
    fn commit_happy_path() {
        let dir = tempfile::tempdir().unwrap();
        let data = b"firmware image payload".to_vec();
        let crc = format!("{:08x}", CRC32.checksum(&data));
        let release = release(data.len() as u64, Some(&crc));

        let mut seen = Vec::new();
        let artifact = store_stream(
            Cursor::new(data.clone()),
            &release,
            "http://firmware.test/fw_test.dat",
            &config_in(&dir),
            fresh_token(),
            &mut |got, total| seen.push((got, total)),
        )
        .unwrap();

        assert_eq!(artifact.size_bytes, data.len() as u64);
        assert_eq!(artifact.local_path, dir.path().join("fw_test.dat"));
        assert_eq!(std::fs::read(&artifact.local_path).unwrap(), data);
        assert_eq!(seen.last().unwrap().0, data.len() as u64);
        // Only the committed artifact remains
        assert_eq!(dir_entry_count(&dir), 1);
    }

    #[test]
    fn zero_byte_download_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = store_stream(
            Cursor::new(Vec::new()),
            &release(0, None),
            "http://firmware.test/empty.dat",
            &config_in(&dir),
            fresh_token(),
            &mut |_, _| {},
        )
        .unwrap_err();

        assert!(matches!(err, Error::Integrity(_)));
        assert_eq!(dir_entry_count(&dir), 0);
    }

    #[test]
    fn declared_size_mismatch_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = store_stream(
            Cursor::new(vec![0u8; 10]),
            &release(20, None),
            "http://firmware.test/short.dat",
            &config_in(&dir),
            fresh_token(),
            &mut |_, _| {},
        )
        .unwrap_err();

        assert!(matches!(err, Error::Integrity(_)));
        assert_eq!(dir_entry_count(&dir), 0);
    }

    #[test]
    fn checksum_mismatch_discards_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let data = vec![0x42u8; 64];
        let err = store_stream(
            Cursor::new(data.clone()),
            &release(64, Some("deadbeef")),
            "http://firmware.test/bad.dat",
            &config_in(&dir),
            fresh_token(),
            &mut |_, _| {},
        )
        .unwrap_err();

        assert!(matches!(err, Error::Integrity(_)));
        assert_eq!(dir_entry_count(&dir), 0);
    }

    #[test]
    fn undecodable_checksum_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = store_stream(
            Cursor::new(vec![1u8; 8]),
            &release(8, Some("not-hex!")),
            "http://firmware.test/odd.dat",
            &config_in(&dir),
            fresh_token(),
            &mut |_, _| {},
        )
        .unwrap_err();

        assert!(matches!(err, Error::Integrity(_)));
        assert_eq!(dir_entry_count(&dir), 0);
    }

    /// Yields one chunk, then trips the cancel token
    struct CancelMidStream {
        data: Vec<u8>,
        served: bool,
        token: CancelToken,
    }

    impl Read for CancelMidStream {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.served {
                return Ok(0);
            }
            self.served = true;
            let n = self.data.len().min(buf.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.token.cancel();
            Ok(n)
        }
    }

    #[test]
    fn interrupt_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let token = fresh_token();
        let reader = CancelMidStream {
            data: vec![0x99u8; 4096],
            served: false,
            token,
        };

        let err = store_stream(
            reader,
            &release(8192, None),
            "http://firmware.test/interrupted.dat",
            &config_in(&dir),
            token,
            &mut |_, _| {},
        )
        .unwrap_err();

        assert!(matches!(err, Error::Cancelled));
        assert_eq!(dir_entry_count(&dir), 0);
    }
}
