//! Chunked firmware transfer with device-side verification
//!
//! The engine drives a [`FlashSession`] through
//! `Pending -> Transferring -> Verifying -> {Succeeded, Failed}` over any
//! [`DeviceTransport`]. Chunk sizes are bounded by the transport, status
//! is polled until the device confirms, and the device-reported CRC-32 is
//! compared against the locally computed one.
//!
//! There is no retry anywhere in here. A failed write leaves the
//! controller with a partially written image, and writing again without
//! the user's explicit say-so is how pads get bricked.

use std::time::{Duration, Instant};

use crc::{Crc, CRC_32_ISO_HDLC};

use crate::error::{Error, Result};
use crate::session::{FlashSession, SessionState};
use crate::transport::{DeviceTransport, TransferStatus};

/// Checksum algorithm shared with catalog metadata and transports
pub const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Timing knobs for the verification phase
#[derive(Debug, Clone)]
pub struct FlashConfig {
    /// Delay between status polls while the device commits the image
    pub verify_poll: Duration,
    /// Give up on verification after this long without a final status
    pub verify_timeout: Duration,
}

impl Default for FlashConfig {
    fn default() -> Self {
        Self {
            verify_poll: Duration::from_millis(50),
            verify_timeout: Duration::from_secs(10),
        }
    }
}

/// Progress callbacks for the transfer, kept renderer-agnostic so the CLI
/// can plug in indicatif without the engine knowing about terminals
pub trait FlashProgress {
    /// Transfer is starting; `total_bytes` will be written
    fn transferring(&mut self, total_bytes: u64) {
        let _ = total_bytes;
    }

    /// Cumulative bytes accepted by the device so far
    fn chunk_written(&mut self, bytes_sent: u64) {
        let _ = bytes_sent;
    }

    /// All chunks sent; waiting for the device to confirm
    fn verifying(&mut self) {}

    /// Device confirmed the image
    fn complete(&mut self, report: &FlashReport) {
        let _ = report;
    }
}

/// Progress sink that ignores everything
pub struct NoProgress;

impl FlashProgress for NoProgress {}

/// Outcome of a successful flash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashReport {
    /// Bytes transferred to the device
    pub bytes_written: u64,
    /// Number of chunk writes performed
    pub chunks: usize,
    /// CRC-32 both sides agreed on
    pub crc32: u32,
}

/// Flash a fetched image to the device behind `transport`.
///
/// `image` must be the artifact's current on-disk contents; a size
/// divergence between the two means the file changed after the fetch and
/// fails the integrity gate before any byte is sent. The session must be
/// `Pending`: sessions are single-use.
pub fn flash_artifact<T>(
    session: &mut FlashSession,
    transport: &mut T,
    image: &[u8],
    config: &FlashConfig,
    progress: &mut dyn FlashProgress,
) -> Result<FlashReport>
where
    T: DeviceTransport + ?Sized,
{
    if session.state() != SessionState::Pending {
        return Err(Error::Transport(format!(
            "flash session already used (state: {})",
            session.state()
        )));
    }

    if image.is_empty() || image.len() as u64 != session.artifact().size_bytes {
        return Err(Error::Integrity(format!(
            "image on disk is {} bytes but the fetched artifact was {} bytes",
            image.len(),
            session.artifact().size_bytes
        )));
    }

    let total = image.len() as u64;
    let crc32 = CRC32.checksum(image);

    log::info!(
        "flashing {} bytes (crc32 {:08x}) to {}",
        total,
        crc32,
        session.device().display_name
    );

    if let Err(e) = transport.begin_transfer(total, crc32) {
        session.advance(SessionState::Failed);
        return Err(e);
    }

    session.advance(SessionState::Transferring);
    progress.transferring(total);

    let max_chunk = transport.max_chunk_len().max(1);
    let mut offset = 0u64;
    let mut chunks = 0usize;

    for chunk in image.chunks(max_chunk) {
        if let Err(e) = transport.write_chunk(offset, chunk) {
            session.advance(SessionState::Failed);
            // Timeouts keep their identity; everything else becomes a
            // flash I/O failure carrying the offset that broke
            return Err(match e {
                Error::Timeout(d) => Error::Timeout(d),
                other => Error::FlashIo {
                    offset,
                    reason: other.to_string(),
                },
            });
        }
        offset += chunk.len() as u64;
        chunks += 1;
        progress.chunk_written(offset);
    }

    session.advance(SessionState::Verifying);
    progress.verifying();

    match wait_for_completion(transport, config) {
        Ok(device_crc) if device_crc == crc32 => {
            session.advance(SessionState::Succeeded);
            if let Err(e) = transport.reset_device() {
                // Expected on controllers that reboot as soon as they
                // commit; the user is told to power cycle either way
                log::debug!("reset request not acknowledged: {}", e);
            }
            let report = FlashReport {
                bytes_written: total,
                chunks,
                crc32,
            };
            progress.complete(&report);
            Ok(report)
        }
        Ok(device_crc) => {
            session.advance(SessionState::Failed);
            Err(Error::FlashIo {
                offset: total,
                reason: format!(
                    "device checksum {:08x} does not match image checksum {:08x}",
                    device_crc, crc32
                ),
            })
        }
        Err(e) => {
            session.advance(SessionState::Failed);
            Err(e)
        }
    }
}

/// Poll until the device reports a final status or the timeout elapses
fn wait_for_completion<T>(transport: &mut T, config: &FlashConfig) -> Result<u32>
where
    T: DeviceTransport + ?Sized,
{
    let deadline = Instant::now() + config.verify_timeout;

    loop {
        match transport.read_status()? {
            TransferStatus::Complete { crc32 } => return Ok(crc32),
            TransferStatus::Fault { code } => {
                return Err(Error::FlashIo {
                    offset: 0,
                    reason: format!("device reported fault code {:#04x} during verify", code),
                });
            }
            TransferStatus::Busy => {
                if Instant::now() >= deadline {
                    return Err(Error::Timeout(config.verify_timeout));
                }
                std::thread::sleep(config.verify_poll);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::FirmwareArtifact;
    use crate::device::DeviceDescriptor;
    use std::path::PathBuf;

    /// Scripted transport capturing what the engine sends
    struct ScriptedTransport {
        max_chunk: usize,
        received: Vec<u8>,
        expected_len: u64,
        declared_crc: u32,
        fail_write_at: Option<u64>,
        lie_about_crc: bool,
        status_busy_polls: usize,
        resets: usize,
    }

    impl ScriptedTransport {
        fn new(max_chunk: usize) -> Self {
            Self {
                max_chunk,
                received: Vec::new(),
                expected_len: 0,
                declared_crc: 0,
                fail_write_at: None,
                lie_about_crc: false,
                status_busy_polls: 0,
                resets: 0,
            }
        }
    }

    impl DeviceTransport for ScriptedTransport {
        fn max_chunk_len(&self) -> usize {
            self.max_chunk
        }

        fn begin_transfer(&mut self, total_len: u64, crc32: u32) -> Result<()> {
            self.expected_len = total_len;
            self.declared_crc = crc32;
            self.received.clear();
            Ok(())
        }

        fn write_chunk(&mut self, offset: u64, data: &[u8]) -> Result<()> {
            if let Some(bad) = self.fail_write_at {
                if offset >= bad {
                    return Err(Error::Transport("report dropped".into()));
                }
            }
            assert_eq!(offset, self.received.len() as u64, "non-contiguous write");
            assert!(data.len() <= self.max_chunk, "chunk exceeds transport bound");
            self.received.extend_from_slice(data);
            Ok(())
        }

        fn read_status(&mut self) -> Result<TransferStatus> {
            if self.status_busy_polls > 0 {
                self.status_busy_polls -= 1;
                return Ok(TransferStatus::Busy);
            }
            let crc32 = if self.lie_about_crc {
                !CRC32.checksum(&self.received)
            } else {
                CRC32.checksum(&self.received)
            };
            Ok(TransferStatus::Complete { crc32 })
        }

        fn reset_device(&mut self) -> Result<()> {
            self.resets += 1;
            Ok(())
        }
    }

    fn session_for(image: &[u8]) -> FlashSession {
        let device = DeviceDescriptor {
            vendor_id: 0x2DC8,
            product_id: 0x6000,
            display_name: "SN30 Pro".into(),
            path: "/dev/hidraw0".into(),
        };
        let artifact = FirmwareArtifact {
            source_url: "http://firmware.test/fw.dat".into(),
            local_path: PathBuf::from("/tmp/fw.dat"),
            size_bytes: image.len() as u64,
            checksum: None,
        };
        FlashSession::new(device, artifact).unwrap()
    }

    fn quick_config() -> FlashConfig {
        FlashConfig {
            verify_poll: Duration::from_millis(1),
            verify_timeout: Duration::from_millis(100),
        }
    }

    #[test]
    fn happy_path_reaches_succeeded() {
        let image: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let mut session = session_for(&image);
        let mut transport = ScriptedTransport::new(58);
        transport.status_busy_polls = 3;

        let report = flash_artifact(
            &mut session,
            &mut transport,
            &image,
            &quick_config(),
            &mut NoProgress,
        )
        .unwrap();

        assert_eq!(session.state(), SessionState::Succeeded);
        assert_eq!(transport.received, image);
        assert_eq!(report.bytes_written, 1000);
        assert_eq!(report.chunks, 1000usize.div_ceil(58));
        assert_eq!(report.crc32, CRC32.checksum(&image));
        assert_eq!(transport.resets, 1);
    }

    #[test]
    fn write_failure_is_terminal_and_not_retried() {
        let image = vec![0xAB; 500];
        let mut session = session_for(&image);
        let mut transport = ScriptedTransport::new(58);
        transport.fail_write_at = Some(116);

        let err = flash_artifact(
            &mut session,
            &mut transport,
            &image,
            &quick_config(),
            &mut NoProgress,
        )
        .unwrap_err();

        assert!(matches!(err, Error::FlashIo { offset: 116, .. }));
        assert_eq!(session.state(), SessionState::Failed);

        // A used session refuses to run again
        let err = flash_artifact(
            &mut session,
            &mut transport,
            &image,
            &quick_config(),
            &mut NoProgress,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }

    #[test]
    fn checksum_mismatch_fails_verification() {
        let image = vec![0x5A; 200];
        let mut session = session_for(&image);
        let mut transport = ScriptedTransport::new(64);
        transport.lie_about_crc = true;

        let err = flash_artifact(
            &mut session,
            &mut transport,
            &image,
            &quick_config(),
            &mut NoProgress,
        )
        .unwrap_err();

        assert!(matches!(err, Error::FlashIo { .. }));
        assert_eq!(session.state(), SessionState::Failed);
        assert_eq!(transport.resets, 0);
    }

    #[test]
    fn image_divergence_fails_before_any_write() {
        let image = vec![0x11; 300];
        let mut session = session_for(&image);
        let mut transport = ScriptedTransport::new(64);

        let truncated = &image[..100];
        let err = flash_artifact(
            &mut session,
            &mut transport,
            truncated,
            &quick_config(),
            &mut NoProgress,
        )
        .unwrap_err();

        assert!(matches!(err, Error::Integrity(_)));
        assert_eq!(session.state(), SessionState::Pending);
        assert!(transport.received.is_empty());
    }

    #[test]
    fn verify_timeout_surfaces_as_timeout() {
        let image = vec![0x22; 100];
        let mut session = session_for(&image);
        let mut transport = ScriptedTransport::new(64);
        transport.status_busy_polls = usize::MAX;

        let err = flash_artifact(
            &mut session,
            &mut transport,
            &image,
            &quick_config(),
            &mut NoProgress,
        )
        .unwrap_err();

        assert!(matches!(err, Error::Timeout(_)));
        assert_eq!(session.state(), SessionState::Failed);
    }

    #[test]
    fn progress_sees_monotonic_offsets() {
        struct Recorder {
            total: u64,
            offsets: Vec<u64>,
            completed: bool,
        }
        impl FlashProgress for Recorder {
            fn transferring(&mut self, total_bytes: u64) {
                self.total = total_bytes;
            }
            fn chunk_written(&mut self, bytes_sent: u64) {
                self.offsets.push(bytes_sent);
            }
            fn complete(&mut self, _report: &FlashReport) {
                self.completed = true;
            }
        }

        let image = vec![0x33; 150];
        let mut session = session_for(&image);
        let mut transport = ScriptedTransport::new(64);
        let mut recorder = Recorder {
            total: 0,
            offsets: Vec::new(),
            completed: false,
        };

        flash_artifact(
            &mut session,
            &mut transport,
            &image,
            &quick_config(),
            &mut recorder,
        )
        .unwrap();

        assert_eq!(recorder.total, 150);
        assert_eq!(recorder.offsets, vec![64, 128, 150]);
        assert!(recorder.completed);
    }
}
