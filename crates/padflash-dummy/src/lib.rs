//! padflash-dummy - In-memory bootloader emulator for testing
//!
//! This crate provides a dummy transport that emulates a controller
//! bootloader in memory. It's useful for exercising the flash pipeline
//! and the CLI without real hardware.

use crc::{Crc, CRC_32_ISO_HDLC};
use padflash_core::error::{Error, Result};
use padflash_core::transport::{DeviceTransport, TransferStatus};

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Configuration for the emulated bootloader
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Largest chunk accepted per write, mirroring a HID report payload
    pub max_chunk_len: usize,
    /// Emulated flash capacity in bytes
    pub capacity: usize,
    /// Polls that report Busy before the device confirms the image
    pub busy_polls: usize,
    /// Reject the chunk covering this offset, emulating a dropped report
    pub fail_at_offset: Option<u64>,
    /// Report a wrong checksum during verification
    pub corrupt_checksum: bool,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            max_chunk_len: 58,
            capacity: 512 * 1024,
            busy_polls: 2,
            fail_at_offset: None,
            corrupt_checksum: false,
        }
    }
}

/// Dummy transport
///
/// Emulates a controller bootloader in memory for testing purposes.
pub struct DummyTransport {
    config: DummyConfig,
    image: Vec<u8>,
    expected_len: u64,
    receiving: bool,
    busy_left: usize,
    resets: usize,
}

impl DummyTransport {
    /// Create a dummy transport with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        Self {
            busy_left: config.busy_polls,
            config,
            image: Vec::new(),
            expected_len: 0,
            receiving: false,
            resets: 0,
        }
    }

    /// Create a dummy transport with default configuration
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Bytes the emulated device has received so far
    pub fn image(&self) -> &[u8] {
        &self.image
    }

    /// How many reset requests the device has seen
    pub fn resets(&self) -> usize {
        self.resets
    }

    /// The configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }
}

impl DeviceTransport for DummyTransport {
    fn max_chunk_len(&self) -> usize {
        self.config.max_chunk_len
    }

    fn begin_transfer(&mut self, total_len: u64, crc32: u32) -> Result<()> {
        if total_len > self.config.capacity as u64 {
            return Err(Error::Transport(format!(
                "image ({} bytes) larger than device flash ({} bytes)",
                total_len, self.config.capacity
            )));
        }
        log::debug!(
            "dummy: begin transfer, {} bytes, crc32 {:08x}",
            total_len,
            crc32
        );
        self.image.clear();
        self.expected_len = total_len;
        self.receiving = true;
        self.busy_left = self.config.busy_polls;
        Ok(())
    }

    fn write_chunk(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        if !self.receiving {
            return Err(Error::Transport("transfer not started".into()));
        }
        if data.len() > self.config.max_chunk_len {
            return Err(Error::Transport(format!(
                "chunk of {} bytes exceeds report payload of {}",
                data.len(),
                self.config.max_chunk_len
            )));
        }
        if offset != self.image.len() as u64 {
            return Err(Error::Transport(format!(
                "non-contiguous write at {:#x}, expected {:#x}",
                offset,
                self.image.len()
            )));
        }
        if let Some(bad) = self.config.fail_at_offset {
            if offset <= bad && bad < offset + data.len() as u64 {
                return Err(Error::Transport(format!(
                    "emulated report loss at {:#x}",
                    bad
                )));
            }
        }
        self.image.extend_from_slice(data);
        Ok(())
    }

    fn read_status(&mut self) -> Result<TransferStatus> {
        if !self.receiving || (self.image.len() as u64) < self.expected_len {
            return Ok(TransferStatus::Busy);
        }
        if self.busy_left > 0 {
            self.busy_left -= 1;
            return Ok(TransferStatus::Busy);
        }

        let mut crc32 = CRC32.checksum(&self.image);
        if self.config.corrupt_checksum {
            crc32 = !crc32;
        }
        Ok(TransferStatus::Complete { crc32 })
    }

    fn reset_device(&mut self) -> Result<()> {
        self.resets += 1;
        self.receiving = false;
        Ok(())
    }
}
