//! Device transport abstraction
//!
//! The vendor's byte-level flashing protocol is not part of the
//! orchestration contract. Everything protocol-specific sits behind
//! [`DeviceTransport`] so the real HID framing (`padflash-hid`) and the
//! in-memory emulator (`padflash-dummy`) are interchangeable, and so the
//! flash engine can be tested without hardware.
//!
//! A transport is an exclusive handle: opening one claims the device node,
//! and enumeration must not keep probe handles alive (a stale claim shows
//! up as "device busy" when the flasher opens its own).

use crate::error::Result;

/// Device-side progress of a firmware transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStatus {
    /// Still receiving or committing data
    Busy,
    /// Image committed; CRC-32 over everything the device received
    Complete {
        /// Device-computed checksum of the received image
        crc32: u32,
    },
    /// Device rejected the transfer
    Fault {
        /// Device-specific failure code
        code: u8,
    },
}

/// An opened, exclusive channel to a controller in bootloader mode
pub trait DeviceTransport {
    /// Largest slice accepted by a single [`write_chunk`] call.
    ///
    /// Report-based protocols impose a small fixed payload per packet;
    /// the flash engine never exceeds this.
    ///
    /// [`write_chunk`]: DeviceTransport::write_chunk
    fn max_chunk_len(&self) -> usize;

    /// Announce an incoming image of `total_len` bytes with the given
    /// CRC-32, and put the device into receive state
    fn begin_transfer(&mut self, total_len: u64, crc32: u32) -> Result<()>;

    /// Write one bounded chunk at `offset`.
    ///
    /// Offsets are contiguous and start at zero. A bounded wait applies;
    /// an unresponsive device surfaces `Timeout` rather than blocking the
    /// pipeline forever.
    fn write_chunk(&mut self, offset: u64, data: &[u8]) -> Result<()>;

    /// Poll the device-side transfer state
    fn read_status(&mut self) -> Result<TransferStatus>;

    /// Ask the device to reboot into the new firmware.
    ///
    /// Many controllers drop off the bus before answering, so callers
    /// treat failures here as advisory.
    fn reset_device(&mut self) -> Result<()>;
}

impl DeviceTransport for Box<dyn DeviceTransport> {
    fn max_chunk_len(&self) -> usize {
        (**self).max_chunk_len()
    }

    fn begin_transfer(&mut self, total_len: u64, crc32: u32) -> Result<()> {
        (**self).begin_transfer(total_len, crc32)
    }

    fn write_chunk(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        (**self).write_chunk(offset, data)
    }

    fn read_status(&mut self) -> Result<TransferStatus> {
        (**self).read_status()
    }

    fn reset_device(&mut self) -> Result<()> {
        (**self).reset_device()
    }
}
