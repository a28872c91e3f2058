//! HID report transport
//!
//! Frames the firmware transfer over fixed-size interrupt reports: a
//! begin report announcing length and checksum, data reports carrying
//! bounded payloads, a status probe, and a reset request. Every begin and
//! data report is acknowledged by the device; waiting for that ack is
//! what bounds each chunk write.
//!
//! The framing here is intentionally the only place in the workspace that
//! knows report layouts. Everything above it sees `DeviceTransport`.

use std::ffi::CString;
use std::time::Duration;

use hidapi::{HidApi, HidDevice};
use padflash_core::device::DeviceDescriptor;
use padflash_core::error::Error;
use padflash_core::transport::{DeviceTransport, TransferStatus};

use crate::error::HidTransportError;

/// Interrupt report length used by the bootloader
pub const REPORT_LEN: usize = 64;

/// Payload bytes per data report (report minus cmd, offset, and length)
pub const DATA_PAYLOAD_LEN: usize = REPORT_LEN - 6;

const CMD_BEGIN: u8 = 0xA0;
const CMD_DATA: u8 = 0xA1;
const CMD_STATUS: u8 = 0xA2;
const CMD_RESET: u8 = 0xA3;

const STATUS_OK: u8 = 0x00;
const STATE_BUSY: u8 = 0x00;
const STATE_COMPLETE: u8 = 0x01;
const STATE_FAULT: u8 = 0x02;

const ACK_TIMEOUT: Duration = Duration::from_secs(2);

fn encode_begin(total_len: u32, crc32: u32) -> [u8; REPORT_LEN] {
    let mut report = [0u8; REPORT_LEN];
    report[0] = CMD_BEGIN;
    report[1..5].copy_from_slice(&total_len.to_le_bytes());
    report[5..9].copy_from_slice(&crc32.to_le_bytes());
    report
}

fn encode_data(offset: u32, data: &[u8]) -> [u8; REPORT_LEN] {
    debug_assert!(data.len() <= DATA_PAYLOAD_LEN);
    let mut report = [0u8; REPORT_LEN];
    report[0] = CMD_DATA;
    report[1..5].copy_from_slice(&offset.to_le_bytes());
    report[5] = data.len() as u8;
    report[6..6 + data.len()].copy_from_slice(data);
    report
}

fn decode_status(report: &[u8; REPORT_LEN]) -> padflash_core::Result<TransferStatus> {
    if report[0] != CMD_STATUS {
        return Err(HidTransportError::UnexpectedReport(report[0]).into());
    }
    match report[1] {
        STATE_BUSY => Ok(TransferStatus::Busy),
        STATE_COMPLETE => {
            let crc32 = u32::from_le_bytes([report[3], report[4], report[5], report[6]]);
            Ok(TransferStatus::Complete { crc32 })
        }
        STATE_FAULT => Ok(TransferStatus::Fault { code: report[2] }),
        other => Err(Error::Transport(format!(
            "device reported unknown transfer state {:#04x}",
            other
        ))),
    }
}

/// Exclusive handle on a controller's HID node
pub struct HidTransport {
    device: HidDevice,
    path: String,
    ack_timeout: Duration,
}

impl HidTransport {
    /// Open an exclusive handle on the controller behind `descriptor`.
    ///
    /// This is the first time the pipeline claims the device; enumeration
    /// must not have left a probe handle open or this fails with a busy
    /// node.
    pub fn open(descriptor: &DeviceDescriptor) -> padflash_core::Result<Self> {
        let api = HidApi::new().map_err(HidTransportError::Init)?;

        let cpath = CString::new(descriptor.path.as_bytes())
            .map_err(|_| HidTransportError::BadPath(descriptor.path.clone()))?;

        let device = api
            .open_path(&cpath)
            .map_err(|e| HidTransportError::Open {
                path: descriptor.path.clone(),
                source: e,
            })?;

        log::info!(
            "opened {} (VID={:04X} PID={:04X}) at {}",
            descriptor.display_name,
            descriptor.vendor_id,
            descriptor.product_id,
            descriptor.path
        );

        Ok(Self {
            device,
            path: descriptor.path.clone(),
            ack_timeout: ACK_TIMEOUT,
        })
    }

    fn write_report(&self, report: &[u8; REPORT_LEN]) -> crate::error::Result<()> {
        // Leading zero selects the unnumbered report id
        let mut buf = [0u8; REPORT_LEN + 1];
        buf[1..].copy_from_slice(report);

        let wrote = self
            .device
            .write(&buf)
            .map_err(HidTransportError::Write)?;
        if wrote < buf.len() {
            return Err(HidTransportError::ShortWrite {
                wrote,
                expected: buf.len(),
            });
        }
        Ok(())
    }

    fn read_report(&self) -> crate::error::Result<Option<[u8; REPORT_LEN]>> {
        let mut buf = [0u8; REPORT_LEN];
        let n = self
            .device
            .read_timeout(&mut buf, self.ack_timeout.as_millis() as i32)
            .map_err(HidTransportError::Read)?;
        Ok((n > 0).then_some(buf))
    }

    fn await_ack(&self, cmd: u8) -> padflash_core::Result<()> {
        match self.read_report()? {
            None => Err(Error::Timeout(self.ack_timeout)),
            Some(reply) if reply[0] == cmd && reply[1] == STATUS_OK => Ok(()),
            Some(reply) if reply[0] == cmd => Err(Error::Transport(format!(
                "device rejected command {:#04x} with status {:#04x}",
                cmd, reply[1]
            ))),
            Some(reply) => Err(HidTransportError::UnexpectedReport(reply[0]).into()),
        }
    }
}

impl DeviceTransport for HidTransport {
    fn max_chunk_len(&self) -> usize {
        DATA_PAYLOAD_LEN
    }

    fn begin_transfer(&mut self, total_len: u64, crc32: u32) -> padflash_core::Result<()> {
        let total = u32::try_from(total_len).map_err(|_| {
            Error::Transport(format!("image of {} bytes exceeds the wire format", total_len))
        })?;
        self.write_report(&encode_begin(total, crc32))?;
        self.await_ack(CMD_BEGIN)
    }

    fn write_chunk(&mut self, offset: u64, data: &[u8]) -> padflash_core::Result<()> {
        if data.len() > DATA_PAYLOAD_LEN {
            return Err(Error::Transport(format!(
                "chunk of {} bytes exceeds report payload of {}",
                data.len(),
                DATA_PAYLOAD_LEN
            )));
        }
        let offset = u32::try_from(offset)
            .map_err(|_| Error::Transport(format!("offset {:#x} exceeds the wire format", offset)))?;
        self.write_report(&encode_data(offset, data))?;
        self.await_ack(CMD_DATA)
    }

    fn read_status(&mut self) -> padflash_core::Result<TransferStatus> {
        let mut probe = [0u8; REPORT_LEN];
        probe[0] = CMD_STATUS;
        self.write_report(&probe)?;

        match self.read_report()? {
            None => Err(Error::Timeout(self.ack_timeout)),
            Some(reply) => decode_status(&reply),
        }
    }

    fn reset_device(&mut self) -> padflash_core::Result<()> {
        // The controller reboots on receipt; no ack will come back
        let mut report = [0u8; REPORT_LEN];
        report[0] = CMD_RESET;
        self.write_report(&report)?;
        log::debug!("reset requested on {}", self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_report_layout() {
        let report = encode_begin(0x0002_0000, 0xDEAD_BEEF);
        assert_eq!(report[0], CMD_BEGIN);
        assert_eq!(&report[1..5], &0x0002_0000u32.to_le_bytes());
        assert_eq!(&report[5..9], &0xDEAD_BEEFu32.to_le_bytes());
        assert!(report[9..].iter().all(|&b| b == 0));
    }

    #[test]
    fn data_report_layout() {
        let payload = [0x11u8, 0x22, 0x33];
        let report = encode_data(0x1C0, &payload);
        assert_eq!(report[0], CMD_DATA);
        assert_eq!(&report[1..5], &0x1C0u32.to_le_bytes());
        assert_eq!(report[5], 3);
        assert_eq!(&report[6..9], &payload);
        assert!(report[9..].iter().all(|&b| b == 0));
    }

    #[test]
    fn data_payload_fills_the_report() {
        let payload = [0xAB; DATA_PAYLOAD_LEN];
        let report = encode_data(0, &payload);
        assert_eq!(report[5] as usize, DATA_PAYLOAD_LEN);
        assert_eq!(&report[6..], &payload);
    }

    #[test]
    fn status_decoding() {
        let mut report = [0u8; REPORT_LEN];
        report[0] = CMD_STATUS;

        report[1] = STATE_BUSY;
        assert_eq!(decode_status(&report).unwrap(), TransferStatus::Busy);

        report[1] = STATE_COMPLETE;
        report[3..7].copy_from_slice(&0xCAFE_F00Du32.to_le_bytes());
        assert_eq!(
            decode_status(&report).unwrap(),
            TransferStatus::Complete { crc32: 0xCAFE_F00D }
        );

        report[1] = STATE_FAULT;
        report[2] = 0x17;
        assert_eq!(
            decode_status(&report).unwrap(),
            TransferStatus::Fault { code: 0x17 }
        );
    }

    #[test]
    fn status_rejects_foreign_reports() {
        let mut report = [0u8; REPORT_LEN];
        report[0] = 0x55;
        assert!(decode_status(&report).is_err());
    }
}
