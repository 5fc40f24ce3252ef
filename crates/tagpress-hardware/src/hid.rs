//! USB HID driver for the `ffff:0035` family of 125 kHz tag
//! reader/writers.
//!
//! The device speaks a vendor protocol over HID feature reports. This
//! module owns the report framing, the CID/UID wire encoding, and the
//! frame checksum; everything above it deals in [`TagRead`] values.
//!
//! `hidapi` calls are blocking, but each one completes within the
//! device's own short report timeout. The device handle is owned
//! exclusively by the provisioning loop, so the calls are made
//! directly from its (single) task rather than through a blocking
//! pool.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use hidapi::{HidApi, HidDevice};
use tracing::debug;

use crate::{
    Result,
    error::HardwareError,
    traits::TagDevice,
    types::{DeviceInfo, TagRead, TagSnapshot},
};

/// Default USB vendor id of the reader.
pub const DEFAULT_VENDOR_ID: u16 = 0xFFFF;

/// Default USB product id of the reader.
pub const DEFAULT_PRODUCT_ID: u16 = 0x0035;

/// Feature report length: report id byte plus 32 payload bytes.
const REPORT_LEN: usize = 33;

const FRAME_START: u8 = 0xAA;
const FRAME_END: u8 = 0xBB;

const CMD_INIT: u8 = 0x01;
const CMD_BEEP: u8 = 0x03;
const CMD_WRITE: u8 = 0x21;
const CMD_READ: u8 = 0x25;

const STATUS_NO_TAG: u8 = 0x00;
const STATUS_TAG: u8 = 0x01;

/// Boot settle after the wake-up command, before the device answers
/// report exchanges reliably.
const INIT_SETTLE: Duration = Duration::from_secs(2);

/// USB HID tag reader/writer.
pub struct HidTagDevice {
    device: Mutex<HidDevice>,
    info: DeviceInfo,
}

impl std::fmt::Debug for HidTagDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // HidDevice itself is not Debug.
        f.debug_struct("HidTagDevice")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

fn lock(device: &Mutex<HidDevice>) -> MutexGuard<'_, HidDevice> {
    device.lock().unwrap_or_else(PoisonError::into_inner)
}

impl HidTagDevice {
    /// Open the reader with the given vendor/product id pair.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::DeviceNotFound`] if no matching device
    /// is attached, or a communication error if the HID backend
    /// cannot be initialized.
    pub fn open(vendor_id: u16, product_id: u16) -> Result<Self> {
        let api = HidApi::new().map_err(|e| HardwareError::communication(e.to_string()))?;

        let device = api.open(vendor_id, product_id).map_err(|_| {
            HardwareError::device_not_found(format!("{vendor_id:04x}:{product_id:04x}"))
        })?;

        let serial = device.get_serial_number_string().ok().flatten();

        let mut info = DeviceInfo::new(
            "USB HID RFID Writer",
            format!("{vendor_id:04x}:{product_id:04x}"),
        );
        if let Some(serial) = serial {
            info = info.with_serial_number(serial);
        }

        debug!(model = %info.model, "opened HID reader");

        Ok(Self {
            device: Mutex::new(device),
            info,
        })
    }

    /// Open the reader with the default `ffff:0035` identity.
    pub fn open_default() -> Result<Self> {
        Self::open(DEFAULT_VENDOR_ID, DEFAULT_PRODUCT_ID)
    }

    /// Build and send one command frame as a feature report.
    fn send_command(&self, cmd: u8, payload: &[u8]) -> Result<()> {
        debug_assert!(payload.len() <= REPORT_LEN - 6);

        let mut report = [0u8; REPORT_LEN];
        report[1] = FRAME_START;
        report[2] = cmd;
        report[3] = payload.len() as u8;
        report[4..4 + payload.len()].copy_from_slice(payload);

        let sum: u8 = report[2..4 + payload.len()]
            .iter()
            .fold(0u8, |acc, b| acc.wrapping_add(*b));
        report[4 + payload.len()] = sum;
        report[5 + payload.len()] = FRAME_END;

        lock(&self.device)
            .send_feature_report(&report)
            .map_err(|e| HardwareError::communication(e.to_string()))
    }

    /// Send a command frame and fetch the device's response report.
    fn exchange(&self, cmd: u8, payload: &[u8]) -> Result<[u8; REPORT_LEN]> {
        self.send_command(cmd, payload)?;

        let mut response = [0u8; REPORT_LEN];
        lock(&self.device)
            .get_feature_report(&mut response)
            .map_err(|e| HardwareError::communication(e.to_string()))?;

        if response[1] != FRAME_START {
            return Err(HardwareError::read("malformed response frame"));
        }
        Ok(response)
    }
}

impl TagDevice for HidTagDevice {
    async fn init(&mut self) -> Result<()> {
        self.send_command(CMD_INIT, &[])
            .map_err(|e| HardwareError::initialization_failed(e.to_string()))?;
        tokio::time::sleep(INIT_SETTLE).await;
        Ok(())
    }

    async fn read_tag(&mut self) -> Result<TagRead> {
        let response = self.exchange(CMD_READ, &[])?;

        match response[2] {
            STATUS_NO_TAG => Ok(TagRead::NoTag),
            STATUS_TAG => {
                let cid = u32::from(response[3]);
                let uid = u32::from_be_bytes([
                    response[4],
                    response[5],
                    response[6],
                    response[7],
                ]);
                let crc = u16::from_be_bytes([response[8], response[9]]);
                Ok(TagRead::Tag(TagSnapshot::new(cid, uid, crc)))
            }
            status => Err(HardwareError::read(format!(
                "unexpected read status {status:#04x}"
            ))),
        }
    }

    async fn write_tag(&mut self, cid: u32, uid: u32) -> Result<()> {
        // Wire format: one CID byte, four UID bytes big-endian. Values
        // wider than the wire fields are truncated here.
        let uid_bytes = uid.to_be_bytes();
        let payload = [
            cid as u8,
            uid_bytes[0],
            uid_bytes[1],
            uid_bytes[2],
            uid_bytes[3],
        ];
        self.send_command(CMD_WRITE, &payload)
            .map_err(|e| HardwareError::write(e.to_string()))
    }

    async fn beep(&mut self, count: u8) -> Result<()> {
        self.send_command(CMD_BEEP, &[count])
    }

    async fn device_info(&self) -> Result<DeviceInfo> {
        Ok(self.info.clone())
    }
}
