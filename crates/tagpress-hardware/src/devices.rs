//! Enum wrapper for device dispatch.
//!
//! Native `async fn` in traits (Edition 2024 RPITIT) is not
//! object-safe, so `Box<dyn TagDevice>` cannot be used. This module
//! provides an enum wrapper with concrete type dispatch at compile
//! time instead: zero-cost, type-safe, and friendly to feature flags.

#[cfg(feature = "hardware-usb")]
use crate::hid::HidTagDevice;
use crate::mock::MockTagDevice;
use crate::traits::TagDevice;
use crate::{DeviceInfo, Result, TagRead};

/// Enum wrapper for tag device dispatch.
///
/// # Examples
///
/// ```
/// use tagpress_hardware::devices::AnyTagDevice;
/// use tagpress_hardware::mock::MockTagDevice;
/// use tagpress_hardware::TagDevice;
///
/// #[tokio::main]
/// async fn main() -> tagpress_hardware::Result<()> {
///     let (device, _handle) = MockTagDevice::new();
///     let mut any_device = AnyTagDevice::Mock(device);
///
///     let info = any_device.device_info().await?;
///     assert_eq!(info.model, "mock");
///     Ok(())
/// }
/// ```
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyTagDevice {
    /// Mock device for development and testing.
    Mock(MockTagDevice),

    /// USB HID reader/writer (requires the `hardware-usb` feature).
    #[cfg(feature = "hardware-usb")]
    UsbHid(HidTagDevice),
}

impl TagDevice for AnyTagDevice {
    async fn init(&mut self) -> Result<()> {
        match self {
            Self::Mock(device) => device.init().await,
            #[cfg(feature = "hardware-usb")]
            Self::UsbHid(device) => device.init().await,
        }
    }

    async fn read_tag(&mut self) -> Result<TagRead> {
        match self {
            Self::Mock(device) => device.read_tag().await,
            #[cfg(feature = "hardware-usb")]
            Self::UsbHid(device) => device.read_tag().await,
        }
    }

    async fn write_tag(&mut self, cid: u32, uid: u32) -> Result<()> {
        match self {
            Self::Mock(device) => device.write_tag(cid, uid).await,
            #[cfg(feature = "hardware-usb")]
            Self::UsbHid(device) => device.write_tag(cid, uid).await,
        }
    }

    async fn beep(&mut self, count: u8) -> Result<()> {
        match self {
            Self::Mock(device) => device.beep(count).await,
            #[cfg(feature = "hardware-usb")]
            Self::UsbHid(device) => device.beep(count).await,
        }
    }

    async fn device_info(&self) -> Result<DeviceInfo> {
        match self {
            Self::Mock(device) => device.device_info().await,
            #[cfg(feature = "hardware-usb")]
            Self::UsbHid(device) => device.device_info().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_any_device_delegates_to_mock() {
        let (device, handle) = MockTagDevice::new();
        let mut any_device = AnyTagDevice::Mock(device);

        handle.present_tag(7, 8, 9);
        let read = any_device.read_tag().await.unwrap();
        assert_eq!(read.snapshot().map(|s| s.uid), Some(8));

        any_device.beep(2).await.unwrap();
        assert_eq!(handle.beeps(), vec![2]);
    }
}
