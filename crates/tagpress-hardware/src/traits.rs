//! Device trait definitions.
//!
//! This module defines the trait interface between the provisioning
//! loop and the reader/writer hardware, enabling substitution between
//! mock and real device implementations.
//!
//! The trait uses native `async fn` methods (Edition 2024 RPITIT),
//! eliminating the need for the `async_trait` macro.

#![allow(async_fn_in_trait)]

use crate::error::Result;
use crate::types::{DeviceInfo, TagRead};

/// Tag reader/writer device abstraction.
///
/// Represents a combined RFID reader/writer with an acoustic buzzer.
/// The device owns the transport protocol, report framing, and the
/// numeric encoding of the CID/UID fields; callers deal only in
/// structured [`TagRead`] results.
///
/// # Object Safety and Dynamic Dispatch
///
/// This trait is NOT object-safe because `async fn` methods return
/// `impl Future` (Edition 2024 RPITIT), so `Box<dyn TagDevice>` cannot
/// be used. Use generic type parameters, or the
/// [`AnyTagDevice`](crate::devices::AnyTagDevice) enum wrapper for
/// dynamic dispatch.
///
/// # Examples
///
/// ```no_run
/// use tagpress_hardware::{Result, TagDevice, TagRead};
///
/// async fn wait_for_tag<D: TagDevice>(device: &mut D) -> Result<Option<u32>> {
///     match device.read_tag().await? {
///         TagRead::Tag(snapshot) => Ok(Some(snapshot.uid)),
///         TagRead::NoTag => Ok(None),
///     }
/// }
/// ```
pub trait TagDevice: Send + Sync {
    /// Initialize the device.
    ///
    /// Must complete successfully before any polling starts. Real
    /// hardware may need a wake-up sequence and a settle period here.
    ///
    /// # Errors
    ///
    /// Returns an error if the device does not respond to the
    /// initialization sequence or a communication error occurs.
    async fn init(&mut self) -> Result<()>;

    /// Poll the reader field once.
    ///
    /// Returns [`TagRead::NoTag`] when nothing (or a tag without
    /// identity data) is in the field; that is a normal result, not an
    /// error. The call may block up to the device's internal timeout
    /// but never indefinitely.
    ///
    /// # Errors
    ///
    /// Returns an error if the device is disconnected or the response
    /// cannot be decoded.
    async fn read_tag(&mut self) -> Result<TagRead>;

    /// Write a CID/UID pair to the tag currently in the field.
    ///
    /// Numeric ranges and wire encoding are owned by the device; out
    /// of range values are truncated to the device's field widths.
    /// The device cannot be read back reliably until a settle delay
    /// has elapsed after this call.
    ///
    /// # Errors
    ///
    /// Returns an error if the write command cannot be delivered. A
    /// delivered write that did not take effect on the tag is only
    /// detectable by reading the tag back.
    async fn write_tag(&mut self, cid: u32, uid: u32) -> Result<()>;

    /// Emit `count` short acoustic pulses.
    ///
    /// Fire-and-forget operator feedback; callers typically ignore
    /// failures.
    ///
    /// # Errors
    ///
    /// Returns an error if the buzzer command cannot be delivered.
    async fn beep(&mut self, count: u8) -> Result<()>;

    /// Get device information.
    ///
    /// # Errors
    ///
    /// Returns an error if a communication error occurs while
    /// querying device metadata.
    async fn device_info(&self) -> Result<DeviceInfo>;
}
