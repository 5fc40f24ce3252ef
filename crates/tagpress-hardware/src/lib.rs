//! Device abstraction layer for the tagpress provisioning tool.
//!
//! This crate provides the trait-based abstraction over the USB HID
//! RFID reader/writer, enabling substitution between a mock
//! implementation (for development and testing) and the real hardware
//! driver.
//!
//! # Design
//!
//! - **Async-first**: all I/O operations are asynchronous using native
//!   `async fn` in traits (Edition 2024 RPITIT).
//! - **Error-aware**: all operations return [`Result<T>`] with a
//!   detailed [`HardwareError`]; "no tag present" is a normal
//!   [`TagRead::NoTag`] result, never an error.
//! - **Mock-complete**: the [`mock`] module simulates the reader with
//!   full polling semantics, write modes, and error injection, so the
//!   provisioning loop is testable without hardware.
//!
//! The real driver lives in the [`hid`] module behind the
//! `hardware-usb` cargo feature and is the only place that knows the
//! device's report framing and field encoding.
//!
//! # Examples
//!
//! ```no_run
//! use tagpress_hardware::{Result, TagDevice, TagRead};
//!
//! async fn poll_once<D: TagDevice>(device: &mut D) -> Result<()> {
//!     match device.read_tag().await? {
//!         TagRead::Tag(snapshot) => println!("tag uid {}", snapshot.uid),
//!         TagRead::NoTag => println!("field empty"),
//!     }
//!     Ok(())
//! }
//! ```

pub mod devices;
pub mod error;
#[cfg(feature = "hardware-usb")]
pub mod hid;
pub mod mock;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use devices::AnyTagDevice;
pub use error::{HardwareError, Result};
pub use traits::TagDevice;
pub use types::{DeviceInfo, TagRead, TagSnapshot};
