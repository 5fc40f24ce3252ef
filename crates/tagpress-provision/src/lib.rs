//! Tag provisioning engine for the tagpress tool.
//!
//! This crate implements the core control flow: a single-owner
//! polling loop that reads the tag reader, deduplicates repeated
//! presentations of the same tag, performs the write-then-verify
//! sequence with the mandatory settle delay, and reports outcomes via
//! acoustic pulses and a typed event stream.
//!
//! The device itself is abstracted behind
//! [`tagpress_hardware::TagDevice`], so the engine runs unchanged
//! against the mock device or the real USB HID driver.

pub mod engine;
pub mod target;

pub use engine::{
    CycleOutcome, DEFAULT_POLL_INTERVAL, DEFAULT_SETTLE_DELAY, EngineConfig, FAILURE_BEEPS,
    ProvisionReport, ProvisioningEngine, SUCCESS_BEEPS,
};
pub use target::ProvisioningTarget;
