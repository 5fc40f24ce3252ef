//! Mock reader/writer implementation for testing and development.
//!
//! This module provides a simulated tag reader/writer that can be
//! controlled programmatically without physical hardware. Unlike an
//! event-queue mock, the simulated reader has polling semantics: every
//! `read_tag` call reports the tag currently held in the field, so a
//! tag that rests on the reader is observed on every poll until it is
//! removed.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{
    Result,
    error::HardwareError,
    traits::TagDevice,
    types::{DeviceInfo, TagRead, TagSnapshot},
};

/// How the mock applies `write_tag` calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Writes mutate the tag currently in the field (normal tag).
    #[default]
    Apply,

    /// Writes report success but leave the tag unchanged, so a
    /// read-back verification will see the old contents (locked or
    /// defective tag).
    Ignore,

    /// Writes return a device error.
    Fail,
}

/// One recorded device operation, for call-order assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCall {
    /// The operation that was invoked.
    pub op: DeviceOp,

    /// When it was invoked, on the tokio clock (respects a paused
    /// test clock).
    pub at: tokio::time::Instant,
}

/// Device operation kinds recorded by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceOp {
    /// `init` was called.
    Init,

    /// `read_tag` was called.
    Read,

    /// `write_tag` was called with these arguments.
    Write { cid: u32, uid: u32 },

    /// `beep` was called with this pulse count.
    Beep { count: u8 },
}

#[derive(Debug, Default)]
struct MockState {
    field: Option<TagSnapshot>,
    write_mode: WriteMode,
    fail_init: bool,
    fail_reads: bool,
    calls: Vec<DeviceCall>,
}

impl MockState {
    fn record(&mut self, op: DeviceOp) {
        self.calls.push(DeviceCall {
            op,
            at: tokio::time::Instant::now(),
        });
    }
}

fn lock(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock tag reader/writer for testing and development.
///
/// # Examples
///
/// ```
/// use tagpress_hardware::mock::MockTagDevice;
/// use tagpress_hardware::{TagDevice, TagRead};
///
/// #[tokio::main]
/// async fn main() -> tagpress_hardware::Result<()> {
///     let (mut device, handle) = MockTagDevice::new();
///
///     assert_eq!(device.read_tag().await?, TagRead::NoTag);
///
///     handle.present_tag(77, 42, 0xBEEF);
///     let read = device.read_tag().await?;
///     assert_eq!(read.snapshot().map(|s| s.uid), Some(42));
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockTagDevice {
    state: Arc<Mutex<MockState>>,
    info: DeviceInfo,
}

impl MockTagDevice {
    /// Create a new mock device with the default name.
    ///
    /// Returns a `(MockTagDevice, MockTagHandle)` pair; the handle is
    /// used to place and remove tags and to inspect recorded calls.
    pub fn new() -> (Self, MockTagHandle) {
        Self::with_name("Mock Tag Writer")
    }

    /// Create a new mock device with a custom name.
    pub fn with_name(name: impl Into<String>) -> (Self, MockTagHandle) {
        let state = Arc::new(Mutex::new(MockState::default()));

        let device = Self {
            state: Arc::clone(&state),
            info: DeviceInfo::new(name, "mock"),
        };

        let handle = MockTagHandle { state };

        (device, handle)
    }
}

impl TagDevice for MockTagDevice {
    async fn init(&mut self) -> Result<()> {
        let mut state = lock(&self.state);
        state.record(DeviceOp::Init);
        if state.fail_init {
            return Err(HardwareError::initialization_failed(
                "mock initialization failure",
            ));
        }
        Ok(())
    }

    async fn read_tag(&mut self) -> Result<TagRead> {
        let mut state = lock(&self.state);
        state.record(DeviceOp::Read);
        if state.fail_reads {
            return Err(HardwareError::read("mock read failure"));
        }
        Ok(match &state.field {
            Some(snapshot) => TagRead::Tag(snapshot.clone()),
            None => TagRead::NoTag,
        })
    }

    async fn write_tag(&mut self, cid: u32, uid: u32) -> Result<()> {
        let mut state = lock(&self.state);
        state.record(DeviceOp::Write { cid, uid });
        match state.write_mode {
            WriteMode::Apply => {
                if let Some(tag) = state.field.as_mut() {
                    tag.cid = cid;
                    tag.uid = uid;
                }
                Ok(())
            }
            WriteMode::Ignore => Ok(()),
            WriteMode::Fail => Err(HardwareError::write("mock write failure")),
        }
    }

    async fn beep(&mut self, count: u8) -> Result<()> {
        let mut state = lock(&self.state);
        state.record(DeviceOp::Beep { count });
        Ok(())
    }

    async fn device_info(&self) -> Result<DeviceInfo> {
        Ok(self.info.clone())
    }
}

/// Handle for controlling a [`MockTagDevice`].
///
/// Cloneable; all clones share the same simulated field state, so a
/// handle can be moved into a task while the test keeps another clone
/// for assertions.
#[derive(Debug, Clone)]
pub struct MockTagHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockTagHandle {
    /// Place a tag in the reader field.
    ///
    /// The tag stays there, observed by every poll, until
    /// [`remove_tag`](Self::remove_tag) is called or a write mutates it.
    pub fn present_tag(&self, cid: u32, uid: u32, crc: u16) {
        lock(&self.state).field = Some(TagSnapshot::new(cid, uid, crc));
    }

    /// Remove the tag from the reader field.
    pub fn remove_tag(&self) {
        lock(&self.state).field = None;
    }

    /// Get the UID of the tag currently in the field, if any.
    pub fn field_uid(&self) -> Option<u32> {
        lock(&self.state).field.as_ref().map(|tag| tag.uid)
    }

    /// Select how subsequent writes behave.
    pub fn set_write_mode(&self, mode: WriteMode) {
        lock(&self.state).write_mode = mode;
    }

    /// Make `init` fail (simulates an unresponsive device).
    pub fn fail_init(&self, fail: bool) {
        lock(&self.state).fail_init = fail;
    }

    /// Make subsequent reads fail (simulates a transport glitch).
    pub fn fail_reads(&self, fail: bool) {
        lock(&self.state).fail_reads = fail;
    }

    /// Snapshot of every recorded device call, in invocation order.
    pub fn calls(&self) -> Vec<DeviceCall> {
        lock(&self.state).calls.clone()
    }

    /// Recorded beep pulse counts, in invocation order.
    pub fn beeps(&self) -> Vec<u8> {
        lock(&self.state)
            .calls
            .iter()
            .filter_map(|call| match call.op {
                DeviceOp::Beep { count } => Some(count),
                _ => None,
            })
            .collect()
    }

    /// Number of recorded `write_tag` calls.
    pub fn write_count(&self) -> usize {
        lock(&self.state)
            .calls
            .iter()
            .filter(|call| matches!(call.op, DeviceOp::Write { .. }))
            .count()
    }
}
