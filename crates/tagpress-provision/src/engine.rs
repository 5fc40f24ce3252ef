//! The tag provisioning engine.
//!
//! This module implements the polling state machine that drives the
//! reader: poll for a present tag, suppress reprocessing while the
//! same tag rests on the reader, write the configured target pair,
//! wait the settle delay, read back to verify, and emit acoustic and
//! event feedback.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use tagpress_hardware::{Result, TagDevice, TagRead};

use crate::target::ProvisioningTarget;

/// Minimum pause after a write before the device can be read again.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Pause between poll cycles, bounding the poll rate.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Acoustic pulses emitted on a verified write.
pub const SUCCESS_BEEPS: u8 = 2;

/// Acoustic pulses emitted on a failed or unverified write.
pub const FAILURE_BEEPS: u8 = 3;

/// Engine configuration.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// The CID/UID pair written to every presented tag.
    pub target: ProvisioningTarget,

    /// Pause between a write and the verification read.
    pub settle_delay: Duration,

    /// Pause between poll cycles.
    pub poll_interval: Duration,
}

impl EngineConfig {
    /// Create a configuration with the default timing intervals.
    pub fn new(target: ProvisioningTarget) -> Self {
        Self {
            target,
            settle_delay: DEFAULT_SETTLE_DELAY,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Set the settle delay.
    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    /// Set the poll interval.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

/// Success report for one provisioned tag.
///
/// Carries the verified UID from the post-write read, but the CID and
/// CRC of the tag *as first observed* — deliberately, as a diagnostic
/// of what the tag looked like before provisioning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionReport {
    /// UID read back from the tag after the write.
    pub uid: u32,

    /// CID the tag carried before the write.
    pub original_cid: u32,

    /// Checksum reported with the pre-write read.
    pub original_crc: u16,
}

/// Classification of one poll cycle.
///
/// All cycle-local failures fold into this type; nothing short of a
/// failed device initialization escapes a cycle as an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CycleOutcome {
    /// Nothing on the reader. Clears the last-seen state.
    NoTag,

    /// The same tag is still resting on the reader from an earlier
    /// cycle; no device operation was performed.
    AlreadyProcessed {
        /// UID observed on the reader.
        uid: u32,
    },

    /// Write performed and verified by reading the tag back.
    Provisioned(ProvisionReport),

    /// Write failed, or the verification read did not match the
    /// target.
    WriteFailed {
        /// UID of the tag as observed before the write.
        uid: u32,
    },

    /// The poll itself failed at the device level.
    ReadFailed {
        /// Device error description.
        message: String,
    },
}

/// The tag provisioning loop.
///
/// Owns the device handle exclusively; every cycle is strictly serial
/// (read, maybe write, settle, read), so no locking discipline is
/// needed around the device.
///
/// A tag is processed at most once per continuous placement: its UID
/// is recorded *before* the write attempt, so a failed write is not
/// retried until the operator lifts and re-presents the tag. Note
/// that a successful write changes the tag's UID to the target value,
/// so the next poll sees a "new" UID and reprocesses it once
/// (idempotently) before the guard settles.
///
/// # Examples
///
/// ```
/// use tagpress_hardware::mock::MockTagDevice;
/// use tagpress_provision::{CycleOutcome, EngineConfig, ProvisioningEngine, ProvisioningTarget};
///
/// #[tokio::main]
/// async fn main() {
///     let (device, handle) = MockTagDevice::new();
///     handle.present_tag(0, 42, 0xBEEF);
///
///     let config = EngineConfig::new(ProvisioningTarget::new(77, 1_234_567_890));
///     let mut engine = ProvisioningEngine::new(device, config);
///
///     let outcome = engine.run_cycle().await;
///     assert!(matches!(outcome, CycleOutcome::Provisioned(_)));
/// }
/// ```
#[derive(Debug)]
pub struct ProvisioningEngine<D: TagDevice> {
    device: D,
    config: EngineConfig,
    last_seen: Option<u32>,
}

impl<D: TagDevice> ProvisioningEngine<D> {
    /// Create an engine around an already-acquired device.
    pub fn new(device: D, config: EngineConfig) -> Self {
        Self {
            device,
            config,
            last_seen: None,
        }
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// UID of the most recently processed tag, if it is still
    /// presumed present. Cleared whenever a poll finds the field
    /// empty.
    pub fn last_seen(&self) -> Option<u32> {
        self.last_seen
    }

    /// Run one poll cycle.
    ///
    /// Infallible by design: device-level read and write failures are
    /// reported as [`CycleOutcome`] values so the loop can keep
    /// polling.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let first = match self.device.read_tag().await {
            Ok(read) => read,
            Err(e) => {
                warn!(error = %e, "tag read failed");
                // Last-seen is kept: a transient read glitch under a
                // resting tag must not cause reprocessing.
                return CycleOutcome::ReadFailed {
                    message: e.to_string(),
                };
            }
        };

        let snapshot = match first {
            TagRead::NoTag => {
                self.last_seen = None;
                return CycleOutcome::NoTag;
            }
            TagRead::Tag(snapshot) => snapshot,
        };

        if self.last_seen == Some(snapshot.uid) {
            return CycleOutcome::AlreadyProcessed { uid: snapshot.uid };
        }

        // Recorded before the write attempt so a failed write is not
        // retried while the same tag rests on the reader.
        self.last_seen = Some(snapshot.uid);

        debug!(uid = snapshot.uid, cid = snapshot.cid, "new tag detected");

        let target = self.config.target;
        if let Err(e) = self.device.write_tag(target.cid, target.uid).await {
            warn!(uid = snapshot.uid, error = %e, "tag write failed");
            self.device.beep(FAILURE_BEEPS).await.ok();
            return CycleOutcome::WriteFailed { uid: snapshot.uid };
        }

        // The device cannot be read back immediately after a write.
        tokio::time::sleep(self.config.settle_delay).await;

        let verified = match self.device.read_tag().await {
            Ok(TagRead::Tag(read_back))
                if read_back.cid == target.cid && read_back.uid == target.uid =>
            {
                Some(read_back)
            }
            _ => None,
        };

        match verified {
            Some(read_back) => {
                info!(uid = read_back.uid, "tag provisioned");
                self.device.beep(SUCCESS_BEEPS).await.ok();
                CycleOutcome::Provisioned(ProvisionReport {
                    uid: read_back.uid,
                    original_cid: snapshot.cid,
                    original_crc: snapshot.crc,
                })
            }
            None => {
                warn!(uid = snapshot.uid, "write verification failed");
                self.device.beep(FAILURE_BEEPS).await.ok();
                CycleOutcome::WriteFailed { uid: snapshot.uid }
            }
        }
    }

    /// Initialize the device and run the polling loop until shut down.
    ///
    /// Idle outcomes ([`CycleOutcome::NoTag`] and
    /// [`CycleOutcome::AlreadyProcessed`]) are not forwarded to the
    /// events channel; everything else is. The loop also stops when
    /// the event receiver is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error only if device initialization fails; that is
    /// the single fatal condition, and it occurs before any polling
    /// or beeping.
    pub async fn run(
        mut self,
        events: mpsc::Sender<CycleOutcome>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        self.device.init().await?;
        if let Ok(device_info) = self.device.device_info().await {
            info!(device = %device_info.name, model = %device_info.model, "device initialized");
        }
        info!(pair = %self.config.target, "provisioning loop started");

        while !*shutdown.borrow() {
            let outcome = self.run_cycle().await;
            let idle = matches!(
                outcome,
                CycleOutcome::NoTag | CycleOutcome::AlreadyProcessed { .. }
            );
            if !idle && events.send(outcome).await.is_err() {
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.poll_interval) => {}
                changed = shutdown.changed() => {
                    // A dropped controller counts as a shutdown request.
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("provisioning loop stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = EngineConfig::new(ProvisioningTarget::new(77, 42));
        assert_eq!(config.settle_delay, DEFAULT_SETTLE_DELAY);
        assert_eq!(config.poll_interval, DEFAULT_POLL_INTERVAL);
        assert_eq!(config.target.cid, 77);
    }

    #[test]
    fn test_config_builders() {
        let config = EngineConfig::new(ProvisioningTarget::new(1, 2))
            .with_settle_delay(Duration::from_millis(50))
            .with_poll_interval(Duration::from_millis(250));
        assert_eq!(config.settle_delay, Duration::from_millis(50));
        assert_eq!(config.poll_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_outcome_json_shape() {
        let outcome = CycleOutcome::Provisioned(ProvisionReport {
            uid: 1_234_567_890,
            original_cid: 3,
            original_crc: 0xBEEF,
        });
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains(r#""event":"provisioned""#));
        assert!(json.contains(r#""uid":1234567890"#));

        let failed = CycleOutcome::WriteFailed { uid: 42 };
        let json = serde_json::to_string(&failed).unwrap();
        assert!(json.contains(r#""event":"write_failed""#));
    }
}
