//! End-to-end provisioning loop behavior against the mock device.

use std::time::Duration;

use tokio::sync::{mpsc, watch};

use tagpress_hardware::mock::{DeviceOp, MockTagDevice, MockTagHandle, WriteMode};
use tagpress_provision::{
    CycleOutcome, EngineConfig, ProvisionReport, ProvisioningEngine, ProvisioningTarget,
};

const TARGET_CID: u32 = 77;
const TARGET_UID: u32 = 1_234_567_890;

fn engine() -> (ProvisioningEngine<MockTagDevice>, MockTagHandle) {
    let (device, handle) = MockTagDevice::new();
    let config = EngineConfig::new(ProvisioningTarget::new(TARGET_CID, TARGET_UID));
    (ProvisioningEngine::new(device, config), handle)
}

#[tokio::test(start_paused = true)]
async fn same_tag_resting_on_reader_is_written_once() {
    let (mut engine, handle) = engine();

    // Tag already carries the target UID, so a successful write does
    // not change the observed UID across polls.
    handle.present_tag(0, TARGET_UID, 0x0001);

    assert!(matches!(
        engine.run_cycle().await,
        CycleOutcome::Provisioned(_)
    ));
    for _ in 0..4 {
        assert_eq!(
            engine.run_cycle().await,
            CycleOutcome::AlreadyProcessed { uid: TARGET_UID }
        );
    }

    assert_eq!(handle.write_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn removing_and_representing_tag_triggers_new_write() {
    let (mut engine, handle) = engine();

    handle.present_tag(0, TARGET_UID, 0x0001);
    assert!(matches!(
        engine.run_cycle().await,
        CycleOutcome::Provisioned(_)
    ));

    handle.remove_tag();
    assert_eq!(engine.run_cycle().await, CycleOutcome::NoTag);
    assert_eq!(engine.last_seen(), None);

    handle.present_tag(0, TARGET_UID, 0x0001);
    assert!(matches!(
        engine.run_cycle().await,
        CycleOutcome::Provisioned(_)
    ));

    assert_eq!(handle.write_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn successful_write_beeps_twice_and_reports_original_state() {
    let (mut engine, handle) = engine();

    handle.present_tag(3, 42, 0x462E);

    let outcome = engine.run_cycle().await;
    assert_eq!(
        outcome,
        CycleOutcome::Provisioned(ProvisionReport {
            uid: TARGET_UID,
            original_cid: 3,
            original_crc: 0x462E,
        })
    );
    assert_eq!(handle.beeps(), vec![2]);
}

#[tokio::test(start_paused = true)]
async fn unverified_write_beeps_three_times_and_loop_survives() {
    let (mut engine, handle) = engine();

    // Write reports success but leaves the tag unchanged, so the
    // verification read sees the old UID.
    handle.set_write_mode(WriteMode::Ignore);
    handle.present_tag(0, 42, 0x0001);

    assert_eq!(engine.run_cycle().await, CycleOutcome::WriteFailed { uid: 42 });
    assert_eq!(handle.beeps(), vec![3]);

    // The failed tag is still marked seen; the loop keeps polling
    // without retrying it.
    assert_eq!(
        engine.run_cycle().await,
        CycleOutcome::AlreadyProcessed { uid: 42 }
    );
    assert_eq!(handle.write_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn rejected_write_skips_verification_read() {
    let (mut engine, handle) = engine();

    handle.set_write_mode(WriteMode::Fail);
    handle.present_tag(0, 42, 0x0001);

    assert_eq!(engine.run_cycle().await, CycleOutcome::WriteFailed { uid: 42 });
    assert_eq!(handle.beeps(), vec![3]);

    let ops: Vec<_> = handle.calls().into_iter().map(|c| c.op).collect();
    assert_eq!(
        ops,
        vec![
            DeviceOp::Read,
            DeviceOp::Write {
                cid: TARGET_CID,
                uid: TARGET_UID
            },
            DeviceOp::Beep { count: 3 },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn idle_cycles_never_write_and_clear_last_seen() {
    let (mut engine, handle) = engine();

    for _ in 0..5 {
        assert_eq!(engine.run_cycle().await, CycleOutcome::NoTag);
    }

    assert_eq!(handle.write_count(), 0);
    assert_eq!(handle.beeps(), Vec::<u8>::new());
    assert_eq!(engine.last_seen(), None);
}

#[tokio::test(start_paused = true)]
async fn read_error_is_reported_and_preserves_last_seen() {
    let (mut engine, handle) = engine();

    handle.present_tag(0, TARGET_UID, 0x0001);
    assert!(matches!(
        engine.run_cycle().await,
        CycleOutcome::Provisioned(_)
    ));

    handle.fail_reads(true);
    assert!(matches!(
        engine.run_cycle().await,
        CycleOutcome::ReadFailed { .. }
    ));

    // The tag never left the reader; once reads recover it must not
    // be reprocessed.
    handle.fail_reads(false);
    assert_eq!(
        engine.run_cycle().await,
        CycleOutcome::AlreadyProcessed { uid: TARGET_UID }
    );
    assert_eq!(handle.write_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn successful_write_changes_uid_and_is_reprocessed_once() {
    let (mut engine, handle) = engine();

    // The write gives the tag a new UID, so the next poll sees a
    // "new" tag and runs one more (idempotent) write-verify pass
    // before the dedup guard settles.
    handle.present_tag(0, 42, 0x0001);

    assert!(matches!(
        engine.run_cycle().await,
        CycleOutcome::Provisioned(_)
    ));
    assert!(matches!(
        engine.run_cycle().await,
        CycleOutcome::Provisioned(_)
    ));
    assert_eq!(
        engine.run_cycle().await,
        CycleOutcome::AlreadyProcessed { uid: TARGET_UID }
    );

    assert_eq!(handle.write_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn verification_read_waits_for_settle_delay() {
    let (device, handle) = MockTagDevice::new();
    let config = EngineConfig::new(ProvisioningTarget::new(TARGET_CID, TARGET_UID))
        .with_settle_delay(Duration::from_millis(100));
    let mut engine = ProvisioningEngine::new(device, config);

    handle.present_tag(0, 42, 0x0001);
    engine.run_cycle().await;

    let calls = handle.calls();
    let ops: Vec<_> = calls.iter().map(|c| c.op.clone()).collect();
    assert_eq!(
        ops,
        vec![
            DeviceOp::Read,
            DeviceOp::Write {
                cid: TARGET_CID,
                uid: TARGET_UID
            },
            DeviceOp::Read,
            DeviceOp::Beep { count: 2 },
        ]
    );

    // Paused clock: the gap between the write and the verification
    // read is exactly the configured settle delay.
    let write_at = calls[1].at;
    let verify_at = calls[2].at;
    assert!(verify_at - write_at >= Duration::from_millis(100));
}

#[tokio::test(start_paused = true)]
async fn init_failure_is_fatal_before_any_polling() {
    let (device, handle) = MockTagDevice::new();
    handle.fail_init(true);

    let config = EngineConfig::new(ProvisioningTarget::new(TARGET_CID, TARGET_UID));
    let engine = ProvisioningEngine::new(device, config);

    let (events_tx, _events_rx) = mpsc::channel(16);
    let (_stop_tx, stop_rx) = watch::channel(false);

    let result = engine.run(events_tx, stop_rx).await;
    assert!(result.is_err());

    let ops: Vec<_> = handle.calls().into_iter().map(|c| c.op).collect();
    assert_eq!(ops, vec![DeviceOp::Init]);
    assert!(handle.beeps().is_empty());
}

#[tokio::test(start_paused = true)]
async fn run_loop_emits_events_and_stops_on_shutdown() {
    let (device, handle) = MockTagDevice::new();
    let config = EngineConfig::new(ProvisioningTarget::new(TARGET_CID, TARGET_UID));
    let engine = ProvisioningEngine::new(device, config);

    let (events_tx, mut events_rx) = mpsc::channel(16);
    let (stop_tx, stop_rx) = watch::channel(false);

    handle.present_tag(5, TARGET_UID, 0xABCD);

    let task = tokio::spawn(engine.run(events_tx, stop_rx));

    let event = events_rx.recv().await.expect("engine dropped events");
    assert_eq!(
        event,
        CycleOutcome::Provisioned(ProvisionReport {
            uid: TARGET_UID,
            original_cid: 5,
            original_crc: 0xABCD,
        })
    );

    stop_tx.send(true).expect("engine stopped early");
    task.await.unwrap().unwrap();

    // Idle cycles after the first are deduplicated and never emitted.
    assert!(events_rx.recv().await.is_none());
}
