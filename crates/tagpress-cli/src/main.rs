//! `tagpress` — provision RFID tags with a CID/UID pair over a USB
//! HID reader/writer, verifying every write by reading the tag back.
//!
//! The default build drives the mock device (use `--demo` to script a
//! tag presentation); the real reader needs the `hardware-usb`
//! feature.

use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tokio::sync::{mpsc, watch};
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use tagpress_hardware::AnyTagDevice;
use tagpress_hardware::mock::{MockTagDevice, MockTagHandle};
use tagpress_provision::{CycleOutcome, EngineConfig, ProvisioningEngine, ProvisioningTarget};

#[derive(Parser, Debug)]
#[command(name = "tagpress", version, about = "USB HID RFID tag provisioning tool")]
struct Cli {
    /// Customer identifier to write
    #[arg(long, default_value_t = 77)]
    cid: u32,

    /// Unique identifier to write
    #[arg(long, default_value_t = 1_234_567_890)]
    uid: u32,

    /// Settle delay between write and verification read, in milliseconds
    #[arg(long, default_value_t = 100)]
    settle_ms: u64,

    /// Pause between poll cycles, in milliseconds
    #[arg(long, default_value_t = 100)]
    poll_ms: u64,

    /// Output machine-readable JSON event lines
    #[arg(long)]
    json: bool,

    /// Device backend
    #[arg(long, value_enum, default_value_t = DeviceKind::Mock)]
    device: DeviceKind,

    /// USB vendor id, hex
    #[arg(long, default_value = "ffff", value_parser = parse_hex16)]
    vendor_id: u16,

    /// USB product id, hex
    #[arg(long, default_value = "0035", value_parser = parse_hex16)]
    product_id: u16,

    /// Present one scripted tag on the mock device after startup
    #[arg(long)]
    demo: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum DeviceKind {
    /// Simulated reader; no hardware required.
    Mock,

    /// USB HID reader (requires the hardware-usb feature).
    Usb,
}

fn parse_hex16(s: &str) -> Result<u16, String> {
    u16::from_str_radix(s.trim_start_matches("0x"), 16).map_err(|e| e.to_string())
}

/// Acquire the selected device backend.
///
/// Failure here is fatal: a missing or unopenable device is not a
/// transient condition the polling loop can recover from.
fn acquire_device(cli: &Cli) -> anyhow::Result<(AnyTagDevice, Option<MockTagHandle>)> {
    match cli.device {
        DeviceKind::Mock => {
            let (device, handle) = MockTagDevice::new();
            Ok((AnyTagDevice::Mock(device), Some(handle)))
        }
        #[cfg(feature = "hardware-usb")]
        DeviceKind::Usb => {
            let device = tagpress_hardware::hid::HidTagDevice::open(cli.vendor_id, cli.product_id)
                .with_context(|| {
                    format!(
                        "could not open reader {:04x}:{:04x}",
                        cli.vendor_id, cli.product_id
                    )
                })?;
            Ok((AnyTagDevice::UsbHid(device), None))
        }
        #[cfg(not(feature = "hardware-usb"))]
        DeviceKind::Usb => {
            anyhow::bail!("USB support not compiled in; rebuild with --features hardware-usb")
        }
    }
}

fn print_outcome(outcome: &CycleOutcome, json: bool) {
    if json {
        match serde_json::to_string(outcome) {
            Ok(line) => println!("{line}"),
            Err(e) => error!(error = %e, "could not serialize event"),
        }
        return;
    }

    match outcome {
        CycleOutcome::Provisioned(report) => {
            println!("Write OK!");
            println!("uid: {}", report.uid);
            println!("customer id: {}", report.original_cid);
            println!("CRC sum: {:#06x}", report.original_crc);
            println!();
        }
        CycleOutcome::WriteFailed { .. } => println!("Write ERROR!"),
        CycleOutcome::ReadFailed { message } => error!("tag read failed: {message}"),
        CycleOutcome::NoTag | CycleOutcome::AlreadyProcessed { .. } => {}
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let target = ProvisioningTarget::new(cli.cid, cli.uid);
    let config = EngineConfig::new(target)
        .with_settle_delay(Duration::from_millis(cli.settle_ms))
        .with_poll_interval(Duration::from_millis(cli.poll_ms));

    println!("Initializing device...");
    let (device, mock_handle) = acquire_device(&cli)?;

    if cli.demo {
        match mock_handle {
            Some(handle) => {
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    handle.present_tag(0, 424_242, 0x462E);
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    handle.remove_tag();
                });
            }
            None => warn!("--demo only applies to the mock device"),
        }
    }

    println!("CID:UID to be written: {target}");
    println!("Please hold a tag to the reader until you hear two beeps...");
    println!();

    let (events_tx, mut events_rx) = mpsc::channel(16);
    let (stop_tx, stop_rx) = watch::channel(false);

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            stop_tx.send(true).ok();
        }
    });

    let json = cli.json;
    let printer = tokio::spawn(async move {
        while let Some(outcome) = events_rx.recv().await {
            print_outcome(&outcome, json);
        }
    });

    let engine = ProvisioningEngine::new(device, config);
    engine
        .run(events_tx, stop_rx)
        .await
        .context("device initialization failed")?;

    printer.await.ok();
    Ok(())
}
