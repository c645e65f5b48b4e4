//! BikeLink console monitor.
//!
//! Scans for the first BLE bike advertising a supported service, negotiates
//! its capabilities, and prints one line per decoded telemetry frame until
//! interrupted. An optional resistance level argument is applied once the
//! session starts.

use anyhow::Context;
use bikelink::config::{self, AppConfig, Units};
use bikelink::protocol::MeasurementRecord;
use bikelink::session::adapter::{MonitorEvent, NotificationAdapter};
use bikelink::session::ble::{self, BlePeripheral};
use bikelink::session::controller::BikeController;
use bikelink::session::negotiator;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting BikeLink v{}", env!("CARGO_PKG_VERSION"));

    let target_level: Option<u16> = match std::env::args().nth(1) {
        Some(argument) => Some(
            argument
                .parse()
                .context("resistance level must be an integer")?,
        ),
        None => None,
    };

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run(target_level))
}

async fn run(target_level: Option<u16>) -> anyhow::Result<()> {
    let config = config::load_config().unwrap_or_else(|error| {
        tracing::warn!("config load failed, using defaults: {}", error);
        AppConfig::default()
    });

    let peripheral = ble::find_bike(Duration::from_secs(config.scan_timeout_secs))
        .await
        .context("scan failed")?;
    let session = BlePeripheral::connect(peripheral)
        .await
        .context("connect failed")?;

    let (events_tx, events_rx) = crossbeam::channel::unbounded();

    let bike = match negotiator::negotiate(&session, config.device.range_override()).await {
        Ok(bike) => bike,
        Err(error) => {
            let _ = events_tx.send(MonitorEvent::SetupError(error.to_string()));
            return Err(error).context("negotiation failed");
        }
    };
    let descriptor = bike.descriptor.clone();
    let _ = events_tx.send(MonitorEvent::CapabilitiesResolved(descriptor.clone()));

    let mut adapter = NotificationAdapter::new(descriptor.dialect, events_tx.clone());
    if let Some(telemetry) = bike.telemetry.clone() {
        adapter.watch(telemetry).await?;
    } else {
        tracing::warn!("bike exposes no telemetry stream");
    }

    let mut controller = bike.control.clone().map(|control| {
        BikeController::new(
            descriptor.clone(),
            control,
            config.device.start_stop,
            Duration::from_millis(config.device.command_interval_ms),
        )
    });

    if let Some(controller) = controller.as_mut() {
        controller.start().await?;
        if let Some(level) = target_level {
            if let Err(error) = controller.try_set_resistance(level).await {
                let _ = events_tx.send(MonitorEvent::WriteError(error.to_string()));
            }
        }
    } else if target_level.is_some() {
        tracing::warn!("bike exposes no control characteristic, resistance argument ignored");
    }
    drop(events_tx);

    // Print events on a plain thread; the channel end closing stops it.
    let units = config.units;
    let printer = std::thread::spawn(move || {
        for event in events_rx.iter() {
            match event {
                MonitorEvent::Measurement { record, arrived_at } => {
                    println!(
                        "{} {}",
                        arrived_at.format("%H:%M:%S%.3f"),
                        format_record(&record, units)
                    );
                }
                MonitorEvent::CapabilitiesResolved(descriptor) => {
                    println!(
                        "{} bike | speed {} cadence {} power {} heart-rate {} | resistance {}..={} ({})",
                        descriptor.dialect,
                        mark(descriptor.speed),
                        mark(descriptor.cadence),
                        mark(descriptor.power),
                        mark(descriptor.heart_rate),
                        descriptor.min_resistance,
                        descriptor.max_resistance,
                        if descriptor.resistance_control {
                            "controllable"
                        } else {
                            "read-only"
                        }
                    );
                }
                MonitorEvent::SetupError(reason) => eprintln!("setup error: {}", reason),
                MonitorEvent::WriteError(reason) => eprintln!("write error: {}", reason),
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");

    if let Some(controller) = controller.as_mut() {
        if let Err(error) = controller.stop().await {
            tracing::warn!("stop command failed: {}", error);
        }
    }
    adapter.shutdown().await;
    session.disconnect().await;

    drop(adapter);
    let _ = printer.join();

    Ok(())
}

fn mark(supported: bool) -> &'static str {
    if supported {
        "yes"
    } else {
        "no"
    }
}

fn format_record(record: &MeasurementRecord, units: Units) -> String {
    let mut parts = Vec::new();
    if let Some(speed) = record.speed_kmh {
        let (value, unit) = units.convert_speed(speed);
        parts.push(format!("{:5.1} {}", value, unit));
    }
    if let Some(cadence) = record.cadence_rpm {
        parts.push(format!("{:5.1} rpm", cadence));
    }
    if let Some(power) = record.power_watts {
        parts.push(format!("{:5.1} W", power));
    }
    if let Some(heart_rate) = record.heart_rate_bpm {
        parts.push(format!("{:3} bpm", heart_rate));
    }
    if let Some(distance) = record.distance_km {
        let (value, unit) = units.convert_distance(distance);
        parts.push(format!("{:6.2} {}", value, unit));
    }
    if let Some(calories) = record.calories_kcal {
        parts.push(format!("{:4} kcal", calories));
    }
    if let Some(elapsed) = record.elapsed_time_s {
        parts.push(format!("{:02}:{:02}", elapsed / 60, elapsed % 60));
    }
    if let Some(level) = record.resistance_level {
        parts.push(format!("level {}", level));
    }
    if parts.is_empty() {
        return format!("raw [{}]", record.raw_hex);
    }
    parts.join(" | ")
}
