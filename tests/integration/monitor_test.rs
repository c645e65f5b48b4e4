//! Notification adapter end-to-end: pushed frames come out as timestamped
//! measurement events.

use crate::mock_session::{console_bike, console_zero_frame, ftms_bike_full, MockCharacteristic};
use bikelink::protocol::registry::INDOOR_BIKE_DATA_UUID;
use bikelink::session::adapter::{MonitorEvent, NotificationAdapter};
use bikelink::session::negotiator::negotiate;
use chrono::Utc;
use crossbeam::channel::Receiver;
use std::sync::atomic::Ordering;
use std::time::Duration;

async fn next_event(events: &Receiver<MonitorEvent>) -> MonitorEvent {
    for _ in 0..100 {
        if let Ok(event) = events.try_recv() {
            return event;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("no event arrived within the timeout");
}

#[tokio::test]
async fn test_console_frames_flow_through() {
    let (peripheral, telemetry, _command) = console_bike();
    let bike = negotiate(&peripheral, None).await.unwrap();

    let (events_tx, events_rx) = crossbeam::channel::unbounded();
    let mut adapter = NotificationAdapter::new(bike.descriptor.dialect, events_tx);
    adapter.watch(bike.telemetry.clone().unwrap()).await.unwrap();
    assert_eq!(adapter.subscription_count(), 1);

    let before = Utc::now();
    telemetry.push(console_zero_frame());

    match next_event(&events_rx).await {
        MonitorEvent::Measurement { record, arrived_at } => {
            assert_eq!(record.elapsed_time_s, Some(0));
            assert_eq!(record.speed_kmh, Some(0.0));
            assert!(arrived_at >= before);
            assert!(arrived_at <= Utc::now());
        }
        other => panic!("unexpected event: {:?}", other),
    }

    adapter.shutdown().await;
    assert_eq!(telemetry.unsubscribe_count.load(Ordering::SeqCst), 1);
    assert_eq!(adapter.subscription_count(), 0);
}

#[tokio::test]
async fn test_ftms_frames_flow_through() {
    let (peripheral, telemetry, _control) = ftms_bike_full();
    let bike = negotiate(&peripheral, None).await.unwrap();

    let (events_tx, events_rx) = crossbeam::channel::unbounded();
    let mut adapter = NotificationAdapter::new(bike.descriptor.dialect, events_tx);
    adapter.watch(bike.telemetry.clone().unwrap()).await.unwrap();

    // Speed 25.0 km/h, cadence 80.0 rpm, power 150 W
    telemetry.push(vec![0x45, 0x00, 0xC4, 0x09, 0xA0, 0x00, 0x96, 0x00]);

    match next_event(&events_rx).await {
        MonitorEvent::Measurement { record, .. } => {
            assert!((record.speed_kmh.unwrap() - 25.0).abs() < 0.01);
            assert!((record.cadence_rpm.unwrap() - 80.0).abs() < 0.01);
            assert_eq!(record.power_watts, Some(150.0));
        }
        other => panic!("unexpected event: {:?}", other),
    }

    adapter.shutdown().await;
}

#[tokio::test]
async fn test_malformed_frame_degrades_without_stalling() {
    let (peripheral, telemetry, _control) = ftms_bike_full();
    let bike = negotiate(&peripheral, None).await.unwrap();

    let (events_tx, events_rx) = crossbeam::channel::unbounded();
    let mut adapter = NotificationAdapter::new(bike.descriptor.dialect, events_tx);
    adapter.watch(bike.telemetry.clone().unwrap()).await.unwrap();

    // Power flagged but truncated, then a healthy frame: both must arrive
    telemetry.push(vec![0x41, 0x00, 0xC4, 0x09]);
    telemetry.push(vec![0x01, 0x00, 0xB8, 0x0B]);

    match next_event(&events_rx).await {
        MonitorEvent::Measurement { record, .. } => {
            assert!(record.speed_kmh.is_some());
            assert!(record.power_watts.is_none());
            assert!(!record.raw_hex.is_empty());
        }
        other => panic!("unexpected event: {:?}", other),
    }
    match next_event(&events_rx).await {
        MonitorEvent::Measurement { record, .. } => {
            assert!((record.speed_kmh.unwrap() - 30.0).abs() < 0.01);
        }
        other => panic!("unexpected event: {:?}", other),
    }

    adapter.shutdown().await;
}

#[tokio::test]
async fn test_unsubscribe_failure_is_swallowed() {
    let telemetry = MockCharacteristic::failing_unsubscribe(INDOOR_BIKE_DATA_UUID);

    let (events_tx, _events_rx) = crossbeam::channel::unbounded();
    let mut adapter = NotificationAdapter::new(bikelink::protocol::Dialect::Ftms, events_tx);
    adapter.watch(telemetry.clone()).await.unwrap();

    // Best-effort cleanup: the failure is logged, not returned
    adapter.shutdown().await;
    assert_eq!(telemetry.unsubscribe_count.load(Ordering::SeqCst), 1);
}
