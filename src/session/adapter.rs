//! Notification adapter: value-changed events in, decoded records out.
//!
//! Owns the per-characteristic subscription bookkeeping for one session.
//! Each incoming frame is decoded with the session's fixed dialect, stamped
//! with its arrival time, and forwarded on the event channel.

use crate::protocol;
use crate::protocol::types::{CapabilityDescriptor, Dialect, MeasurementRecord};
use crate::session::transport::{RemoteCharacteristic, SessionError};
use chrono::{DateTime, Utc};
use crossbeam::channel::Sender;
use futures::StreamExt;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Events forwarded to display/aggregation collaborators.
#[derive(Debug, Clone)]
pub enum MonitorEvent {
    /// One decoded telemetry frame
    Measurement {
        record: MeasurementRecord,
        arrived_at: DateTime<Utc>,
    },
    /// Negotiation finished for the session
    CapabilitiesResolved(CapabilityDescriptor),
    /// Mandatory session setup failed
    SetupError(String),
    /// A control write failed
    WriteError(String),
}

/// Bridges a session's notification streams onto the event channel.
pub struct NotificationAdapter {
    dialect: Dialect,
    events: Sender<MonitorEvent>,
    subscribed: Vec<Arc<dyn RemoteCharacteristic>>,
    tasks: Vec<JoinHandle<()>>,
}

impl NotificationAdapter {
    pub fn new(dialect: Dialect, events: Sender<MonitorEvent>) -> Self {
        Self {
            dialect,
            events,
            subscribed: Vec::new(),
            tasks: Vec::new(),
        }
    }

    /// Subscribe once to a telemetry characteristic and start decoding its
    /// notifications.
    pub async fn watch(
        &mut self,
        characteristic: Arc<dyn RemoteCharacteristic>,
    ) -> Result<(), SessionError> {
        let mut stream = characteristic.subscribe().await?;
        self.subscribed.push(Arc::clone(&characteristic));

        let dialect = self.dialect;
        let events = self.events.clone();
        let uuid = characteristic.uuid();

        let task = tokio::spawn(async move {
            while let Some(frame) = stream.next().await {
                let record = protocol::decode_frame(dialect, &frame);
                let event = MonitorEvent::Measurement {
                    record,
                    arrived_at: Utc::now(),
                };
                if events.send(event).is_err() {
                    // Receiver gone; nothing left to forward to.
                    break;
                }
            }
            tracing::debug!("notification stream for {} ended", uuid);
        });
        self.tasks.push(task);

        Ok(())
    }

    /// Number of characteristics currently subscribed.
    pub fn subscription_count(&self) -> usize {
        self.subscribed.len()
    }

    /// Tear down every subscription this adapter opened. Unsubscribe
    /// failures are logged and swallowed; cleanup is best-effort.
    pub async fn shutdown(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
        for characteristic in self.subscribed.drain(..) {
            if let Err(error) = characteristic.unsubscribe().await {
                tracing::warn!("unsubscribe of {} failed: {}", characteristic.uuid(), error);
            }
        }
    }
}
