//! Async GATT session abstraction.
//!
//! The negotiator, adapter, and controller operate on these traits rather
//! than on btleplug types directly, so a session can be driven by the real
//! transport binding in [`crate::session::ble`] or by an in-memory mock in
//! tests. The traits mirror what the transport guarantees: per-packet
//! delivery with per-characteristic FIFO ordering, no fragmentation.

use async_trait::async_trait;
use futures::stream::BoxStream;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Static capability flags a characteristic advertises.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CharacteristicProps {
    pub readable: bool,
    pub writable: bool,
    pub writable_without_ack: bool,
    pub notifiable: bool,
}

/// Stream of value-changed payloads for one characteristic.
pub type NotificationStream = BoxStream<'static, Vec<u8>>;

/// A connected peripheral exposing primary services.
#[async_trait]
pub trait RemotePeripheral: Send + Sync {
    /// Resolve a primary service by UUID.
    async fn primary_service(&self, service: Uuid)
        -> Result<Arc<dyn RemoteService>, SessionError>;
}

/// One resolved service exposing characteristics.
#[async_trait]
pub trait RemoteService: Send + Sync {
    fn uuid(&self) -> Uuid;

    /// Resolve a characteristic by UUID.
    async fn characteristic(
        &self,
        characteristic: Uuid,
    ) -> Result<Arc<dyn RemoteCharacteristic>, SessionError>;
}

/// One resolved characteristic.
#[async_trait]
pub trait RemoteCharacteristic: Send + Sync {
    fn uuid(&self) -> Uuid;

    fn props(&self) -> CharacteristicProps;

    /// Read the current value. Only valid for readable characteristics.
    async fn read_value(&self) -> Result<Vec<u8>, SessionError>;

    /// Write a value. A write in flight when the session drops is a write
    /// failure, never retried here.
    async fn write_value(&self, value: &[u8]) -> Result<(), SessionError>;

    /// Subscribe to value-changed notifications. The adapter holds at most
    /// one subscription per characteristic.
    async fn subscribe(&self) -> Result<NotificationStream, SessionError>;

    /// Tear down the subscription.
    async fn unsubscribe(&self) -> Result<(), SessionError>;
}

/// Errors from session setup, probing, and I/O.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Optional service or characteristic absent. Recoverable: narrows the
    /// capability set during negotiation.
    #[error("service or characteristic not found")]
    NotFound,

    /// Mandatory primary service missing or unreachable. Fatal to the
    /// connection attempt.
    #[error("setup failed: {0}")]
    Setup(String),

    /// Characteristic read failed
    #[error("read failed: {0}")]
    Read(String),

    /// Characteristic write failed. Surfaced to the caller, never silently
    /// retried.
    #[error("write failed: {0}")]
    Write(String),

    /// Subscribe or unsubscribe failed
    #[error("subscription failed: {0}")]
    Subscribe(String),
}
