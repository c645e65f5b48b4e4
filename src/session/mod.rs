//! Session layer: transport abstraction, capability negotiation,
//! notification bridging, and the control write path.

pub mod adapter;
pub mod ble;
pub mod controller;
pub mod negotiator;
pub mod transport;

pub use adapter::{MonitorEvent, NotificationAdapter};
pub use controller::{BikeController, WriteGate, DEFAULT_COMMAND_INTERVAL};
pub use negotiator::{negotiate, NegotiatedBike, DEFAULT_CONSOLE_RANGE, DEFAULT_FTMS_RANGE};
pub use transport::{
    CharacteristicProps, NotificationStream, RemoteCharacteristic, RemotePeripheral,
    RemoteService, SessionError,
};
