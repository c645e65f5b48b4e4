//! BikeLink - BLE fitness bike telemetry and control
//!
//! Decodes the telemetry notification streams of BLE indoor bikes, encodes
//! outbound control commands, and negotiates per-device capabilities once at
//! connection time. Two incompatible vendor layouts are supported: the
//! standard bitfield-indexed indoor-bike format and the iConsole fixed
//! layout with its checksummed command packets.

pub mod config;
pub mod protocol;
pub mod session;

// Re-export commonly used types
pub use config::{load_config, AppConfig, DeviceProfile, Units};
pub use protocol::{
    decode_frame, encode_command, CapabilityDescriptor, ControlCommand, Dialect,
    MeasurementRecord, StartStopOpcodes,
};
pub use session::{negotiate, BikeController, MonitorEvent, NotificationAdapter, SessionError};
