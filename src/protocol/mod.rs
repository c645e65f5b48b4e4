//! Telemetry/control codec for BLE fitness bikes.
//!
//! Stateless throughout: decoding and encoding are pure functions of the
//! bytes and the session's dialect, selected once at negotiation time.

pub mod ftms;
pub mod iconsole;
pub mod registry;
pub mod types;

pub use ftms::StartStopOpcodes;
pub use types::{CapabilityDescriptor, ControlCommand, Dialect, EncodeError, MeasurementRecord};

/// Decode one telemetry frame according to the session's dialect.
///
/// Total: malformed input degrades to a partial record carrying the raw
/// header and hex dump, keeping the notification stream moving.
pub fn decode_frame(dialect: Dialect, data: &[u8]) -> MeasurementRecord {
    match dialect {
        Dialect::Ftms => ftms::decode_indoor_bike_data(data),
        Dialect::IConsole => iconsole::decode_console_frame(data),
    }
}

/// Encode a control command into the byte sequence the dialect expects.
///
/// `opcodes` selects the per-device start/stop pair for FTMS bikes and is
/// ignored by the console dialect.
pub fn encode_command(
    dialect: Dialect,
    command: &ControlCommand,
    opcodes: StartStopOpcodes,
) -> Result<Vec<u8>, EncodeError> {
    match dialect {
        Dialect::Ftms => ftms::encode_command(command, opcodes),
        Dialect::IConsole => iconsole::encode_command(command),
    }
}

/// Lowercase space-separated hex rendering of a frame, for diagnostics.
pub fn hex_dump(data: &[u8]) -> String {
    data.iter()
        .map(|byte| format!("{:02x}", byte))
        .collect::<Vec<_>>()
        .join(" ")
}
