//! Core codec types: telemetry records, control commands, capabilities.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Vendor byte-layout family for telemetry and control frames.
///
/// The two families are mutually incompatible; the dialect is fixed once at
/// negotiation time and never re-sniffed per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// GATT Indoor Bike Data style: bitfield-indexed variable layout,
    /// opcode/parameter control commands
    Ftms,
    /// iConsole style: fixed-length frames with a per-byte wire offset,
    /// checksummed control packets
    IConsole,
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::Ftms => write!(f, "FTMS"),
            Dialect::IConsole => write!(f, "iConsole"),
        }
    }
}

/// Decoded output of one telemetry frame.
///
/// Every field except `flags_raw` is optional: a field is present exactly
/// when the frame carried it. Absent fields stay `None` here; zero-filling
/// for display is the consumer's choice, not the decoder's.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MeasurementRecord {
    /// Raw 16-bit flags word (FTMS) or frame header (iConsole)
    pub flags_raw: u16,
    /// Instantaneous speed in km/h
    pub speed_kmh: Option<f32>,
    /// Average speed in km/h
    pub avg_speed_kmh: Option<f32>,
    /// Instantaneous cadence in RPM (half-unit precision)
    pub cadence_rpm: Option<f32>,
    /// Average cadence in RPM
    pub avg_cadence_rpm: Option<f32>,
    /// Total distance in km, normalized regardless of dialect
    pub distance_km: Option<f32>,
    /// Resistance level in dialect units
    pub resistance_level: Option<i16>,
    /// Instantaneous power in watts
    pub power_watts: Option<f32>,
    /// Heart rate in BPM
    pub heart_rate_bpm: Option<u16>,
    /// Elapsed time in seconds
    pub elapsed_time_s: Option<u32>,
    /// Expended energy in kcal
    pub calories_kcal: Option<u16>,
    /// Frame sequence byte (iConsole extended frames, diagnostic only)
    pub counter: Option<u8>,
    /// Hex dump of the raw frame, kept for diagnostics
    pub raw_hex: String,
}

/// Semantic request to affect bike state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Set the resistance level, in dialect units. Range validation against
    /// the negotiated [`CapabilityDescriptor`] happens above the encoder.
    SetResistance(u16),
    /// Start or resume the session
    Start,
    /// Stop the session
    Stop,
    /// Console keep-alive probe
    Ping,
    /// Ask the machine for control (FTMS) / console init handshake
    RequestControl,
    /// Reset the machine
    Reset,
    /// Console status poll
    Status,
}

impl std::fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControlCommand::SetResistance(level) => write!(f, "set resistance {}", level),
            ControlCommand::Start => write!(f, "start"),
            ControlCommand::Stop => write!(f, "stop"),
            ControlCommand::Ping => write!(f, "ping"),
            ControlCommand::RequestControl => write!(f, "request control"),
            ControlCommand::Reset => write!(f, "reset"),
            ControlCommand::Status => write!(f, "status"),
        }
    }
}

/// Result of capability negotiation for one connected session.
///
/// Immutable for the session's lifetime. Characteristic handles are owned by
/// the session, never by the descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapabilityDescriptor {
    /// Decoder/encoder profile selected for the session
    pub dialect: Dialect,
    /// Speed telemetry available
    pub speed: bool,
    /// Cadence telemetry available
    pub cadence: bool,
    /// Power telemetry available
    pub power: bool,
    /// Heart rate telemetry available
    pub heart_rate: bool,
    /// A write-capable control characteristic was resolved
    pub resistance_control: bool,
    /// Lowest accepted resistance level, dialect units
    pub min_resistance: i16,
    /// Highest accepted resistance level, dialect units
    pub max_resistance: i16,
}

impl CapabilityDescriptor {
    /// Whether a resistance level lies within the negotiated range.
    pub fn resistance_in_range(&self, level: u16) -> bool {
        let level = i32::from(level);
        level >= i32::from(self.min_resistance) && level <= i32::from(self.max_resistance)
    }
}

/// Errors from the command encoder. These signal caller bugs and fail
/// loudly; the encoder never clamps, wraps, or truncates.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    /// Parameter does not fit the single-byte field width
    #[error("resistance level {0} does not fit in one byte")]
    ValueOutOfRange(u16),

    /// The dialect has no byte sequence for this command
    #[error("{dialect} defines no encoding for {command}")]
    Unsupported {
        dialect: Dialect,
        command: ControlCommand,
    },
}
