//! iConsole-style telemetry frames and checksummed command packets.
//!
//! Telemetry frames come in exactly two lengths and carry every field in a
//! fixed order after a 2-byte header. Each payload byte is transmitted with a
//! +1 offset that must be removed before any arithmetic; the consoles use
//! the offset as a data-validity marker, so it is preserved here exactly as
//! observed rather than treated as a bug. Two-byte quantities combine as
//! `high * 100 + low`.
//!
//! Command packets are `[0xF0, class, length, payload.., checksum]` with the
//! checksum equal to the sum of all preceding bytes modulo 256.

use crate::protocol::hex_dump;
use crate::protocol::types::{ControlCommand, Dialect, EncodeError, MeasurementRecord};

/// Total length of a standard telemetry frame.
pub const STANDARD_FRAME_LEN: usize = 19;
/// Total length of an extended telemetry frame (adds a counter byte after
/// the header and a reserved byte at the tail).
pub const EXTENDED_FRAME_LEN: usize = 21;

/// Leading sync byte of every command packet.
pub const PACKET_SYNC: u8 = 0xF0;

/// Command class: handshake (ping / init)
pub const CLASS_HANDSHAKE: u8 = 0xA0;
/// Command class: status poll
pub const CLASS_STATUS: u8 = 0xA1;
/// Command class: run control (start / stop)
pub const CLASS_RUN: u8 = 0xA5;
/// Command class: resistance level
pub const CLASS_RESISTANCE: u8 = 0xA6;

/// Remove the +1 wire offset from one payload byte. A zero byte violates
/// the protocol; saturating keeps the decoder total.
fn strip_offset(byte: u8) -> u8 {
    byte.saturating_sub(1)
}

/// Combine a two-byte quantity after offset removal.
fn pair(high: u8, low: u8) -> u16 {
    u16::from(strip_offset(high)) * 100 + u16::from(strip_offset(low))
}

/// Decode one console telemetry frame.
///
/// Frames of any length other than the two known layouts yield only the raw
/// header and hex dump; decoding never fails outright.
pub fn decode_console_frame(data: &[u8]) -> MeasurementRecord {
    let mut record = MeasurementRecord {
        raw_hex: hex_dump(data),
        ..Default::default()
    };

    if data.len() >= 2 {
        record.flags_raw = u16::from_le_bytes([data[0], data[1]]);
    }

    if data.len() != STANDARD_FRAME_LEN && data.len() != EXTENDED_FRAME_LEN {
        return record;
    }

    let mut cursor = 2usize;

    // Extended frames carry a sequence byte right after the header. The
    // reference frames do not cover it, so the offset correction is not
    // generalized to it: surfaced raw.
    if data.len() == EXTENDED_FRAME_LEN {
        record.counter = Some(data[cursor]);
        cursor += 1;
    }

    // Elapsed time: day/hour/minute/second components. On top of the wire
    // offset the components themselves are 1-based, so each byte sheds two.
    let day = u32::from(strip_offset(data[cursor]).saturating_sub(1));
    let hour = u32::from(strip_offset(data[cursor + 1]).saturating_sub(1));
    let minute = u32::from(strip_offset(data[cursor + 2]).saturating_sub(1));
    let second = u32::from(strip_offset(data[cursor + 3]).saturating_sub(1));
    record.elapsed_time_s = Some(((day * 24 + hour) * 60 + minute) * 60 + second);
    cursor += 4;

    // Speed, 0.1 km/h resolution
    record.speed_kmh = Some(f32::from(pair(data[cursor], data[cursor + 1])) / 10.0);
    cursor += 2;

    // Cadence, whole rpm
    record.cadence_rpm = Some(f32::from(pair(data[cursor], data[cursor + 1])));
    cursor += 2;

    // Distance, 0.1 km resolution (already km, no normalization needed)
    record.distance_km = Some(f32::from(pair(data[cursor], data[cursor + 1])) / 10.0);
    cursor += 2;

    // Calories, whole kcal
    record.calories_kcal = Some(pair(data[cursor], data[cursor + 1]));
    cursor += 2;

    // Heart rate, whole bpm
    record.heart_rate_bpm = Some(pair(data[cursor], data[cursor + 1]));
    cursor += 2;

    // Power, 0.1 W resolution
    record.power_watts = Some(f32::from(pair(data[cursor], data[cursor + 1])) / 10.0);
    cursor += 2;

    // Resistance level, single byte
    record.resistance_level = Some(i16::from(strip_offset(data[cursor])));

    // Extended frames end with a reserved byte; nothing to decode there.

    record
}

/// Sum of all bytes modulo 256, the console's packet validity marker.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |sum, byte| sum.wrapping_add(*byte))
}

/// Assemble a command packet and append its checksum.
fn packet(class: u8, length: u8, payload: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(payload.len() + 4);
    bytes.push(PACKET_SYNC);
    bytes.push(class);
    bytes.push(length);
    bytes.extend_from_slice(payload);
    let sum = checksum(&bytes);
    bytes.push(sum);
    bytes
}

/// Keep-alive probe: `F0 A0 01 01 92`.
pub fn encode_ping() -> Vec<u8> {
    packet(CLASS_HANDSHAKE, 0x01, &[0x01])
}

/// Init handshake: `F0 A0 02 02 94`.
pub fn encode_init() -> Vec<u8> {
    packet(CLASS_HANDSHAKE, 0x02, &[0x02])
}

/// Status poll: `F0 A1 01 01 93`.
pub fn encode_status_poll() -> Vec<u8> {
    packet(CLASS_STATUS, 0x01, &[0x01])
}

/// Start the session: `F0 A5 01 01 02 99`.
pub fn encode_start() -> Vec<u8> {
    packet(CLASS_RUN, 0x01, &[0x01, 0x02])
}

/// Stop the session: `F0 A5 01 01 04 9B`.
pub fn encode_stop() -> Vec<u8> {
    packet(CLASS_RUN, 0x01, &[0x01, 0x04])
}

/// Set the resistance level. The level byte is emitted as-is; the checksum
/// is computed, never looked up, since the level is a free parameter.
pub fn encode_set_resistance(level: u16) -> Result<Vec<u8>, EncodeError> {
    let byte = u8::try_from(level).map_err(|_| EncodeError::ValueOutOfRange(level))?;
    Ok(packet(CLASS_RESISTANCE, 0x01, &[0x01, byte]))
}

/// Packets the console expects after connecting, in send order.
pub fn handshake_packets() -> Vec<Vec<u8>> {
    vec![encode_ping(), encode_init(), encode_status_poll()]
}

/// Encode a control command into its console packet.
pub fn encode_command(command: &ControlCommand) -> Result<Vec<u8>, EncodeError> {
    match command {
        ControlCommand::SetResistance(level) => encode_set_resistance(*level),
        ControlCommand::Start => Ok(encode_start()),
        ControlCommand::Stop => Ok(encode_stop()),
        ControlCommand::Ping => Ok(encode_ping()),
        ControlCommand::RequestControl => Ok(encode_init()),
        ControlCommand::Status => Ok(encode_status_poll()),
        ControlCommand::Reset => Err(EncodeError::Unsupported {
            dialect: Dialect::IConsole,
            command: *command,
        }),
    }
}
