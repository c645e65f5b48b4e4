//! FTMS-style telemetry frames and control commands.
//!
//! Frames open with a little-endian 16-bit flags word; each set bit
//! contributes one fixed-width field, in bit order. Fields the record does
//! not surface still advance the read cursor so later fields stay aligned.

use crate::protocol::hex_dump;
use crate::protocol::types::{ControlCommand, Dialect, EncodeError, MeasurementRecord};
use serde::{Deserialize, Serialize};

/// Flags word bit: instantaneous speed present (raw 0.01 km/h)
pub const FLAG_SPEED: u16 = 1 << 0;
/// Flags word bit: average speed present (raw 0.01 km/h)
pub const FLAG_AVG_SPEED: u16 = 1 << 1;
/// Flags word bit: instantaneous cadence present (raw 0.5 rpm)
pub const FLAG_CADENCE: u16 = 1 << 2;
/// Flags word bit: average cadence present (raw 0.5 rpm)
pub const FLAG_AVG_CADENCE: u16 = 1 << 3;
/// Flags word bit: total distance present (24-bit meters)
pub const FLAG_DISTANCE: u16 = 1 << 4;
/// Flags word bit: resistance level present (signed 16-bit)
pub const FLAG_RESISTANCE: u16 = 1 << 5;
/// Flags word bit: instantaneous power present (signed 16-bit watts)
pub const FLAG_POWER: u16 = 1 << 6;
/// Flags word bit: average power present (skipped, 2 bytes)
pub const FLAG_AVG_POWER: u16 = 1 << 7;
/// Flags word bit: expended energy group present (total kcal surfaced,
/// per-hour and per-minute skipped; 5 bytes)
pub const FLAG_ENERGY: u16 = 1 << 8;
/// Flags word bit: heart rate present (1 byte)
pub const FLAG_HEART_RATE: u16 = 1 << 9;
/// Flags word bit: metabolic equivalent present (skipped, 1 byte)
pub const FLAG_METABOLIC: u16 = 1 << 10;
/// Flags word bit: elapsed time present (16-bit seconds)
pub const FLAG_ELAPSED_TIME: u16 = 1 << 11;
/// Flags word bit: remaining time present (skipped, 2 bytes)
pub const FLAG_REMAINING_TIME: u16 = 1 << 12;

/// Control point opcode for setting the resistance level.
pub const SET_RESISTANCE_OPCODE: u8 = 0x04;

/// Advance `cursor` by `width` and return the consumed slice, or `None` when
/// the frame is too short for the field.
fn field<'a>(data: &'a [u8], cursor: &mut usize, width: usize) -> Option<&'a [u8]> {
    let end = cursor.checked_add(width)?;
    if end > data.len() {
        return None;
    }
    let bytes = &data[*cursor..end];
    *cursor = end;
    Some(bytes)
}

fn u16_le(bytes: &[u8]) -> u16 {
    u16::from_le_bytes([bytes[0], bytes[1]])
}

fn i16_le(bytes: &[u8]) -> i16 {
    i16::from_le_bytes([bytes[0], bytes[1]])
}

/// Decode one Indoor Bike Data frame.
///
/// Never fails: a frame too short for a flagged field yields the fields
/// decoded up to that point, so one malformed notification cannot stall the
/// stream. The raw bytes are preserved in the record's hex dump.
pub fn decode_indoor_bike_data(data: &[u8]) -> MeasurementRecord {
    let mut record = MeasurementRecord {
        raw_hex: hex_dump(data),
        ..Default::default()
    };

    if data.len() < 2 {
        return record;
    }

    let flags = u16::from_le_bytes([data[0], data[1]]);
    record.flags_raw = flags;
    let mut cursor = 2usize;

    // Instantaneous speed, 0.01 km/h units
    if flags & FLAG_SPEED != 0 {
        match field(data, &mut cursor, 2) {
            Some(bytes) => record.speed_kmh = Some(u16_le(bytes) as f32 / 100.0),
            None => return record,
        }
    }

    // Average speed, 0.01 km/h units
    if flags & FLAG_AVG_SPEED != 0 {
        match field(data, &mut cursor, 2) {
            Some(bytes) => record.avg_speed_kmh = Some(u16_le(bytes) as f32 / 100.0),
            None => return record,
        }
    }

    // Instantaneous cadence, 0.5 rpm units
    if flags & FLAG_CADENCE != 0 {
        match field(data, &mut cursor, 2) {
            Some(bytes) => record.cadence_rpm = Some(u16_le(bytes) as f32 * 0.5),
            None => return record,
        }
    }

    // Average cadence, 0.5 rpm units
    if flags & FLAG_AVG_CADENCE != 0 {
        match field(data, &mut cursor, 2) {
            Some(bytes) => record.avg_cadence_rpm = Some(u16_le(bytes) as f32 * 0.5),
            None => return record,
        }
    }

    // Total distance, 24-bit meters, normalized to km
    if flags & FLAG_DISTANCE != 0 {
        match field(data, &mut cursor, 3) {
            Some(bytes) => {
                let meters = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], 0]);
                record.distance_km = Some(meters as f32 / 1000.0);
            }
            None => return record,
        }
    }

    // Resistance level, signed 16-bit
    if flags & FLAG_RESISTANCE != 0 {
        match field(data, &mut cursor, 2) {
            Some(bytes) => record.resistance_level = Some(i16_le(bytes)),
            None => return record,
        }
    }

    // Instantaneous power, signed 16-bit watts
    if flags & FLAG_POWER != 0 {
        match field(data, &mut cursor, 2) {
            Some(bytes) => record.power_watts = Some(i16_le(bytes) as f32),
            None => return record,
        }
    }

    // Average power: not surfaced, cursor still advances
    if flags & FLAG_AVG_POWER != 0 && field(data, &mut cursor, 2).is_none() {
        return record;
    }

    // Expended energy group: total (surfaced), per hour, per minute
    if flags & FLAG_ENERGY != 0 {
        match field(data, &mut cursor, 5) {
            Some(bytes) => record.calories_kcal = Some(u16_le(bytes)),
            None => return record,
        }
    }

    // Heart rate, single byte
    if flags & FLAG_HEART_RATE != 0 {
        match field(data, &mut cursor, 1) {
            Some(bytes) => record.heart_rate_bpm = Some(u16::from(bytes[0])),
            None => return record,
        }
    }

    // Metabolic equivalent: not surfaced, cursor still advances
    if flags & FLAG_METABOLIC != 0 && field(data, &mut cursor, 1).is_none() {
        return record;
    }

    // Elapsed time, 16-bit seconds
    if flags & FLAG_ELAPSED_TIME != 0 {
        match field(data, &mut cursor, 2) {
            Some(bytes) => record.elapsed_time_s = Some(u32::from(u16_le(bytes))),
            None => return record,
        }
    }

    // Remaining time: not surfaced, cursor still advances
    if flags & FLAG_REMAINING_TIME != 0 {
        let _ = field(data, &mut cursor, 2);
    }

    record
}

/// Recompute the flags word implied by a record's present fields.
///
/// For frames whose flagged fields are all surfaced by the record, this
/// round-trips with [`decode_indoor_bike_data`].
pub fn flags_for(record: &MeasurementRecord) -> u16 {
    let mut flags = 0u16;
    if record.speed_kmh.is_some() {
        flags |= FLAG_SPEED;
    }
    if record.avg_speed_kmh.is_some() {
        flags |= FLAG_AVG_SPEED;
    }
    if record.cadence_rpm.is_some() {
        flags |= FLAG_CADENCE;
    }
    if record.avg_cadence_rpm.is_some() {
        flags |= FLAG_AVG_CADENCE;
    }
    if record.distance_km.is_some() {
        flags |= FLAG_DISTANCE;
    }
    if record.resistance_level.is_some() {
        flags |= FLAG_RESISTANCE;
    }
    if record.power_watts.is_some() {
        flags |= FLAG_POWER;
    }
    if record.calories_kcal.is_some() {
        flags |= FLAG_ENERGY;
    }
    if record.heart_rate_bpm.is_some() {
        flags |= FLAG_HEART_RATE;
    }
    if record.elapsed_time_s.is_some() {
        flags |= FLAG_ELAPSED_TIME;
    }
    flags
}

/// Start/stop byte sequences observed across FTMS-ish bikes. The hardware
/// disagrees, so the pair is selected per device rather than assumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartStopOpcodes {
    /// Start `[0x01]`, stop `[0x00]`
    Classic,
    /// Control-point opcodes: start `[0x07]`, stop `[0x08]`
    #[default]
    ControlPoint,
    /// Prefixed pair: start `[0x01, 0x01]`, stop `[0x01, 0x00]`
    Prefixed,
}

/// Encode a control command into its FTMS byte sequence.
///
/// `SetResistance` rejects levels that do not fit one unsigned byte;
/// commands a preset does not define fail with [`EncodeError::Unsupported`].
pub fn encode_command(
    command: &ControlCommand,
    opcodes: StartStopOpcodes,
) -> Result<Vec<u8>, EncodeError> {
    match (command, opcodes) {
        (ControlCommand::SetResistance(level), _) => {
            let byte = u8::try_from(*level).map_err(|_| EncodeError::ValueOutOfRange(*level))?;
            Ok(vec![SET_RESISTANCE_OPCODE, byte])
        }
        (ControlCommand::Start, StartStopOpcodes::Classic) => Ok(vec![0x01]),
        (ControlCommand::Stop, StartStopOpcodes::Classic) => Ok(vec![0x00]),
        (ControlCommand::Start, StartStopOpcodes::ControlPoint) => Ok(vec![0x07]),
        (ControlCommand::Stop, StartStopOpcodes::ControlPoint) => Ok(vec![0x08]),
        (ControlCommand::Start, StartStopOpcodes::Prefixed) => Ok(vec![0x01, 0x01]),
        (ControlCommand::Stop, StartStopOpcodes::Prefixed) => Ok(vec![0x01, 0x00]),
        (ControlCommand::RequestControl, StartStopOpcodes::ControlPoint) => Ok(vec![0x00]),
        (ControlCommand::Reset, StartStopOpcodes::ControlPoint) => Ok(vec![0x01]),
        (command, _) => Err(EncodeError::Unsupported {
            dialect: Dialect::Ftms,
            command: *command,
        }),
    }
}
