//! Static registry of known services, characteristics, feature bits, and
//! command opcodes.
//!
//! Pure lookup tables built into the binary; unknown identifiers resolve to
//! sentinel entries instead of failing.

use crate::protocol::types::Dialect;
use uuid::Uuid;

/// Fitness Machine Service UUID (0x1826)
pub const FTMS_SERVICE_UUID: Uuid = Uuid::from_u128(0x0000_1826_0000_1000_8000_0080_5f9b_34fb);

/// Indoor Bike Data Characteristic UUID (0x2AD2)
pub const INDOOR_BIKE_DATA_UUID: Uuid = Uuid::from_u128(0x0000_2ad2_0000_1000_8000_0080_5f9b_34fb);

/// Fitness Machine Control Point UUID (0x2AD9)
pub const FTMS_CONTROL_POINT_UUID: Uuid =
    Uuid::from_u128(0x0000_2ad9_0000_1000_8000_0080_5f9b_34fb);

/// Fitness Machine Feature UUID (0x2ACC)
pub const FTMS_FEATURE_UUID: Uuid = Uuid::from_u128(0x0000_2acc_0000_1000_8000_0080_5f9b_34fb);

/// Supported Resistance Level Range UUID (0x2AD6)
pub const RESISTANCE_RANGE_UUID: Uuid = Uuid::from_u128(0x0000_2ad6_0000_1000_8000_0080_5f9b_34fb);

/// Training Status UUID (0x2AD3)
pub const TRAINING_STATUS_UUID: Uuid = Uuid::from_u128(0x0000_2ad3_0000_1000_8000_0080_5f9b_34fb);

/// iConsole vendor service UUID (0xFFF0)
pub const CONSOLE_SERVICE_UUID: Uuid = Uuid::from_u128(0x0000_fff0_0000_1000_8000_0080_5f9b_34fb);

/// iConsole telemetry characteristic UUID (0xFFF1, notify)
pub const CONSOLE_DATA_UUID: Uuid = Uuid::from_u128(0x0000_fff1_0000_1000_8000_0080_5f9b_34fb);

/// iConsole command characteristic UUID (0xFFF2, write)
pub const CONSOLE_COMMAND_UUID: Uuid = Uuid::from_u128(0x0000_fff2_0000_1000_8000_0080_5f9b_34fb);

/// Heart Rate Service UUID (0x180D)
pub const HEART_RATE_SERVICE_UUID: Uuid =
    Uuid::from_u128(0x0000_180d_0000_1000_8000_0080_5f9b_34fb);

/// Heart Rate Measurement UUID (0x2A37)
pub const HEART_RATE_MEASUREMENT_UUID: Uuid =
    Uuid::from_u128(0x0000_2a37_0000_1000_8000_0080_5f9b_34fb);

/// Machine feature bitmap, first 32-bit word: cadence reporting (bit 1)
pub const FEATURE_CADENCE: u32 = 1 << 1;
/// Machine feature bitmap: total distance reporting (bit 2)
pub const FEATURE_TOTAL_DISTANCE: u32 = 1 << 2;
/// Machine feature bitmap: resistance level reporting (bit 7)
pub const FEATURE_RESISTANCE_LEVEL: u32 = 1 << 7;
/// Machine feature bitmap: heart rate reporting (bit 10)
pub const FEATURE_HEART_RATE: u32 = 1 << 10;
/// Machine feature bitmap: power reporting (bit 14)
pub const FEATURE_POWER: u32 = 1 << 14;

/// Target-setting bitmap, second 32-bit word: resistance target settable (bit 2)
pub const TARGET_RESISTANCE: u32 = 1 << 2;

/// Name and short description of a known characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacteristicInfo {
    pub name: &'static str,
    pub description: &'static str,
}

/// Human-readable name of a service. Total over the identifier space;
/// unknown services map to a sentinel.
pub fn service_name(id: Uuid) -> &'static str {
    match id {
        FTMS_SERVICE_UUID => "Fitness Machine",
        CONSOLE_SERVICE_UUID => "iConsole Console",
        HEART_RATE_SERVICE_UUID => "Heart Rate",
        _ => "Unknown Service",
    }
}

/// Name and description of a characteristic. Total over the identifier
/// space; unknown characteristics map to a sentinel.
pub fn characteristic_info(id: Uuid) -> CharacteristicInfo {
    match id {
        INDOOR_BIKE_DATA_UUID => CharacteristicInfo {
            name: "Indoor Bike Data",
            description: "Bitfield-indexed telemetry notification stream",
        },
        FTMS_CONTROL_POINT_UUID => CharacteristicInfo {
            name: "Fitness Machine Control Point",
            description: "Opcode/parameter control command sink",
        },
        FTMS_FEATURE_UUID => CharacteristicInfo {
            name: "Fitness Machine Feature",
            description: "32-bit machine feature and target-setting bitmaps",
        },
        RESISTANCE_RANGE_UUID => CharacteristicInfo {
            name: "Supported Resistance Level Range",
            description: "Minimum and maximum accepted resistance levels",
        },
        TRAINING_STATUS_UUID => CharacteristicInfo {
            name: "Training Status",
            description: "Machine-reported session state",
        },
        CONSOLE_DATA_UUID => CharacteristicInfo {
            name: "Console Data",
            description: "Fixed-layout telemetry notification stream",
        },
        CONSOLE_COMMAND_UUID => CharacteristicInfo {
            name: "Console Command",
            description: "Checksummed command packet sink",
        },
        HEART_RATE_MEASUREMENT_UUID => CharacteristicInfo {
            name: "Heart Rate Measurement",
            description: "Heart rate notification stream",
        },
        _ => CharacteristicInfo {
            name: "Unknown Characteristic",
            description: "Not in the registry",
        },
    }
}

/// Name of a machine feature bitmap bit (first 32-bit word), if defined.
pub fn feature_bit_name(bit: u8) -> Option<&'static str> {
    match bit {
        0 => Some("Average Speed"),
        1 => Some("Cadence"),
        2 => Some("Total Distance"),
        3 => Some("Inclination"),
        4 => Some("Elevation Gain"),
        5 => Some("Pace"),
        6 => Some("Step Count"),
        7 => Some("Resistance Level"),
        8 => Some("Stride Count"),
        9 => Some("Expended Energy"),
        10 => Some("Heart Rate Measurement"),
        11 => Some("Metabolic Equivalent"),
        12 => Some("Elapsed Time"),
        13 => Some("Remaining Time"),
        14 => Some("Power Measurement"),
        15 => Some("Force on Belt and Power Output"),
        16 => Some("User Data Retention"),
        _ => None,
    }
}

/// Name of a control opcode (FTMS) or command class (iConsole), for
/// diagnostic display.
pub fn opcode_name(dialect: Dialect, opcode: u8) -> &'static str {
    match dialect {
        Dialect::Ftms => match opcode {
            0x00 => "Request Control",
            0x01 => "Reset",
            0x04 => "Set Target Resistance Level",
            0x05 => "Set Target Power",
            0x07 => "Start or Resume",
            0x08 => "Stop or Pause",
            _ => "Unknown Opcode",
        },
        Dialect::IConsole => match opcode {
            0xA0 => "Handshake",
            0xA1 => "Status Poll",
            0xA5 => "Run Control",
            0xA6 => "Set Resistance Level",
            _ => "Unknown Command Class",
        },
    }
}
