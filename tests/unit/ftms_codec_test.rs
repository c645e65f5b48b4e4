//! Unit tests for the bitfield-indexed frame codec.

use bikelink::protocol::ftms::{
    decode_indoor_bike_data, encode_command, flags_for, StartStopOpcodes,
};
use bikelink::protocol::{decode_frame, ControlCommand, Dialect, EncodeError};

#[test]
fn test_decode_minimal_frame() {
    // Flags: 0x0001 (instantaneous speed), speed 0
    let data = [0x01, 0x00, 0x00, 0x00];
    let record = decode_indoor_bike_data(&data);

    assert_eq!(record.speed_kmh, Some(0.0));
    assert!(record.power_watts.is_none());
    assert!(record.cadence_rpm.is_none());
}

#[test]
fn test_decode_empty_flags_has_no_fields() {
    // Flags: 0x0000, nothing follows
    let data = [0x00, 0x00];
    let record = decode_indoor_bike_data(&data);

    assert_eq!(record.flags_raw, 0);
    assert_eq!(flags_for(&record), 0);
    assert!(record.speed_kmh.is_none());
}

#[test]
fn test_decode_speed_cadence_power_vector() {
    // Flags: 0b0000_0000_0100_0101 (speed + cadence + power)
    // Speed: 2500 = 25.0 km/h, cadence: 160 = 80.0 rpm, power: 150 W
    let data = [0x45, 0x00, 0xC4, 0x09, 0xA0, 0x00, 0x96, 0x00];
    let record = decode_frame(Dialect::Ftms, &data);

    assert!((record.speed_kmh.unwrap() - 25.0).abs() < 0.01);
    assert!((record.cadence_rpm.unwrap() - 80.0).abs() < 0.01);
    assert_eq!(record.power_watts, Some(150.0));
    assert!(record.avg_speed_kmh.is_none());
    assert!(record.avg_cadence_rpm.is_none());
    assert!(record.distance_km.is_none());
    assert!(record.resistance_level.is_none());
}

#[test]
fn test_decode_half_unit_cadence() {
    // Flags: 0x0004 (cadence only), 161 raw = 80.5 rpm
    let data = [0x04, 0x00, 0xA1, 0x00];
    let record = decode_indoor_bike_data(&data);

    assert_eq!(record.cadence_rpm, Some(80.5));
}

#[test]
fn test_decode_negative_power() {
    // Flags: 0x0040 (power only), -50 W
    let data = [0x40, 0x00, 0xCE, 0xFF];
    let record = decode_indoor_bike_data(&data);

    assert_eq!(record.power_watts, Some(-50.0));
}

#[test]
fn test_decode_average_fields() {
    // Flags: 0x000A (average speed + average cadence)
    let mut data = vec![0x0A, 0x00];
    data.extend_from_slice(&2400u16.to_le_bytes()); // avg speed 24.0
    data.extend_from_slice(&150u16.to_le_bytes()); // avg cadence 75.0
    let record = decode_indoor_bike_data(&data);

    assert!((record.avg_speed_kmh.unwrap() - 24.0).abs() < 0.01);
    assert!((record.avg_cadence_rpm.unwrap() - 75.0).abs() < 0.01);
    assert!(record.speed_kmh.is_none());
}

#[test]
fn test_decode_resistance_and_distance() {
    // Flags: 0x0030 (distance + resistance)
    let data = [0x30, 0x00, 0x10, 0x27, 0x00, 0x0C, 0x00];
    let record = decode_indoor_bike_data(&data);

    // 10000 m -> 10 km
    assert!((record.distance_km.unwrap() - 10.0).abs() < 0.001);
    assert_eq!(record.resistance_level, Some(12));
}

#[test]
fn test_decode_energy_heart_rate_elapsed() {
    // Flags: 0x0B00 (energy group + heart rate + elapsed time)
    let mut data = vec![0x00, 0x0B];
    data.extend_from_slice(&320u16.to_le_bytes()); // total kcal
    data.extend_from_slice(&[0x00, 0x00, 0x00]); // kcal/hr + kcal/min, skipped
    data.push(152); // heart rate
    data.extend_from_slice(&1800u16.to_le_bytes()); // elapsed seconds
    let record = decode_indoor_bike_data(&data);

    assert_eq!(record.calories_kcal, Some(320));
    assert_eq!(record.heart_rate_bpm, Some(152));
    assert_eq!(record.elapsed_time_s, Some(1800));
}

#[test]
fn test_decode_advances_past_unsurfaced_fields() {
    // Flags: 0x1480 (average power + metabolic equivalent + remaining time).
    // None of the three is surfaced, but all must be consumed in order.
    let data = [0x80, 0x14, 0x2C, 0x01, 0x08, 0x3C, 0x00];
    let record = decode_indoor_bike_data(&data);

    assert!(record.power_watts.is_none());
    assert!(record.elapsed_time_s.is_none());
    assert_eq!(record.flags_raw, 0x1480);
}

#[test]
fn test_truncated_frame_returns_partial_record() {
    // Power flagged but its bytes are missing; speed and cadence survive
    let data = [0x45, 0x00, 0xC4, 0x09, 0xA0, 0x00];
    let record = decode_indoor_bike_data(&data);

    assert!(record.speed_kmh.is_some());
    assert!(record.cadence_rpm.is_some());
    assert!(record.power_watts.is_none());
}

#[test]
fn test_truncated_mid_field_returns_partial_record() {
    // Cadence flagged with only one of two bytes present
    let data = [0x05, 0x00, 0xC4, 0x09, 0xA0];
    let record = decode_indoor_bike_data(&data);

    assert!(record.speed_kmh.is_some());
    assert!(record.cadence_rpm.is_none());
}

#[test]
fn test_one_byte_frame_keeps_hex_dump_only() {
    let record = decode_indoor_bike_data(&[0x45]);

    assert_eq!(record.flags_raw, 0);
    assert_eq!(record.raw_hex, "45");
    assert_eq!(flags_for(&record), 0);
}

#[test]
fn test_flags_round_trip_for_surfaced_fields() {
    let frames: [&[u8]; 4] = [
        &[0x45, 0x00, 0xC4, 0x09, 0xA0, 0x00, 0x96, 0x00],
        &[0x01, 0x00, 0x00, 0x00],
        &[0x30, 0x00, 0x10, 0x27, 0x00, 0x0C, 0x00],
        &[0x04, 0x00, 0xA1, 0x00],
    ];

    for frame in frames {
        let record = decode_indoor_bike_data(frame);
        assert_eq!(flags_for(&record), record.flags_raw, "frame {:?}", frame);
    }
}

#[test]
fn test_encode_set_resistance_levels_round_trip() {
    for level in 0u16..=255 {
        let bytes =
            encode_command(&ControlCommand::SetResistance(level), StartStopOpcodes::Classic)
                .unwrap();
        assert_eq!(bytes[0], 0x04);
        assert_eq!(u16::from(bytes[1]), level);
    }
}

#[test]
fn test_encode_set_resistance_out_of_byte_range() {
    for level in [256u16, 1000, u16::MAX] {
        let result = encode_command(
            &ControlCommand::SetResistance(level),
            StartStopOpcodes::ControlPoint,
        );
        assert_eq!(result, Err(EncodeError::ValueOutOfRange(level)));
    }
}

#[test]
fn test_encode_request_control_and_reset() {
    let request =
        encode_command(&ControlCommand::RequestControl, StartStopOpcodes::ControlPoint).unwrap();
    let reset = encode_command(&ControlCommand::Reset, StartStopOpcodes::ControlPoint).unwrap();

    assert_eq!(request, vec![0x00]);
    assert_eq!(reset, vec![0x01]);
}

#[test]
fn test_encode_request_control_other_presets_unsupported() {
    for preset in [StartStopOpcodes::Classic, StartStopOpcodes::Prefixed] {
        let result = encode_command(&ControlCommand::RequestControl, preset);
        assert!(matches!(result, Err(EncodeError::Unsupported { .. })));
    }
}
