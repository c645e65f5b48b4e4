//! Capability negotiation against a connected peripheral.
//!
//! Runs once per connection: probes the known services and characteristics
//! sequentially, decodes the feature bitmap and resistance range where the
//! bike publishes them, and fixes the dialect for the session. Absence of
//! anything optional narrows the capability set; only a missing primary
//! service is fatal.

use crate::protocol::registry::{
    characteristic_info, CONSOLE_COMMAND_UUID, CONSOLE_DATA_UUID, CONSOLE_SERVICE_UUID,
    FEATURE_CADENCE, FEATURE_HEART_RATE, FEATURE_POWER, FTMS_CONTROL_POINT_UUID,
    FTMS_FEATURE_UUID, FTMS_SERVICE_UUID, INDOOR_BIKE_DATA_UUID, RESISTANCE_RANGE_UUID,
    TARGET_RESISTANCE,
};
use crate::protocol::types::{CapabilityDescriptor, Dialect};
use crate::session::transport::{
    RemoteCharacteristic, RemotePeripheral, RemoteService, SessionError,
};
use std::sync::Arc;

/// Resistance span assumed for FTMS bikes that do not publish a range.
pub const DEFAULT_FTMS_RANGE: (i16, i16) = (1, 20);
/// Resistance span assumed for console bikes (typical console level span).
pub const DEFAULT_CONSOLE_RANGE: (i16, i16) = (1, 32);

/// Negotiated handles for one session.
///
/// The descriptor is immutable for the session's lifetime. Characteristic
/// handles live here, never inside the descriptor.
pub struct NegotiatedBike {
    pub descriptor: CapabilityDescriptor,
    /// Telemetry notification source, when the bike exposes one
    pub telemetry: Option<Arc<dyn RemoteCharacteristic>>,
    /// Write-capable control sink, when the bike exposes one
    pub control: Option<Arc<dyn RemoteCharacteristic>>,
}

/// Probe the peripheral and assemble its capability descriptor.
///
/// `range_override` wins over anything the bike reports, for hardware whose
/// published range is known to be wrong.
pub async fn negotiate(
    peripheral: &dyn RemotePeripheral,
    range_override: Option<(i16, i16)>,
) -> Result<NegotiatedBike, SessionError> {
    match peripheral.primary_service(FTMS_SERVICE_UUID).await {
        Ok(service) => negotiate_ftms(service, range_override).await,
        Err(SessionError::NotFound) => match peripheral.primary_service(CONSOLE_SERVICE_UUID).await
        {
            Ok(service) => negotiate_console(service, range_override).await,
            Err(SessionError::NotFound) => Err(SessionError::Setup(
                "no supported bike service advertised".to_string(),
            )),
            Err(other) => Err(other),
        },
        Err(other) => Err(other),
    }
}

/// Probe one optional characteristic; any failure maps to absence.
async fn optional_characteristic(
    service: &Arc<dyn RemoteService>,
    characteristic: uuid::Uuid,
) -> Option<Arc<dyn RemoteCharacteristic>> {
    match service.characteristic(characteristic).await {
        Ok(resolved) => {
            tracing::debug!("resolved {}", characteristic_info(characteristic).name);
            Some(resolved)
        }
        Err(SessionError::NotFound) => None,
        Err(error) => {
            tracing::debug!(
                "optional probe of {} failed: {}",
                characteristic_info(characteristic).name,
                error
            );
            None
        }
    }
}

async fn negotiate_ftms(
    service: Arc<dyn RemoteService>,
    range_override: Option<(i16, i16)>,
) -> Result<NegotiatedBike, SessionError> {
    let telemetry = optional_characteristic(&service, INDOOR_BIKE_DATA_UUID)
        .await
        .filter(|characteristic| characteristic.props().notifiable);

    let control = optional_characteristic(&service, FTMS_CONTROL_POINT_UUID)
        .await
        .filter(|characteristic| {
            let props = characteristic.props();
            props.writable || props.writable_without_ack
        });

    // Until the feature bitmap says otherwise, a telemetry stream is assumed
    // to carry the per-frame flagged fields and no heart rate.
    let has_telemetry = telemetry.is_some();
    let mut cadence = has_telemetry;
    let mut power = has_telemetry;
    let mut heart_rate = false;
    let mut resistance_control = control.is_some();
    let mut range = range_override.unwrap_or(DEFAULT_FTMS_RANGE);

    if let Some(feature) = optional_characteristic(&service, FTMS_FEATURE_UUID).await {
        if feature.props().readable {
            match feature.read_value().await {
                Ok(value) if value.len() >= 4 => {
                    let features = u32::from_le_bytes([value[0], value[1], value[2], value[3]]);
                    cadence = has_telemetry && features & FEATURE_CADENCE != 0;
                    power = has_telemetry && features & FEATURE_POWER != 0;
                    heart_rate = has_telemetry && features & FEATURE_HEART_RATE != 0;
                    if value.len() >= 8 {
                        let targets = u32::from_le_bytes([value[4], value[5], value[6], value[7]]);
                        resistance_control =
                            resistance_control && targets & TARGET_RESISTANCE != 0;
                    }
                }
                Ok(value) => {
                    tracing::debug!("feature bitmap too short: {} bytes", value.len());
                }
                Err(error) => {
                    tracing::debug!("feature bitmap read failed: {}", error);
                }
            }
        }
    }

    if range_override.is_none() {
        if let Some(range_char) = optional_characteristic(&service, RESISTANCE_RANGE_UUID).await {
            if range_char.props().readable {
                match range_char.read_value().await {
                    Ok(value) if value.len() >= 4 => {
                        range = (
                            i16::from_le_bytes([value[0], value[1]]),
                            i16::from_le_bytes([value[2], value[3]]),
                        );
                    }
                    Ok(value) => {
                        tracing::debug!("resistance range too short: {} bytes", value.len());
                    }
                    Err(error) => {
                        tracing::debug!("resistance range read failed: {}", error);
                    }
                }
            }
        }
    }

    let descriptor = CapabilityDescriptor {
        dialect: Dialect::Ftms,
        speed: has_telemetry,
        cadence,
        power,
        heart_rate,
        resistance_control,
        min_resistance: range.0,
        max_resistance: range.1,
    };

    tracing::info!(
        "negotiated {} bike: resistance {}..={}, control {}",
        descriptor.dialect,
        descriptor.min_resistance,
        descriptor.max_resistance,
        descriptor.resistance_control
    );

    Ok(NegotiatedBike {
        descriptor,
        telemetry,
        control,
    })
}

async fn negotiate_console(
    service: Arc<dyn RemoteService>,
    range_override: Option<(i16, i16)>,
) -> Result<NegotiatedBike, SessionError> {
    let telemetry = optional_characteristic(&service, CONSOLE_DATA_UUID)
        .await
        .filter(|characteristic| characteristic.props().notifiable);

    let control = optional_characteristic(&service, CONSOLE_COMMAND_UUID)
        .await
        .filter(|characteristic| {
            let props = characteristic.props();
            props.writable || props.writable_without_ack
        });

    // The console layout is fixed: every frame carries the full field set.
    let has_telemetry = telemetry.is_some();
    let range = range_override.unwrap_or(DEFAULT_CONSOLE_RANGE);

    let descriptor = CapabilityDescriptor {
        dialect: Dialect::IConsole,
        speed: has_telemetry,
        cadence: has_telemetry,
        power: has_telemetry,
        heart_rate: has_telemetry,
        resistance_control: control.is_some(),
        min_resistance: range.0,
        max_resistance: range.1,
    };

    tracing::info!(
        "negotiated {} bike: resistance {}..={}, control {}",
        descriptor.dialect,
        descriptor.min_resistance,
        descriptor.max_resistance,
        descriptor.resistance_control
    );

    Ok(NegotiatedBike {
        descriptor,
        telemetry,
        control,
    })
}
