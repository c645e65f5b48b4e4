//! btleplug binding of the session transport traits.

use crate::protocol::registry::{CONSOLE_SERVICE_UUID, FTMS_SERVICE_UUID};
use crate::session::transport::{
    CharacteristicProps, NotificationStream, RemoteCharacteristic, RemotePeripheral,
    RemoteService, SessionError,
};
use async_trait::async_trait;
use btleplug::api::{
    Central, CentralEvent, CharPropFlags, Characteristic, Manager as _, Peripheral as _,
    ScanFilter, Service, WriteType,
};
use btleplug::platform::{Manager, Peripheral};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// A connected btleplug peripheral with its services discovered.
pub struct BlePeripheral {
    peripheral: Peripheral,
}

impl BlePeripheral {
    /// Connect and discover services.
    pub async fn connect(peripheral: Peripheral) -> Result<Self, SessionError> {
        peripheral
            .connect()
            .await
            .map_err(|error| SessionError::Setup(error.to_string()))?;
        peripheral
            .discover_services()
            .await
            .map_err(|error| SessionError::Setup(error.to_string()))?;
        Ok(Self { peripheral })
    }

    /// Disconnect, best-effort.
    pub async fn disconnect(&self) {
        if let Err(error) = self.peripheral.disconnect().await {
            tracing::warn!("disconnect failed: {}", error);
        }
    }
}

#[async_trait]
impl RemotePeripheral for BlePeripheral {
    async fn primary_service(
        &self,
        service: Uuid,
    ) -> Result<Arc<dyn RemoteService>, SessionError> {
        let found = self
            .peripheral
            .services()
            .into_iter()
            .find(|candidate| candidate.uuid == service)
            .ok_or(SessionError::NotFound)?;
        Ok(Arc::new(BleService {
            peripheral: self.peripheral.clone(),
            service: found,
        }))
    }
}

struct BleService {
    peripheral: Peripheral,
    service: Service,
}

#[async_trait]
impl RemoteService for BleService {
    fn uuid(&self) -> Uuid {
        self.service.uuid
    }

    async fn characteristic(
        &self,
        characteristic: Uuid,
    ) -> Result<Arc<dyn RemoteCharacteristic>, SessionError> {
        let found = self
            .service
            .characteristics
            .iter()
            .find(|candidate| candidate.uuid == characteristic)
            .cloned()
            .ok_or(SessionError::NotFound)?;
        Ok(Arc::new(BleCharacteristic {
            peripheral: self.peripheral.clone(),
            characteristic: found,
        }))
    }
}

struct BleCharacteristic {
    peripheral: Peripheral,
    characteristic: Characteristic,
}

#[async_trait]
impl RemoteCharacteristic for BleCharacteristic {
    fn uuid(&self) -> Uuid {
        self.characteristic.uuid
    }

    fn props(&self) -> CharacteristicProps {
        let flags = self.characteristic.properties;
        CharacteristicProps {
            readable: flags.contains(CharPropFlags::READ),
            writable: flags.contains(CharPropFlags::WRITE),
            writable_without_ack: flags.contains(CharPropFlags::WRITE_WITHOUT_RESPONSE),
            notifiable: flags.contains(CharPropFlags::NOTIFY),
        }
    }

    async fn read_value(&self) -> Result<Vec<u8>, SessionError> {
        self.peripheral
            .read(&self.characteristic)
            .await
            .map_err(|error| SessionError::Read(error.to_string()))
    }

    async fn write_value(&self, value: &[u8]) -> Result<(), SessionError> {
        // Prefer acknowledged writes; fall back for write-without-response
        // only characteristics (the console command sink is one).
        let write_type = if self
            .characteristic
            .properties
            .contains(CharPropFlags::WRITE)
        {
            WriteType::WithResponse
        } else {
            WriteType::WithoutResponse
        };
        self.peripheral
            .write(&self.characteristic, value, write_type)
            .await
            .map_err(|error| SessionError::Write(error.to_string()))
    }

    async fn subscribe(&self) -> Result<NotificationStream, SessionError> {
        self.peripheral
            .subscribe(&self.characteristic)
            .await
            .map_err(|error| SessionError::Subscribe(error.to_string()))?;

        // btleplug exposes one notification stream per peripheral; narrow it
        // to this characteristic.
        let uuid = self.characteristic.uuid;
        let stream = self
            .peripheral
            .notifications()
            .await
            .map_err(|error| SessionError::Subscribe(error.to_string()))?;
        Ok(stream
            .filter_map(move |notification| async move {
                (notification.uuid == uuid).then_some(notification.value)
            })
            .boxed())
    }

    async fn unsubscribe(&self) -> Result<(), SessionError> {
        self.peripheral
            .unsubscribe(&self.characteristic)
            .await
            .map_err(|error| SessionError::Subscribe(error.to_string()))
    }
}

/// Scan until a peripheral advertising a known bike service appears, or the
/// timeout passes.
pub async fn find_bike(timeout: Duration) -> Result<Peripheral, SessionError> {
    let manager = Manager::new()
        .await
        .map_err(|error| SessionError::Setup(error.to_string()))?;
    let adapter = manager
        .adapters()
        .await
        .map_err(|error| SessionError::Setup(error.to_string()))?
        .into_iter()
        .next()
        .ok_or_else(|| SessionError::Setup("no Bluetooth adapter found".to_string()))?;

    let filter = ScanFilter {
        services: vec![FTMS_SERVICE_UUID, CONSOLE_SERVICE_UUID],
    };
    adapter
        .start_scan(filter)
        .await
        .map_err(|error| SessionError::Setup(error.to_string()))?;
    tracing::info!("scanning for bikes");

    let mut events = adapter
        .events()
        .await
        .map_err(|error| SessionError::Setup(error.to_string()))?;

    let found = tokio::time::timeout(timeout, async {
        while let Some(event) = events.next().await {
            if let CentralEvent::DeviceDiscovered(id) = event {
                let peripherals = adapter.peripherals().await.unwrap_or_default();
                for peripheral in peripherals {
                    if peripheral.id() != id {
                        continue;
                    }
                    if let Ok(Some(properties)) = peripheral.properties().await {
                        let advertises_bike = properties
                            .services
                            .iter()
                            .any(|s| *s == FTMS_SERVICE_UUID || *s == CONSOLE_SERVICE_UUID);
                        if advertises_bike {
                            let name = properties
                                .local_name
                                .unwrap_or_else(|| "Unknown Bike".to_string());
                            tracing::info!("found {}", name);
                            return Some(peripheral);
                        }
                    }
                }
            }
        }
        None
    })
    .await;

    if let Err(error) = adapter.stop_scan().await {
        tracing::warn!("stop scan failed: {}", error);
    }

    match found {
        Ok(Some(peripheral)) => Ok(peripheral),
        _ => Err(SessionError::Setup(
            "no bike found before the scan timeout".to_string(),
        )),
    }
}
