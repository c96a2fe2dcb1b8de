//! In-memory peripheral transport
//!
//! Keeps the GATT database, advertising payloads and sent notifications in
//! memory and lets the caller play the part of remote centrals. Events are
//! delivered synchronously on the calling thread, after the transport has
//! released its own locks.

use super::{AdapterCapabilities, PeripheralEvents, PeripheralTransport};
use crate::error::{AdvertiseError, TransportError};
use crate::gap::{AdvertiseData, AdvertiseSettings, Central};
use crate::gatt::{
    CharacteristicRef, DescriptorRef, GattService, GattStatus, ServiceId, CCCD_DISABLED,
    CCCD_INDICATIONS, CCCD_NOTIFICATIONS, CLIENT_CHAR_CONFIG_UUID,
};
use crate::uuid::Uuid;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use tracing::{debug, warn};

/// Usable ATT handles, 0x0001..=0xFFFF
const ATT_HANDLE_SPACE: usize = 0xFFFF;

const DEFAULT_DEVICE_NAME: &str = "btserver";

/// Advertising payloads currently on air
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvertisingState {
    pub settings: AdvertiseSettings,
    pub advertise_data: AdvertiseData,
    pub scan_response: AdvertiseData,
    /// Encoded AD structures of `advertise_data`
    pub advertise_bytes: Vec<u8>,
    /// Encoded AD structures of `scan_response`
    pub scan_response_bytes: Vec<u8>,
}

/// A notification handed to the radio
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    pub central: Central,
    pub characteristic: CharacteristicRef,
    pub value: Vec<u8>,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Transport without a radio
pub struct MemoryTransport {
    capabilities: AdapterCapabilities,
    max_attributes: usize,
    device_name: RwLock<String>,
    sink: RwLock<Option<Weak<dyn PeripheralEvents>>>,
    services: RwLock<Vec<GattService>>,
    values: RwLock<HashMap<(ServiceId, Uuid), Vec<u8>>>,
    advertising: RwLock<Option<AdvertisingState>>,
    centrals: RwLock<Vec<Central>>,
    notifications: RwLock<Vec<SentNotification>>,
    rejected: RwLock<HashSet<ServiceId>>,
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::with_capabilities(AdapterCapabilities::default())
    }

    pub fn with_capabilities(capabilities: AdapterCapabilities) -> Self {
        Self {
            capabilities,
            max_attributes: ATT_HANDLE_SPACE,
            device_name: RwLock::new(DEFAULT_DEVICE_NAME.to_string()),
            sink: RwLock::new(None),
            services: RwLock::new(Vec::new()),
            values: RwLock::new(HashMap::new()),
            advertising: RwLock::new(None),
            centrals: RwLock::new(Vec::new()),
            notifications: RwLock::new(Vec::new()),
            rejected: RwLock::new(HashSet::new()),
        }
    }

    /// An adapter that supports GATT but cannot advertise
    pub fn without_advertising() -> Self {
        Self::with_capabilities(AdapterCapabilities {
            peripheral_role: true,
            advertising: false,
        })
    }

    /// Limits the size of the attribute database
    pub fn with_max_attributes(mut self, max_attributes: usize) -> Self {
        self.max_attributes = max_attributes;
        self
    }

    /// Makes every later `add_service` for `id` fail.
    pub fn reject_service(&self, id: ServiceId) {
        write(&self.rejected).insert(id);
    }

    fn sink(&self) -> Option<Arc<dyn PeripheralEvents>> {
        read(&self.sink).as_ref().and_then(Weak::upgrade)
    }

    fn owning_service(
        &self,
        characteristic: &CharacteristicRef,
    ) -> Result<ServiceId, TransportError> {
        let services = read(&self.services);
        characteristic
            .service
            .filter(|id| {
                services
                    .iter()
                    .any(|s| s.id() == *id && s.characteristic(&characteristic.uuid).is_some())
            })
            .ok_or(TransportError::UnknownCharacteristic(characteristic.uuid))
    }

    pub fn services(&self) -> Vec<GattService> {
        read(&self.services).clone()
    }

    pub fn advertising(&self) -> Option<AdvertisingState> {
        read(&self.advertising).clone()
    }

    pub fn is_advertising(&self) -> bool {
        read(&self.advertising).is_some()
    }

    pub fn notifications(&self) -> Vec<SentNotification> {
        read(&self.notifications).clone()
    }

    pub fn characteristic_value(&self, characteristic: &CharacteristicRef) -> Option<Vec<u8>> {
        let id = characteristic.service?;
        read(&self.values).get(&(id, characteristic.uuid)).cloned()
    }

    /// A central establishes a connection.
    pub fn connect(&self, central: Central) {
        {
            let mut centrals = write(&self.centrals);
            if centrals.contains(&central) {
                return;
            }
            centrals.push(central);
        }
        if let Some(sink) = self.sink() {
            sink.on_central_connected(&central);
        }
    }

    /// A central drops its connection.
    pub fn disconnect(&self, central: &Central) {
        let removed = {
            let mut centrals = write(&self.centrals);
            let before = centrals.len();
            centrals.retain(|c| c != central);
            centrals.len() != before
        };
        if removed {
            if let Some(sink) = self.sink() {
                sink.on_central_disconnected(central);
            }
        }
    }

    /// A central reads a characteristic. The server gets a chance to refresh
    /// the value before it is returned.
    pub fn read_characteristic(
        &self,
        central: &Central,
        characteristic: &CharacteristicRef,
    ) -> Result<Vec<u8>, GattStatus> {
        if let Some(sink) = self.sink() {
            if let Err(e) = sink.on_characteristic_read(central, characteristic) {
                warn!(error = %e, "read dispatch failed");
                return Err(GattStatus::Unlikely);
            }
        }
        self.characteristic_value(characteristic)
            .ok_or(GattStatus::AttributeNotFound)
    }

    /// A central writes a characteristic with response. The value is kept
    /// when the server accepts it.
    pub fn write_characteristic(
        &self,
        central: &Central,
        characteristic: &CharacteristicRef,
        value: &[u8],
    ) -> GattStatus {
        let Some(sink) = self.sink() else {
            return GattStatus::RequestNotSupported;
        };
        let status = match sink.on_characteristic_write(central, characteristic, value) {
            Ok(status) => status,
            Err(e) => {
                warn!(error = %e, "write dispatch failed");
                return GattStatus::Unlikely;
            }
        };
        if status.is_success() {
            if let Some(id) = characteristic.service {
                write(&self.values).insert((id, characteristic.uuid), value.to_vec());
            }
        }
        status
    }

    /// A central writes a descriptor.
    ///
    /// CCCD writes are handled here, as a GATT server stack would, and turned
    /// into subscription events; other descriptors go to the server.
    pub fn write_descriptor(
        &self,
        central: &Central,
        descriptor: &DescriptorRef,
        value: &[u8],
    ) -> GattStatus {
        let Some(sink) = self.sink() else {
            return GattStatus::RequestNotSupported;
        };

        let is_cccd = descriptor.uuid == CLIENT_CHAR_CONFIG_UUID;
        let outcome = match (is_cccd, descriptor.characteristic) {
            (true, Some(characteristic)) => {
                if value.len() != 2 {
                    return GattStatus::InvalidAttributeValueLength;
                }
                if value == CCCD_NOTIFICATIONS || value == CCCD_INDICATIONS {
                    sink.on_notifying_enabled(central, &characteristic)
                        .map(|_| GattStatus::Success)
                } else if value == CCCD_DISABLED {
                    sink.on_notifying_disabled(central, &characteristic)
                        .map(|_| GattStatus::Success)
                } else {
                    Ok(GattStatus::ValueNotAllowed)
                }
            }
            _ => sink.on_descriptor_write(central, descriptor, value),
        };

        outcome.unwrap_or_else(|e| {
            warn!(error = %e, "descriptor write dispatch failed");
            GattStatus::Unlikely
        })
    }

    /// A central enables notifications on a characteristic.
    pub fn subscribe(&self, central: &Central, characteristic: &CharacteristicRef) -> GattStatus {
        let cccd = DescriptorRef::new(Uuid::from_u16(CLIENT_CHAR_CONFIG_UUID), *characteristic);
        self.write_descriptor(central, &cccd, &CCCD_NOTIFICATIONS)
    }

    pub fn unsubscribe(&self, central: &Central, characteristic: &CharacteristicRef) -> GattStatus {
        let cccd = DescriptorRef::new(Uuid::from_u16(CLIENT_CHAR_CONFIG_UUID), *characteristic);
        self.write_descriptor(central, &cccd, &CCCD_DISABLED)
    }
}

impl PeripheralTransport for MemoryTransport {
    fn capabilities(&self) -> AdapterCapabilities {
        self.capabilities
    }

    fn set_device_name(&self, name: &str) -> Result<(), TransportError> {
        *write(&self.device_name) = name.to_string();
        Ok(())
    }

    fn device_name(&self) -> String {
        read(&self.device_name).clone()
    }

    fn set_event_sink(&self, sink: Weak<dyn PeripheralEvents>) {
        *write(&self.sink) = Some(sink);
    }

    fn add_service(&self, service: &GattService) -> Result<(), TransportError> {
        let id = service.id();
        if read(&self.rejected).contains(&id) {
            return Err(TransportError::ServiceRejected(id));
        }

        {
            let mut services = write(&self.services);
            if services.iter().any(|s| s.id() == id) {
                return Err(TransportError::DuplicateService(id));
            }
            let used: usize = services.iter().map(GattService::attribute_count).sum();
            if used + service.attribute_count() > self.max_attributes {
                return Err(TransportError::InsufficientResources);
            }
            services.push(service.clone());

            let mut values = write(&self.values);
            for characteristic in &service.characteristics {
                values.insert((id, characteristic.uuid), characteristic.value.clone());
            }
        }

        debug!(service = %id, "service added to database");
        if let Some(sink) = self.sink() {
            sink.on_service_added(GattStatus::Success, service);
        }
        Ok(())
    }

    fn remove_service(&self, id: &ServiceId) {
        write(&self.services).retain(|s| s.id() != *id);
        write(&self.values).retain(|(service, _), _| service != id);
    }

    fn remove_all_services(&self) {
        write(&self.services).clear();
        write(&self.values).clear();
    }

    fn start_advertising(
        &self,
        settings: &AdvertiseSettings,
        scan_response: &AdvertiseData,
        advertise_data: &AdvertiseData,
    ) -> Result<(), TransportError> {
        let result = self.encode_advertising(settings, scan_response, advertise_data);
        let sink = self.sink();

        match result {
            Ok(state) => {
                *write(&self.advertising) = Some(state);
                if let Some(sink) = sink {
                    sink.on_advertising_started(settings);
                }
                Ok(())
            }
            Err(error) => {
                if let Some(sink) = sink {
                    sink.on_advertise_failure(error);
                }
                Err(error.into())
            }
        }
    }

    fn stop_advertising(&self) {
        let stopped = write(&self.advertising).take().is_some();
        if stopped {
            if let Some(sink) = self.sink() {
                sink.on_advertising_stopped();
            }
        }
    }

    fn set_characteristic_value(
        &self,
        characteristic: &CharacteristicRef,
        value: &[u8],
    ) -> Result<(), TransportError> {
        let id = self.owning_service(characteristic)?;
        write(&self.values).insert((id, characteristic.uuid), value.to_vec());
        Ok(())
    }

    fn notify(
        &self,
        central: &Central,
        characteristic: &CharacteristicRef,
        value: &[u8],
    ) -> Result<(), TransportError> {
        if !read(&self.centrals).contains(central) {
            return Err(TransportError::NotConnected(central.address));
        }
        self.owning_service(characteristic)?;

        write(&self.notifications).push(SentNotification {
            central: *central,
            characteristic: *characteristic,
            value: value.to_vec(),
        });

        if let Some(sink) = self.sink() {
            let status = GattStatus::Success;
            if let Err(e) = sink.on_notification_sent(central, value, characteristic, status) {
                warn!(error = %e, "notification completion dispatch failed");
            }
        }
        Ok(())
    }

    fn connected_centrals(&self) -> Vec<Central> {
        read(&self.centrals).clone()
    }
}

impl MemoryTransport {
    fn encode_advertising(
        &self,
        settings: &AdvertiseSettings,
        scan_response: &AdvertiseData,
        advertise_data: &AdvertiseData,
    ) -> Result<AdvertisingState, AdvertiseError> {
        if !self.capabilities.advertising {
            return Err(AdvertiseError::FeatureUnsupported);
        }
        if read(&self.advertising).is_some() {
            return Err(AdvertiseError::AlreadyStarted);
        }

        let name = self.device_name();
        let tx_power = settings.tx_power_level.dbm();

        Ok(AdvertisingState {
            settings: settings.clone(),
            advertise_data: advertise_data.clone(),
            scan_response: scan_response.clone(),
            advertise_bytes: advertise_data.encode(&name, tx_power)?,
            scan_response_bytes: scan_response.encode(&name, tx_power)?,
        })
    }
}
