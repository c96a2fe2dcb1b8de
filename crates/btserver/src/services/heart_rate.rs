//! Heart Rate Service (0x180D)

use super::subscribers::Subscribers;
use crate::gap::Central;
use crate::gatt::{
    AttPermissions, CharacteristicProperties, CharacteristicRef, GattCharacteristic, GattService,
    GattStatus,
};
use crate::server::GattServiceHandler;
use crate::transport::PeripheralTransport;
use crate::uuid::Uuid;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, warn};

pub const HEART_RATE_SERVICE_UUID: Uuid = Uuid::from_u16(0x180D);
pub const HEART_RATE_MEASUREMENT_UUID: Uuid = Uuid::from_u16(0x2A37);
pub const BODY_SENSOR_LOCATION_UUID: Uuid = Uuid::from_u16(0x2A38);
pub const HEART_RATE_CONTROL_POINT_UUID: Uuid = Uuid::from_u16(0x2A39);

// Measurement flags
const FLAG_VALUE_U16: u8 = 0x01;
const FLAG_ENERGY_EXPENDED: u8 = 0x08;

/// Control point opcode
pub const RESET_ENERGY_EXPENDED: u8 = 0x01;

/// Returned for control point opcodes other than reset
pub const CONTROL_POINT_NOT_SUPPORTED: u8 = 0x80;

/// Body sensor locations
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodySensorLocation {
    Other = 0,
    #[default]
    Chest = 1,
    Wrist = 2,
    Finger = 3,
    Hand = 4,
    EarLobe = 5,
    Foot = 6,
}

/// Encodes a Heart Rate Measurement value. Rates above 255 bpm switch the
/// value field to 16 bits.
pub fn encode_measurement(bpm: u16, energy_expended: Option<u16>) -> Vec<u8> {
    let mut flags = 0;
    let mut value = vec![0];

    if bpm > u16::from(u8::MAX) {
        flags |= FLAG_VALUE_U16;
        value.extend_from_slice(&bpm.to_le_bytes());
    } else {
        value.push(bpm as u8);
    }

    if let Some(energy) = energy_expended {
        flags |= FLAG_ENERGY_EXPENDED;
        value.extend_from_slice(&energy.to_le_bytes());
    }

    value[0] = flags;
    value
}

pub struct HeartRateService {
    transport: Arc<dyn PeripheralTransport>,
    service: GattService,
    subscribers: Subscribers,
    energy_expended: RwLock<u16>,
}

impl HeartRateService {
    pub fn new(transport: Arc<dyn PeripheralTransport>, location: BodySensorLocation) -> Self {
        let service = GattService::new(HEART_RATE_SERVICE_UUID)
            .with_characteristic(
                GattCharacteristic::new(
                    HEART_RATE_MEASUREMENT_UUID,
                    CharacteristicProperties::NOTIFY,
                    AttPermissions::empty(),
                )
                .with_cccd(),
            )
            .with_characteristic(
                GattCharacteristic::new(
                    BODY_SENSOR_LOCATION_UUID,
                    CharacteristicProperties::READ,
                    AttPermissions::read_only(),
                )
                .with_value(vec![location as u8]),
            )
            .with_characteristic(GattCharacteristic::new(
                HEART_RATE_CONTROL_POINT_UUID,
                CharacteristicProperties::WRITE,
                AttPermissions::WRITE,
            ));

        Self {
            transport,
            service,
            subscribers: Subscribers::new(),
            energy_expended: RwLock::new(0),
        }
    }

    pub fn energy_expended(&self) -> u16 {
        *self
            .energy_expended
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Accumulates energy in kilojoules, saturating at the field maximum.
    pub fn add_energy_expended(&self, kilojoules: u16) {
        let mut energy = self
            .energy_expended
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *energy = energy.saturating_add(kilojoules);
    }

    /// Sends a measurement to every subscribed central. Returns how many
    /// notifications were handed to the transport.
    pub fn notify_measurement(&self, bpm: u16) -> usize {
        let characteristic = CharacteristicRef::new(HEART_RATE_MEASUREMENT_UUID, self.service.id());
        let value = encode_measurement(bpm, Some(self.energy_expended()));

        // Snapshot first: notify completions re-enter this handler.
        let centrals = self.subscribers.subscribers(&HEART_RATE_MEASUREMENT_UUID);
        let mut sent = 0;
        for central in centrals {
            match self.transport.notify(&central, &characteristic, &value) {
                Ok(()) => sent += 1,
                Err(e) => warn!(central = %central, error = %e, "heart rate notification failed"),
            }
        }
        sent
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .subscribers(&HEART_RATE_MEASUREMENT_UUID)
            .len()
    }
}

impl GattServiceHandler for HeartRateService {
    fn service(&self) -> &GattService {
        &self.service
    }

    fn name(&self) -> &str {
        "Heart Rate Service"
    }

    fn on_characteristic_write(
        &self,
        central: &Central,
        characteristic: &CharacteristicRef,
        value: &[u8],
    ) -> GattStatus {
        if characteristic.uuid != HEART_RATE_CONTROL_POINT_UUID {
            return GattStatus::RequestNotSupported;
        }

        match value {
            [] => GattStatus::InvalidAttributeValueLength,
            [RESET_ENERGY_EXPENDED] => {
                *self
                    .energy_expended
                    .write()
                    .unwrap_or_else(PoisonError::into_inner) = 0;
                info!(central = %central, "energy expended reset");
                GattStatus::Success
            }
            _ => GattStatus::ApplicationError(CONTROL_POINT_NOT_SUPPORTED),
        }
    }

    fn on_notifying_enabled(&self, central: &Central, characteristic: &CharacteristicRef) {
        if characteristic.uuid == HEART_RATE_MEASUREMENT_UUID {
            self.subscribers
                .subscribe(HEART_RATE_MEASUREMENT_UUID, *central);
            debug!(central = %central, "subscribed to heart rate");
        }
    }

    fn on_notifying_disabled(&self, central: &Central, characteristic: &CharacteristicRef) {
        if characteristic.uuid == HEART_RATE_MEASUREMENT_UUID {
            self.subscribers
                .unsubscribe(&HEART_RATE_MEASUREMENT_UUID, central);
        }
    }

    fn on_central_disconnected(&self, central: &Central) {
        self.subscribers.remove_central(central);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gap::BdAddr;
    use crate::transport::MemoryTransport;

    #[test]
    fn test_encode_measurement() {
        assert_eq!(encode_measurement(72, None), vec![0x00, 72]);
        assert_eq!(encode_measurement(300, None), vec![0x01, 0x2C, 0x01]);
        assert_eq!(encode_measurement(60, Some(0x0102)), vec![0x08, 60, 0x02, 0x01]);
    }

    #[test]
    fn test_control_point() {
        let transport = Arc::new(MemoryTransport::new());
        let hrs = HeartRateService::new(transport, BodySensorLocation::Wrist);
        let central = Central::new(BdAddr::new([1, 2, 3, 4, 5, 6]), 1);
        let control = hrs
            .service()
            .characteristic_ref(&HEART_RATE_CONTROL_POINT_UUID)
            .unwrap();

        hrs.add_energy_expended(40);
        hrs.add_energy_expended(u16::MAX);
        assert_eq!(hrs.energy_expended(), u16::MAX);

        assert_eq!(
            hrs.on_characteristic_write(&central, &control, &[]),
            GattStatus::InvalidAttributeValueLength
        );
        assert_eq!(
            hrs.on_characteristic_write(&central, &control, &[0x02]),
            GattStatus::ApplicationError(CONTROL_POINT_NOT_SUPPORTED)
        );
        assert_eq!(
            hrs.on_characteristic_write(&central, &control, &[RESET_ENERGY_EXPENDED]),
            GattStatus::Success
        );
        assert_eq!(hrs.energy_expended(), 0);

        let location = hrs
            .service()
            .characteristic(&BODY_SENSOR_LOCATION_UUID)
            .unwrap();
        assert_eq!(location.value, vec![BodySensorLocation::Wrist as u8]);
    }

    #[test]
    fn test_notify_subscribers() {
        let transport = Arc::new(MemoryTransport::new());
        let hrs = HeartRateService::new(transport.clone(), BodySensorLocation::Chest);
        transport.add_service(hrs.service()).unwrap();

        let a = Central::new(BdAddr::new([1, 0, 0, 0, 0, 0]), 0x40);
        let b = Central::new(BdAddr::new([2, 0, 0, 0, 0, 0]), 0x41);
        transport.connect(a);
        transport.connect(b);

        let measurement = hrs
            .service()
            .characteristic_ref(&HEART_RATE_MEASUREMENT_UUID)
            .unwrap();
        hrs.on_notifying_enabled(&a, &measurement);
        hrs.on_notifying_enabled(&b, &measurement);
        assert_eq!(hrs.subscriber_count(), 2);

        assert_eq!(hrs.notify_measurement(80), 2);

        hrs.on_notifying_disabled(&a, &measurement);
        hrs.on_central_disconnected(&b);
        assert_eq!(hrs.notify_measurement(80), 0);

        let sent = transport.notifications();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].central, a);
        assert_eq!(sent[1].central, b);
        assert_eq!(sent[0].value, vec![0x08, 80, 0, 0]);
    }
}
