//! Device Information Service (0x180A)

use crate::gap::Central;
use crate::gatt::{
    AttPermissions, CharacteristicProperties, CharacteristicRef, GattCharacteristic, GattService,
};
use crate::server::GattServiceHandler;
use crate::transport::PeripheralTransport;
use crate::uuid::Uuid;
use std::sync::Arc;
use tracing::warn;

pub const DEVICE_INFORMATION_SERVICE_UUID: Uuid = Uuid::from_u16(0x180A);
pub const MODEL_NUMBER_UUID: Uuid = Uuid::from_u16(0x2A24);
pub const MANUFACTURER_NAME_UUID: Uuid = Uuid::from_u16(0x2A29);

/// Read-only manufacturer and model strings.
pub struct DeviceInformationService {
    transport: Arc<dyn PeripheralTransport>,
    service: GattService,
    manufacturer: String,
    model: String,
}

impl DeviceInformationService {
    pub fn new(
        transport: Arc<dyn PeripheralTransport>,
        manufacturer: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let manufacturer = manufacturer.into();
        let model = model.into();

        let service = GattService::new(DEVICE_INFORMATION_SERVICE_UUID)
            .with_characteristic(
                GattCharacteristic::new(
                    MANUFACTURER_NAME_UUID,
                    CharacteristicProperties::READ,
                    AttPermissions::read_only(),
                )
                .with_value(manufacturer.as_bytes()),
            )
            .with_characteristic(
                GattCharacteristic::new(
                    MODEL_NUMBER_UUID,
                    CharacteristicProperties::READ,
                    AttPermissions::read_only(),
                )
                .with_value(model.as_bytes()),
            );

        Self {
            transport,
            service,
            manufacturer,
            model,
        }
    }
}

impl GattServiceHandler for DeviceInformationService {
    fn service(&self) -> &GattService {
        &self.service
    }

    fn name(&self) -> &str {
        "Device Information Service"
    }

    fn on_characteristic_read(&self, _central: &Central, characteristic: &CharacteristicRef) {
        let value = if characteristic.uuid == MANUFACTURER_NAME_UUID {
            self.manufacturer.as_bytes()
        } else if characteristic.uuid == MODEL_NUMBER_UUID {
            self.model.as_bytes()
        } else {
            return;
        };

        if let Err(e) = self.transport.set_characteristic_value(characteristic, value) {
            warn!(characteristic = ?characteristic.uuid, error = %e, "failed to set value");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gap::BdAddr;
    use crate::gatt::GattStatus;
    use crate::transport::MemoryTransport;

    #[test]
    fn test_definition_and_read() {
        let transport = Arc::new(MemoryTransport::new());
        let dis = DeviceInformationService::new(transport.clone(), "Welie", "Pixel 7");
        let central = Central::new(BdAddr::new([1, 2, 3, 4, 5, 6]), 1);

        transport.add_service(dis.service()).unwrap();
        let model = dis.service().characteristic_ref(&MODEL_NUMBER_UUID).unwrap();

        dis.on_characteristic_read(&central, &model);
        assert_eq!(transport.characteristic_value(&model), Some(b"Pixel 7".to_vec()));
        assert_eq!(
            dis.on_characteristic_write(&central, &model, b"x"),
            GattStatus::RequestNotSupported
        );
    }
}
