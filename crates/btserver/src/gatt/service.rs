//! Structural GATT definitions
//!
//! A [`GattService`] describes the attribute layout a service handler wants
//! the transport to publish. Definitions are plain values: they are built
//! once, handed to the transport, and never mutated afterwards.

use super::constants::CLIENT_CHAR_CONFIG_UUID;
use super::types::*;
use crate::uuid::Uuid;

/// GATT characteristic descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GattDescriptor {
    pub uuid: Uuid,
    pub permissions: AttPermissions,
    /// Initial value
    pub value: Vec<u8>,
}

impl GattDescriptor {
    pub fn new(uuid: Uuid, permissions: AttPermissions) -> Self {
        Self {
            uuid,
            permissions,
            value: Vec::new(),
        }
    }

    pub fn with_value(mut self, value: impl Into<Vec<u8>>) -> Self {
        self.value = value.into();
        self
    }

    /// Client Characteristic Configuration descriptor, notifications and
    /// indications disabled.
    pub fn cccd() -> Self {
        Self::new(
            Uuid::from_u16(CLIENT_CHAR_CONFIG_UUID),
            AttPermissions::read_write(),
        )
        .with_value(vec![0, 0])
    }
}

/// GATT characteristic with its descriptors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GattCharacteristic {
    pub uuid: Uuid,
    pub properties: CharacteristicProperties,
    pub permissions: AttPermissions,
    /// Initial value
    pub value: Vec<u8>,
    pub descriptors: Vec<GattDescriptor>,
}

impl GattCharacteristic {
    pub fn new(
        uuid: Uuid,
        properties: CharacteristicProperties,
        permissions: AttPermissions,
    ) -> Self {
        Self {
            uuid,
            properties,
            permissions,
            value: Vec::new(),
            descriptors: Vec::new(),
        }
    }

    pub fn with_value(mut self, value: impl Into<Vec<u8>>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_descriptor(mut self, descriptor: GattDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    /// Adds a CCCD so centrals can subscribe. Only meaningful for
    /// characteristics that notify or indicate.
    pub fn with_cccd(self) -> Self {
        self.with_descriptor(GattDescriptor::cccd())
    }

    pub fn descriptor(&self, uuid: &Uuid) -> Option<&GattDescriptor> {
        self.descriptors.iter().find(|d| d.uuid == *uuid)
    }
}

/// A GATT service with characteristics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GattService {
    id: ServiceId,
    pub kind: ServiceKind,
    pub characteristics: Vec<GattCharacteristic>,
}

impl GattService {
    /// Creates an empty primary service, instance 0.
    pub fn new(uuid: Uuid) -> Self {
        Self {
            id: ServiceId::new(uuid, 0),
            kind: ServiceKind::Primary,
            characteristics: Vec::new(),
        }
    }

    pub fn with_instance(mut self, instance: u16) -> Self {
        self.id.instance = instance;
        self
    }

    pub fn with_kind(mut self, kind: ServiceKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_characteristic(mut self, characteristic: GattCharacteristic) -> Self {
        self.characteristics.push(characteristic);
        self
    }

    pub fn id(&self) -> ServiceId {
        self.id
    }

    pub fn uuid(&self) -> Uuid {
        self.id.uuid
    }

    pub fn characteristic(&self, uuid: &Uuid) -> Option<&GattCharacteristic> {
        self.characteristics.iter().find(|c| c.uuid == *uuid)
    }

    /// Reference to one of this service's characteristics, parent link set.
    pub fn characteristic_ref(&self, uuid: &Uuid) -> Option<CharacteristicRef> {
        self.characteristic(uuid)
            .map(|c| CharacteristicRef::new(c.uuid, self.id))
    }

    /// Reference to a descriptor of one of this service's characteristics.
    pub fn descriptor_ref(
        &self,
        characteristic: &Uuid,
        descriptor: &Uuid,
    ) -> Option<DescriptorRef> {
        let parent = self.characteristic(characteristic)?;
        let descriptor = parent.descriptor(descriptor)?;
        Some(DescriptorRef::new(
            descriptor.uuid,
            CharacteristicRef::new(parent.uuid, self.id),
        ))
    }

    /// Number of attribute handles this service occupies: the service
    /// declaration, a declaration and a value per characteristic, and one per
    /// descriptor.
    pub fn attribute_count(&self) -> usize {
        1 + self
            .characteristics
            .iter()
            .map(|c| 2 + c.descriptors.len())
            .sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heart_rate() -> GattService {
        GattService::new(Uuid::from_u16(0x180D)).with_characteristic(
            GattCharacteristic::new(
                Uuid::from_u16(0x2A37),
                CharacteristicProperties::NOTIFY,
                AttPermissions::empty(),
            )
            .with_cccd(),
        )
    }

    #[test]
    fn test_refs_carry_parent_links() {
        let service = heart_rate();
        let cccd = Uuid::from_u16(CLIENT_CHAR_CONFIG_UUID);

        let characteristic = service.characteristic_ref(&Uuid::from_u16(0x2A37)).unwrap();
        assert_eq!(characteristic.service, Some(service.id()));

        let descriptor = service
            .descriptor_ref(&Uuid::from_u16(0x2A37), &cccd)
            .unwrap();
        assert_eq!(descriptor.characteristic, Some(characteristic));

        assert!(service.characteristic_ref(&Uuid::from_u16(0x2A38)).is_none());
        assert!(service
            .descriptor_ref(&Uuid::from_u16(0x2A37), &Uuid::from_u16(0x2901))
            .is_none());
    }

    #[test]
    fn test_attribute_count() {
        assert_eq!(heart_rate().attribute_count(), 4);
        assert_eq!(GattService::new(Uuid::from_u16(0x180A)).attribute_count(), 1);
    }

    #[test]
    fn test_instances_are_distinct_ids() {
        let first = GattService::new(Uuid::from_u16(0x180F));
        let second = GattService::new(Uuid::from_u16(0x180F)).with_instance(1);
        assert_ne!(first.id(), second.id());
        assert_eq!(first.uuid(), second.uuid());
    }
}
