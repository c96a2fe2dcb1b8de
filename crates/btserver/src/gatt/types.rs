//! Identity and reference types for GATT attributes

use crate::uuid::Uuid;
use bitflags::bitflags;
use std::fmt;

/// Stable identity of one registered service.
///
/// Two instances of the same service UUID are told apart by `instance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceId {
    pub uuid: Uuid,
    pub instance: u16,
}

impl ServiceId {
    pub const fn new(uuid: Uuid, instance: u16) -> Self {
        Self { uuid, instance }
    }
}

impl From<Uuid> for ServiceId {
    fn from(uuid: Uuid) -> Self {
        Self::new(uuid, 0)
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.uuid.as_u16() {
            Some(short) => write!(f, "0x{:04X}#{}", short, self.instance),
            None => write!(f, "{}#{}", self.uuid, self.instance),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServiceKind {
    #[default]
    Primary,
    Secondary,
}

/// A characteristic as named by an inbound event.
///
/// `service` links back to the owning service; the transport always fills it
/// in for characteristics of added services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CharacteristicRef {
    pub uuid: Uuid,
    pub service: Option<ServiceId>,
}

impl CharacteristicRef {
    pub fn new(uuid: Uuid, service: ServiceId) -> Self {
        Self {
            uuid,
            service: Some(service),
        }
    }
}

/// A descriptor as named by an inbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorRef {
    pub uuid: Uuid,
    pub characteristic: Option<CharacteristicRef>,
}

impl DescriptorRef {
    pub fn new(uuid: Uuid, characteristic: CharacteristicRef) -> Self {
        Self {
            uuid,
            characteristic: Some(characteristic),
        }
    }
}

bitflags! {
    /// Characteristic properties as declared in the characteristic declaration
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CharacteristicProperties: u8 {
        const BROADCAST = 0x01;
        const READ = 0x02;
        const WRITE_WITHOUT_RESPONSE = 0x04;
        const WRITE = 0x08;
        const NOTIFY = 0x10;
        const INDICATE = 0x20;
        const AUTHENTICATED_SIGNED_WRITES = 0x40;
        const EXTENDED_PROPERTIES = 0x80;
    }
}

impl CharacteristicProperties {
    pub fn can_subscribe(&self) -> bool {
        self.intersects(Self::NOTIFY | Self::INDICATE)
    }
}

bitflags! {
    /// Access permissions of an attribute value
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AttPermissions: u16 {
        const READ = 0x0001;
        const WRITE = 0x0002;
        const READ_ENCRYPTED = 0x0004;
        const WRITE_ENCRYPTED = 0x0008;
        const READ_AUTHENTICATED = 0x0010;
        const WRITE_AUTHENTICATED = 0x0020;
        const READ_AUTHORIZED = 0x0040;
        const WRITE_AUTHORIZED = 0x0080;
    }
}

impl AttPermissions {
    pub fn read_only() -> Self {
        Self::READ
    }

    pub fn read_write() -> Self {
        Self::READ | Self::WRITE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_id_display() {
        let id = ServiceId::new(Uuid::from_u16(0x180D), 0);
        assert_eq!(id.to_string(), "0x180D#0");
        assert_eq!(ServiceId::from(Uuid::from_u16(0x180D)), id);
        assert_ne!(ServiceId::new(Uuid::from_u16(0x180D), 1), id);
    }

    #[test]
    fn test_properties() {
        let props = CharacteristicProperties::READ | CharacteristicProperties::NOTIFY;
        assert!(props.can_subscribe());
        assert!(!CharacteristicProperties::WRITE.can_subscribe());
        assert_eq!(props.bits(), 0x12);
    }
}
