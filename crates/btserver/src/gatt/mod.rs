//! GATT attribute model
//!
//! Structural service definitions handed to the transport, the identity and
//! reference types carried by inbound events, and the status codes returned
//! to a central.

pub mod constants;
pub mod service;
pub mod status;
pub mod types;

pub use constants::*;
pub use service::{GattCharacteristic, GattDescriptor, GattService};
pub use status::GattStatus;
pub use types::{
    AttPermissions, CharacteristicProperties, CharacteristicRef, DescriptorRef, ServiceId,
    ServiceKind,
};
