//! btserver - A Bluetooth Low Energy GATT peripheral server
//!
//! Applications describe each GATT service as a [`GattServiceHandler`], hand
//! them to a [`BluetoothServer`] and the server publishes them on a
//! [`PeripheralTransport`], routes every inbound read, write, subscription and
//! connection event to the owning handler, and starts advertising.

pub mod error;
pub mod gap;
pub mod gatt;
pub mod server;
pub mod services;
pub mod transport;
pub mod uuid;

// Re-export common types for convenience
pub use error::{AdvertiseError, DispatchError, Result, ServerError, TransportError};
pub use gap::{AdvertiseData, AdvertiseMode, AdvertiseSettings, BdAddr, Central, TxPowerLevel};
pub use gatt::{
    AttPermissions, CharacteristicProperties, CharacteristicRef, DescriptorRef,
    GattCharacteristic, GattDescriptor, GattService, GattStatus, ServiceId,
};
pub use server::{
    AdvertisedService, BluetoothServer, Dispatcher, GattServiceHandler, ServerConfig, ServerState,
    StartupReport,
};
pub use transport::{AdapterCapabilities, MemoryTransport, PeripheralEvents, PeripheralTransport};
pub use uuid::Uuid;
