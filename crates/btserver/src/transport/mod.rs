//! Boundary to the radio stack
//!
//! The stack that actually talks to the controller is not part of this crate.
//! It is seen through two traits: [`PeripheralTransport`] for the calls the
//! server makes into the stack, and [`PeripheralEvents`] for the callbacks the
//! stack delivers back, already decoded into attribute references and raw
//! payload bytes.

pub mod memory;

pub use memory::MemoryTransport;

use crate::error::{AdvertiseError, DispatchError, TransportError};
use crate::gap::{AdvertiseData, AdvertiseSettings, Central};
use crate::gatt::{CharacteristicRef, DescriptorRef, GattService, GattStatus, ServiceId};
use std::sync::Weak;

/// What the local adapter can do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdapterCapabilities {
    pub peripheral_role: bool,
    pub advertising: bool,
}

impl Default for AdapterCapabilities {
    fn default() -> Self {
        Self {
            peripheral_role: true,
            advertising: true,
        }
    }
}

/// Calls the server makes into the radio stack.
pub trait PeripheralTransport: Send + Sync {
    fn capabilities(&self) -> AdapterCapabilities;

    fn set_device_name(&self, name: &str) -> Result<(), TransportError>;

    fn device_name(&self) -> String;

    /// Installs the receiver for inbound events. The transport must not keep
    /// the receiver alive on its own.
    fn set_event_sink(&self, sink: Weak<dyn PeripheralEvents>);

    /// Publishes a service definition in the local GATT database.
    fn add_service(&self, service: &GattService) -> Result<(), TransportError>;

    /// Withdraws one service. Removing a service that is not present is not
    /// an error.
    fn remove_service(&self, id: &ServiceId);

    fn remove_all_services(&self);

    fn start_advertising(
        &self,
        settings: &AdvertiseSettings,
        scan_response: &AdvertiseData,
        advertise_data: &AdvertiseData,
    ) -> Result<(), TransportError>;

    fn stop_advertising(&self);

    /// Sets the value served for subsequent reads of `characteristic`.
    fn set_characteristic_value(
        &self,
        characteristic: &CharacteristicRef,
        value: &[u8],
    ) -> Result<(), TransportError>;

    /// Sends a notification to one central. Completion is reported through
    /// [`PeripheralEvents::on_notification_sent`].
    fn notify(
        &self,
        central: &Central,
        characteristic: &CharacteristicRef,
        value: &[u8],
    ) -> Result<(), TransportError>;

    fn connected_centrals(&self) -> Vec<Central>;
}

/// Callbacks the radio stack delivers to the server.
///
/// The attribute-scoped callbacks fail only when the event's parent links are
/// missing, which the transport guarantees never happens for attributes of
/// services it added.
pub trait PeripheralEvents: Send + Sync {
    fn on_characteristic_read(
        &self,
        central: &Central,
        characteristic: &CharacteristicRef,
    ) -> Result<(), DispatchError>;

    /// Returns the status to send back in the write response.
    fn on_characteristic_write(
        &self,
        central: &Central,
        characteristic: &CharacteristicRef,
        value: &[u8],
    ) -> Result<GattStatus, DispatchError>;

    fn on_descriptor_read(
        &self,
        central: &Central,
        descriptor: &DescriptorRef,
    ) -> Result<(), DispatchError>;

    fn on_descriptor_write(
        &self,
        central: &Central,
        descriptor: &DescriptorRef,
        value: &[u8],
    ) -> Result<GattStatus, DispatchError>;

    fn on_notifying_enabled(
        &self,
        central: &Central,
        characteristic: &CharacteristicRef,
    ) -> Result<(), DispatchError>;

    fn on_notifying_disabled(
        &self,
        central: &Central,
        characteristic: &CharacteristicRef,
    ) -> Result<(), DispatchError>;

    fn on_notification_sent(
        &self,
        central: &Central,
        value: &[u8],
        characteristic: &CharacteristicRef,
        status: GattStatus,
    ) -> Result<(), DispatchError>;

    fn on_central_connected(&self, central: &Central);

    fn on_central_disconnected(&self, central: &Central);

    fn on_service_added(&self, _status: GattStatus, _service: &GattService) {}

    fn on_advertising_started(&self, _settings: &AdvertiseSettings) {}

    fn on_advertise_failure(&self, _error: AdvertiseError) {}

    fn on_advertising_stopped(&self) {}
}
