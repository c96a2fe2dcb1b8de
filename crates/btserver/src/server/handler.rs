use crate::gap::Central;
use crate::gatt::{CharacteristicRef, DescriptorRef, GattService, GattStatus};

/// Behaviour of one logical GATT service.
///
/// Implementations are registered with the server and only ever see events for
/// attributes of their own [`service`](GattServiceHandler::service), plus the
/// connection lifecycle of every central. Handlers are shared across transport
/// threads and own whatever synchronisation their per-central state needs.
///
/// Every callback has a default: reads and subscription changes are ignored,
/// writes answer `RequestNotSupported`.
pub trait GattServiceHandler: Send + Sync {
    /// Structural definition published to the transport. Must not change
    /// while the handler is registered.
    fn service(&self) -> &GattService;

    /// Label used in logs.
    fn name(&self) -> &str;

    /// The handler answers by pushing the current value through the transport.
    fn on_characteristic_read(&self, _central: &Central, _characteristic: &CharacteristicRef) {}

    fn on_characteristic_write(
        &self,
        _central: &Central,
        _characteristic: &CharacteristicRef,
        _value: &[u8],
    ) -> GattStatus {
        GattStatus::RequestNotSupported
    }

    fn on_descriptor_read(&self, _central: &Central, _descriptor: &DescriptorRef) {}

    fn on_descriptor_write(
        &self,
        _central: &Central,
        _descriptor: &DescriptorRef,
        _value: &[u8],
    ) -> GattStatus {
        GattStatus::RequestNotSupported
    }

    fn on_notifying_enabled(&self, _central: &Central, _characteristic: &CharacteristicRef) {}

    fn on_notifying_disabled(&self, _central: &Central, _characteristic: &CharacteristicRef) {}

    fn on_notification_sent(
        &self,
        _central: &Central,
        _value: &[u8],
        _characteristic: &CharacteristicRef,
        _status: GattStatus,
    ) {
    }

    fn on_central_connected(&self, _central: &Central) {}

    fn on_central_disconnected(&self, _central: &Central) {}
}
