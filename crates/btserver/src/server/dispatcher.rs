//! Routing of inbound peripheral events to service handlers
//!
//! Attribute-scoped events go to the single handler owning the attribute's
//! service, found by walking the event's parent links up to a [`ServiceId`].
//! Connection lifecycle events go to every handler.

use super::handler::GattServiceHandler;
use super::registry::ServiceRegistry;
use crate::error::{AdvertiseError, DispatchError, Result, ServerError};
use crate::gap::{AdvertiseSettings, Central};
use crate::gatt::{CharacteristicRef, DescriptorRef, GattService, GattStatus, ServiceId};
use crate::transport::{PeripheralEvents, PeripheralTransport};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, error, info, warn};

/// Owns the service registration table and implements the transport's
/// callback surface.
///
/// The table is written while the server is registering and only read
/// afterwards. Handlers are always invoked after the table lock is released.
#[derive(Default)]
pub struct Dispatcher {
    registry: RwLock<ServiceRegistry>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, ServiceRegistry> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ServiceRegistry> {
        self.registry.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publishes the handler's service on the transport and makes it routable.
    ///
    /// Duplicate identities are rejected before the transport is touched. If
    /// the transport refuses the definition the table is left unchanged. If
    /// another registration of the same identity wins in between, the
    /// definition is withdrawn from the transport again.
    pub fn register_service(
        &self,
        transport: &dyn PeripheralTransport,
        handler: Arc<dyn GattServiceHandler>,
    ) -> Result<ServiceId> {
        let id = handler.service().id();
        if self.read().contains(&id) {
            warn!(service = %id, name = handler.name(), "service already registered");
            return Err(ServerError::DuplicateService(id));
        }

        // Transports may call back into the dispatcher while adding, so the
        // table lock is not held here.
        if let Err(e) = transport.add_service(handler.service()) {
            warn!(service = %id, name = handler.name(), error = %e, "transport rejected service");
            return Err(e.into());
        }

        let name = handler.name().to_string();
        let inserted = self.write().insert(handler);
        if let Err(e) = inserted {
            // Lost a race with a concurrent registration of the same identity
            warn!(service = %id, name = %name, "service registered concurrently, withdrawing");
            transport.remove_service(&id);
            return Err(e);
        }
        info!(service = %id, name = %name, "service registered");

        Ok(id)
    }

    /// Drops every registration. Used when the server is reset.
    pub fn clear(&self) {
        self.write().clear();
    }

    pub fn service_ids(&self) -> Vec<ServiceId> {
        self.read().ids()
    }

    pub fn handler(&self, id: &ServiceId) -> Option<Arc<dyn GattServiceHandler>> {
        self.read().get(id).cloned()
    }

    pub fn last_registered(&self) -> Option<ServiceId> {
        self.read().last().map(|e| e.id)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn characteristic_owner(
        characteristic: &CharacteristicRef,
    ) -> std::result::Result<ServiceId, DispatchError> {
        characteristic.service.ok_or_else(|| {
            error!(characteristic = ?characteristic.uuid, "characteristic has no parent service");
            DispatchError::OrphanCharacteristic(characteristic.uuid)
        })
    }

    fn descriptor_owner(
        descriptor: &DescriptorRef,
    ) -> std::result::Result<ServiceId, DispatchError> {
        let characteristic = descriptor.characteristic.as_ref().ok_or_else(|| {
            error!(descriptor = ?descriptor.uuid, "descriptor has no parent characteristic");
            DispatchError::OrphanDescriptor(descriptor.uuid)
        })?;
        Self::characteristic_owner(characteristic)
    }

    fn route(&self, id: &ServiceId) -> Option<Arc<dyn GattServiceHandler>> {
        let handler = self.handler(id);
        if handler.is_none() {
            debug!(service = %id, "no handler registered for service");
        }
        handler
    }

    /// Delivers a connection event to every handler in registration order. A
    /// panicking handler is logged and skipped.
    fn fan_out(
        &self,
        event: &'static str,
        central: &Central,
        deliver: impl Fn(&dyn GattServiceHandler),
    ) {
        let handlers = self.read().handlers();
        debug!(central = %central, event, handlers = handlers.len(), "fanning out");

        for handler in handlers {
            let delivered = panic::catch_unwind(AssertUnwindSafe(|| deliver(handler.as_ref())));
            if delivered.is_err() {
                error!(
                    name = handler.name(),
                    service = %handler.service().id(),
                    central = %central,
                    event,
                    "handler panicked"
                );
            }
        }
    }
}

impl PeripheralEvents for Dispatcher {
    fn on_characteristic_read(
        &self,
        central: &Central,
        characteristic: &CharacteristicRef,
    ) -> std::result::Result<(), DispatchError> {
        let id = Self::characteristic_owner(characteristic)?;
        if let Some(handler) = self.route(&id) {
            debug!(
                central = %central,
                service = %id,
                characteristic = ?characteristic.uuid,
                "characteristic read"
            );
            handler.on_characteristic_read(central, characteristic);
        }
        Ok(())
    }

    fn on_characteristic_write(
        &self,
        central: &Central,
        characteristic: &CharacteristicRef,
        value: &[u8],
    ) -> std::result::Result<GattStatus, DispatchError> {
        let id = Self::characteristic_owner(characteristic)?;
        let Some(handler) = self.route(&id) else {
            return Ok(GattStatus::RequestNotSupported);
        };

        let status = handler.on_characteristic_write(central, characteristic, value);
        debug!(
            central = %central,
            service = %id,
            characteristic = ?characteristic.uuid,
            value = %hex::encode(value),
            status = %status,
            "characteristic write"
        );
        Ok(status)
    }

    fn on_descriptor_read(
        &self,
        central: &Central,
        descriptor: &DescriptorRef,
    ) -> std::result::Result<(), DispatchError> {
        let id = Self::descriptor_owner(descriptor)?;
        if let Some(handler) = self.route(&id) {
            debug!(
                central = %central,
                service = %id,
                descriptor = ?descriptor.uuid,
                "descriptor read"
            );
            handler.on_descriptor_read(central, descriptor);
        }
        Ok(())
    }

    fn on_descriptor_write(
        &self,
        central: &Central,
        descriptor: &DescriptorRef,
        value: &[u8],
    ) -> std::result::Result<GattStatus, DispatchError> {
        let id = Self::descriptor_owner(descriptor)?;
        let Some(handler) = self.route(&id) else {
            return Ok(GattStatus::RequestNotSupported);
        };

        let status = handler.on_descriptor_write(central, descriptor, value);
        debug!(
            central = %central,
            service = %id,
            descriptor = ?descriptor.uuid,
            value = %hex::encode(value),
            status = %status,
            "descriptor write"
        );
        Ok(status)
    }

    fn on_notifying_enabled(
        &self,
        central: &Central,
        characteristic: &CharacteristicRef,
    ) -> std::result::Result<(), DispatchError> {
        let id = Self::characteristic_owner(characteristic)?;
        if let Some(handler) = self.route(&id) {
            debug!(
                central = %central,
                service = %id,
                characteristic = ?characteristic.uuid,
                "notifying enabled"
            );
            handler.on_notifying_enabled(central, characteristic);
        }
        Ok(())
    }

    fn on_notifying_disabled(
        &self,
        central: &Central,
        characteristic: &CharacteristicRef,
    ) -> std::result::Result<(), DispatchError> {
        let id = Self::characteristic_owner(characteristic)?;
        if let Some(handler) = self.route(&id) {
            debug!(
                central = %central,
                service = %id,
                characteristic = ?characteristic.uuid,
                "notifying disabled"
            );
            handler.on_notifying_disabled(central, characteristic);
        }
        Ok(())
    }

    fn on_notification_sent(
        &self,
        central: &Central,
        value: &[u8],
        characteristic: &CharacteristicRef,
        status: GattStatus,
    ) -> std::result::Result<(), DispatchError> {
        let id = Self::characteristic_owner(characteristic)?;
        if let Some(handler) = self.route(&id) {
            handler.on_notification_sent(central, value, characteristic, status);
        }
        Ok(())
    }

    fn on_central_connected(&self, central: &Central) {
        info!(central = %central, "central connected");
        self.fan_out("connected", central, |handler| handler.on_central_connected(central));
    }

    fn on_central_disconnected(&self, central: &Central) {
        info!(central = %central, "central disconnected");
        self.fan_out("disconnected", central, |handler| {
            handler.on_central_disconnected(central)
        });
    }

    fn on_service_added(&self, status: GattStatus, service: &GattService) {
        if status.is_success() {
            debug!(service = %service.id(), "service added");
        } else {
            warn!(service = %service.id(), status = %status, "service add failed");
        }
    }

    fn on_advertising_started(&self, settings: &AdvertiseSettings) {
        info!(mode = ?settings.mode, tx_power = ?settings.tx_power_level, "advertising started");
    }

    fn on_advertise_failure(&self, error: AdvertiseError) {
        error!(error = %error, "advertising failed");
    }

    fn on_advertising_stopped(&self) {
        info!("advertising stopped");
    }
}
