//! Server lifecycle
//!
//! [`BluetoothServer`] is the single entry point an application holds. It
//! validates the adapter, publishes every service before the device becomes
//! visible, and then starts advertising one of them.

use super::dispatcher::Dispatcher;
use super::handler::GattServiceHandler;
use crate::error::{Result, ServerError, TransportError};
use crate::gap::{AdvertiseData, AdvertiseSettings};
use crate::gatt::ServiceId;
use crate::transport::{PeripheralEvents, PeripheralTransport};
use crate::uuid::Uuid;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Where the server is in its startup sequence.
///
/// `Uninitialized -> Registering -> Advertising`; only [`BluetoothServer::reset`]
/// goes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Uninitialized,
    Registering,
    Advertising,
}

/// Which registered service's UUID goes into the advertising data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdvertisedService {
    /// The last service registered
    #[default]
    MostRecentlyAdded,
    Designated(ServiceId),
}

/// Server configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerConfig {
    /// Name applied to the adapter and sent in the scan response. `None`
    /// keeps the adapter's current name.
    pub device_name: Option<String>,
    pub advertise_settings: AdvertiseSettings,
    pub advertised_service: AdvertisedService,
}

/// A service that could not be registered during [`BluetoothServer::start`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationFailure {
    pub name: String,
    pub service: ServiceId,
    pub error: ServerError,
}

/// Outcome of [`BluetoothServer::start`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartupReport {
    pub registered: Vec<ServiceId>,
    pub failed: Vec<RegistrationFailure>,
    /// `None` when the adapter cannot advertise or advertising failed
    pub advertised: Option<ServiceId>,
    /// Why advertising could not be started, if it was attempted and failed
    pub advertise_error: Option<TransportError>,
}

/// Advertise data carrying TX power and one service UUID, and a scan response
/// carrying the device name.
pub fn advertising_payloads(service: Uuid) -> (AdvertiseData, AdvertiseData) {
    let advertise_data = AdvertiseData::new()
        .include_tx_power_level(true)
        .add_service_uuid(service);
    let scan_response = AdvertiseData::new().include_device_name(true);
    (advertise_data, scan_response)
}

/// Top-level peripheral server
pub struct BluetoothServer {
    transport: Arc<dyn PeripheralTransport>,
    dispatcher: Arc<Dispatcher>,
    config: ServerConfig,
    state: ServerState,
    advertising_supported: bool,
    advertised: Option<ServiceId>,
    advertise_error: Option<TransportError>,
}

impl BluetoothServer {
    /// Checks the adapter and wires the dispatcher to the transport.
    ///
    /// Missing peripheral-role support is fatal. Missing advertising support
    /// only means the device will not be discoverable.
    pub fn new(transport: Arc<dyn PeripheralTransport>, config: ServerConfig) -> Result<Self> {
        let capabilities = transport.capabilities();
        if !capabilities.peripheral_role {
            error!("adapter does not support the peripheral role");
            return Err(ServerError::PeripheralUnsupported);
        }
        if !capabilities.advertising {
            warn!("adapter does not support advertising, device will not be discoverable");
        }

        if let Some(name) = &config.device_name {
            transport.set_device_name(name)?;
        }

        let dispatcher = Arc::new(Dispatcher::new());
        let events: Arc<dyn PeripheralEvents> = dispatcher.clone();
        transport.set_event_sink(Arc::downgrade(&events));

        Ok(Self {
            transport,
            dispatcher,
            config,
            state: ServerState::Uninitialized,
            advertising_supported: capabilities.advertising,
            advertised: None,
            advertise_error: None,
        })
    }

    fn require(&self, expected: ServerState) -> Result<()> {
        if self.state != expected {
            return Err(ServerError::InvalidState {
                expected,
                actual: self.state,
            });
        }
        Ok(())
    }

    /// Clears whatever services the transport still publishes and opens
    /// registration.
    pub fn begin_registration(&mut self) -> Result<()> {
        self.require(ServerState::Uninitialized)?;

        self.transport.remove_all_services();
        self.dispatcher.clear();
        self.state = ServerState::Registering;
        info!("registering services");

        Ok(())
    }

    pub fn register_service(&mut self, handler: Arc<dyn GattServiceHandler>) -> Result<ServiceId> {
        self.require(ServerState::Registering)?;
        self.dispatcher
            .register_service(self.transport.as_ref(), handler)
    }

    /// Closes registration and starts advertising the configured service.
    ///
    /// Only a missing or unregistered advertised service is an error. If the
    /// adapter cannot advertise, or the transport refuses to, the server still
    /// moves to `Advertising` and serves GATT without being discoverable.
    pub fn start_advertising(&mut self) -> Result<()> {
        self.advertise(self.config.advertised_service)
    }

    fn advertise(&mut self, selection: AdvertisedService) -> Result<()> {
        self.require(ServerState::Registering)?;

        let id = match selection {
            AdvertisedService::MostRecentlyAdded => self
                .dispatcher
                .last_registered()
                .ok_or(ServerError::NothingToAdvertise)?,
            AdvertisedService::Designated(id) => {
                if self.dispatcher.handler(&id).is_none() {
                    return Err(ServerError::UnknownService(id));
                }
                id
            }
        };

        self.state = ServerState::Advertising;

        if !self.advertising_supported {
            warn!(service = %id, "skipping advertising, adapter cannot advertise");
            return Ok(());
        }

        let (advertise_data, scan_response) = advertising_payloads(id.uuid);
        let started = self.transport.start_advertising(
            &self.config.advertise_settings,
            &scan_response,
            &advertise_data,
        );

        match started {
            Ok(()) => {
                info!(service = %id, "advertising");
                self.advertised = Some(id);
            }
            Err(e) => {
                error!(
                    service = %id,
                    error = %e,
                    "advertising not started, device not discoverable"
                );
                self.advertise_error = Some(e);
            }
        }

        Ok(())
    }

    /// Runs the whole startup sequence.
    ///
    /// A service that fails to register is recorded in the report and the
    /// remaining services are still registered.
    pub fn start<I>(&mut self, handlers: I) -> Result<StartupReport>
    where
        I: IntoIterator<Item = Arc<dyn GattServiceHandler>>,
    {
        self.begin_registration()?;

        let mut report = StartupReport::default();
        for handler in handlers {
            let name = handler.name().to_string();
            let service = handler.service().id();
            match self.register_service(handler) {
                Ok(id) => report.registered.push(id),
                Err(error) => {
                    warn!(
                        service = %service,
                        name = %name,
                        error = %error,
                        "service not registered"
                    );
                    report.failed.push(RegistrationFailure {
                        name,
                        service,
                        error,
                    });
                }
            }
        }

        // A designated service that failed to register should not keep the
        // others from being discoverable.
        let mut selection = self.config.advertised_service;
        if let AdvertisedService::Designated(id) = selection {
            if report.failed.iter().any(|f| f.service == id) {
                warn!(
                    service = %id,
                    "designated service not registered, advertising most recent"
                );
                selection = AdvertisedService::MostRecentlyAdded;
            }
        }

        self.advertise(selection)?;
        report.advertised = self.advertised;
        report.advertise_error = self.advertise_error.clone();

        Ok(report)
    }

    /// Stops advertising and forgets every service, back to `Uninitialized`.
    pub fn reset(&mut self) {
        if self.advertised.take().is_some() {
            self.transport.stop_advertising();
        }
        self.advertise_error = None;
        self.transport.remove_all_services();
        self.dispatcher.clear();
        self.state = ServerState::Uninitialized;
        info!("server reset");
    }

    pub fn state(&self) -> ServerState {
        self.state
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn transport(&self) -> Arc<dyn PeripheralTransport> {
        self.transport.clone()
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        self.dispatcher.clone()
    }

    /// Registered services in registration order
    pub fn service_ids(&self) -> Vec<ServiceId> {
        self.dispatcher.service_ids()
    }

    pub fn advertised_service(&self) -> Option<ServiceId> {
        self.advertised
    }

    /// Error from the last attempt to start advertising
    pub fn advertise_error(&self) -> Option<&TransportError> {
        self.advertise_error.as_ref()
    }

    pub fn is_discoverable(&self) -> bool {
        self.advertised.is_some()
    }
}
