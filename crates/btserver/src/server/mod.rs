//! Peripheral server core
//!
//! The service handler contract, the registration table, the dispatcher that
//! routes transport callbacks to handlers, and the lifecycle controller that
//! ties them to a transport.

pub mod dispatcher;
pub mod handler;
pub mod lifecycle;
pub mod registry;


pub use dispatcher::Dispatcher;
pub use handler::GattServiceHandler;
pub use lifecycle::{
    advertising_payloads, AdvertisedService, BluetoothServer, RegistrationFailure, ServerConfig,
    ServerState, StartupReport,
};
pub use registry::{RegisteredService, ServiceRegistry};
