//! Error types for the btserver library

use crate::gap::BdAddr;
use crate::gatt::ServiceId;
use crate::server::ServerState;
use crate::uuid::Uuid;
use thiserror::Error;

/// Reasons the radio can refuse to advertise
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvertiseError {
    #[error("advertising data is {len} bytes, limit is {limit}")]
    DataTooLarge { len: usize, limit: usize },

    #[error("no advertising instance available")]
    TooManyAdvertisers,

    #[error("advertising already started")]
    AlreadyStarted,

    #[error("internal advertising error")]
    InternalError,

    #[error("advertising not supported by the adapter")]
    FeatureUnsupported,
}

/// Errors reported by a [`PeripheralTransport`](crate::transport::PeripheralTransport)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("service {0} is already added")]
    DuplicateService(ServiceId),

    #[error("service {0} was rejected by the stack")]
    ServiceRejected(ServiceId),

    #[error("insufficient resources")]
    InsufficientResources,

    #[error("advertising failed: {0}")]
    Advertise(#[from] AdvertiseError),

    #[error("characteristic {0} is not part of any added service")]
    UnknownCharacteristic(Uuid),

    #[error("central {0} is not connected")]
    NotConnected(BdAddr),

    #[error("operation not supported by the adapter")]
    Unsupported,
}

/// Events whose attribute topology the transport promised could not happen
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("descriptor {0:?} has no parent characteristic")]
    OrphanDescriptor(Uuid),

    #[error("characteristic {0:?} has no parent service")]
    OrphanCharacteristic(Uuid),
}

/// Errors surfaced by the registry and the server lifecycle
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServerError {
    #[error("adapter does not support the peripheral role")]
    PeripheralUnsupported,

    #[error("service {0} is already registered")]
    DuplicateService(ServiceId),

    #[error("service {0} is not registered")]
    UnknownService(ServiceId),

    #[error("no registered service to advertise")]
    NothingToAdvertise,

    #[error("operation requires state {expected:?}, server is {actual:?}")]
    InvalidState {
        expected: ServerState,
        actual: ServerState,
    },

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
}

pub type Result<T> = std::result::Result<T, ServerError>;
