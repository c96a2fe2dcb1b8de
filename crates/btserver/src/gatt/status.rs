//! Status codes returned for write requests and notification completion
use super::constants::*;
use std::fmt;

/// Outcome of a GATT operation as seen by the remote central.
///
/// Anything other than `Success` is sent back as the ATT error code of the
/// corresponding error response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GattStatus {
    Success,
    InvalidHandle,
    ReadNotPermitted,
    WriteNotPermitted,
    InvalidPdu,
    InsufficientAuthentication,
    RequestNotSupported,
    InvalidOffset,
    InsufficientAuthorization,
    PrepareQueueFull,
    AttributeNotFound,
    AttributeNotLong,
    InsufficientEncryptionKeySize,
    InvalidAttributeValueLength,
    Unlikely,
    InsufficientEncryption,
    UnsupportedGroupType,
    InsufficientResources,
    DatabaseOutOfSync,
    ValueNotAllowed,
    /// Profile-defined error in 0x80..=0x9F
    ApplicationError(u8),
    /// Common profile and service error in 0xE0..=0xFF
    CommonProfileError(u8),
    Unknown(u8),
}

impl GattStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, GattStatus::Success)
    }
}

impl From<u8> for GattStatus {
    fn from(code: u8) -> Self {
        match code {
            ATT_SUCCESS => GattStatus::Success,
            ATT_ERROR_INVALID_HANDLE => GattStatus::InvalidHandle,
            ATT_ERROR_READ_NOT_PERMITTED => GattStatus::ReadNotPermitted,
            ATT_ERROR_WRITE_NOT_PERMITTED => GattStatus::WriteNotPermitted,
            ATT_ERROR_INVALID_PDU => GattStatus::InvalidPdu,
            ATT_ERROR_INSUFFICIENT_AUTHENTICATION => GattStatus::InsufficientAuthentication,
            ATT_ERROR_REQUEST_NOT_SUPPORTED => GattStatus::RequestNotSupported,
            ATT_ERROR_INVALID_OFFSET => GattStatus::InvalidOffset,
            ATT_ERROR_INSUFFICIENT_AUTHORIZATION => GattStatus::InsufficientAuthorization,
            ATT_ERROR_PREPARE_QUEUE_FULL => GattStatus::PrepareQueueFull,
            ATT_ERROR_ATTRIBUTE_NOT_FOUND => GattStatus::AttributeNotFound,
            ATT_ERROR_ATTRIBUTE_NOT_LONG => GattStatus::AttributeNotLong,
            ATT_ERROR_INSUFFICIENT_ENCRYPTION_KEY_SIZE => GattStatus::InsufficientEncryptionKeySize,
            ATT_ERROR_INVALID_ATTRIBUTE_VALUE_LENGTH => GattStatus::InvalidAttributeValueLength,
            ATT_ERROR_UNLIKELY => GattStatus::Unlikely,
            ATT_ERROR_INSUFFICIENT_ENCRYPTION => GattStatus::InsufficientEncryption,
            ATT_ERROR_UNSUPPORTED_GROUP_TYPE => GattStatus::UnsupportedGroupType,
            ATT_ERROR_INSUFFICIENT_RESOURCES => GattStatus::InsufficientResources,
            ATT_ERROR_DATABASE_OUT_OF_SYNC => GattStatus::DatabaseOutOfSync,
            ATT_ERROR_VALUE_NOT_ALLOWED => GattStatus::ValueNotAllowed,
            ATT_ERROR_APPLICATION_ERROR_START..=ATT_ERROR_APPLICATION_ERROR_END => {
                GattStatus::ApplicationError(code)
            }
            ATT_ERROR_COMMON_PROFILE_ERROR_START..=ATT_ERROR_COMMON_PROFILE_ERROR_END => {
                GattStatus::CommonProfileError(code)
            }
            _ => GattStatus::Unknown(code),
        }
    }
}

impl From<GattStatus> for u8 {
    fn from(status: GattStatus) -> Self {
        match status {
            GattStatus::Success => ATT_SUCCESS,
            GattStatus::InvalidHandle => ATT_ERROR_INVALID_HANDLE,
            GattStatus::ReadNotPermitted => ATT_ERROR_READ_NOT_PERMITTED,
            GattStatus::WriteNotPermitted => ATT_ERROR_WRITE_NOT_PERMITTED,
            GattStatus::InvalidPdu => ATT_ERROR_INVALID_PDU,
            GattStatus::InsufficientAuthentication => ATT_ERROR_INSUFFICIENT_AUTHENTICATION,
            GattStatus::RequestNotSupported => ATT_ERROR_REQUEST_NOT_SUPPORTED,
            GattStatus::InvalidOffset => ATT_ERROR_INVALID_OFFSET,
            GattStatus::InsufficientAuthorization => ATT_ERROR_INSUFFICIENT_AUTHORIZATION,
            GattStatus::PrepareQueueFull => ATT_ERROR_PREPARE_QUEUE_FULL,
            GattStatus::AttributeNotFound => ATT_ERROR_ATTRIBUTE_NOT_FOUND,
            GattStatus::AttributeNotLong => ATT_ERROR_ATTRIBUTE_NOT_LONG,
            GattStatus::InsufficientEncryptionKeySize => ATT_ERROR_INSUFFICIENT_ENCRYPTION_KEY_SIZE,
            GattStatus::InvalidAttributeValueLength => ATT_ERROR_INVALID_ATTRIBUTE_VALUE_LENGTH,
            GattStatus::Unlikely => ATT_ERROR_UNLIKELY,
            GattStatus::InsufficientEncryption => ATT_ERROR_INSUFFICIENT_ENCRYPTION,
            GattStatus::UnsupportedGroupType => ATT_ERROR_UNSUPPORTED_GROUP_TYPE,
            GattStatus::InsufficientResources => ATT_ERROR_INSUFFICIENT_RESOURCES,
            GattStatus::DatabaseOutOfSync => ATT_ERROR_DATABASE_OUT_OF_SYNC,
            GattStatus::ValueNotAllowed => ATT_ERROR_VALUE_NOT_ALLOWED,
            GattStatus::ApplicationError(code)
            | GattStatus::CommonProfileError(code)
            | GattStatus::Unknown(code) => code,
        }
    }
}

impl fmt::Display for GattStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} (0x{:02X})", self, u8::from(*self))
    }
}
