//! Error types for the attribute server engine
//!
//! Two layers exist. [`AttErrorCode`] is the protocol-level code a service
//! callback produces and the transport encodes into an Error Response PDU;
//! the dispatch router passes these through untouched. [`ServError`] is the
//! engine's own taxonomy for registry, configuration, and parameter calls.

use super::constants::*;
use thiserror::Error;

/// Protocol-level attribute error code.
///
/// Values surface from service callbacks and flow back to the transport
/// layer verbatim; the engine never maps or interprets them.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AttErrorCode {
    #[error("invalid handle")]
    InvalidHandle,
    #[error("read not permitted")]
    ReadNotPermitted,
    #[error("write not permitted")]
    WriteNotPermitted,
    #[error("insufficient authentication")]
    InsufficientAuthentication,
    #[error("request not supported")]
    RequestNotSupported,
    #[error("invalid offset")]
    InvalidOffset,
    #[error("insufficient authorization")]
    InsufficientAuthorization,
    #[error("prepare queue full")]
    PrepareQueueFull,
    #[error("attribute not found")]
    AttributeNotFound,
    #[error("invalid attribute value length")]
    InvalidAttributeValueLength,
    #[error("unlikely error")]
    Unlikely,
    #[error("insufficient encryption")]
    InsufficientEncryption,
    #[error("insufficient resources")]
    InsufficientResources,
    #[error("value not allowed")]
    ValueNotAllowed,
    #[error("application error {0:#04x}")]
    ApplicationError(u8),
    #[error("error code {0:#04x}")]
    Other(u8),
}

impl From<u8> for AttErrorCode {
    fn from(code: u8) -> Self {
        match code {
            ATT_ERROR_INVALID_HANDLE => AttErrorCode::InvalidHandle,
            ATT_ERROR_READ_NOT_PERMITTED => AttErrorCode::ReadNotPermitted,
            ATT_ERROR_WRITE_NOT_PERMITTED => AttErrorCode::WriteNotPermitted,
            ATT_ERROR_INSUFFICIENT_AUTHENTICATION => AttErrorCode::InsufficientAuthentication,
            ATT_ERROR_REQUEST_NOT_SUPPORTED => AttErrorCode::RequestNotSupported,
            ATT_ERROR_INVALID_OFFSET => AttErrorCode::InvalidOffset,
            ATT_ERROR_INSUFFICIENT_AUTHORIZATION => AttErrorCode::InsufficientAuthorization,
            ATT_ERROR_PREPARE_QUEUE_FULL => AttErrorCode::PrepareQueueFull,
            ATT_ERROR_ATTRIBUTE_NOT_FOUND => AttErrorCode::AttributeNotFound,
            ATT_ERROR_INVALID_ATTRIBUTE_VALUE_LENGTH => {
                AttErrorCode::InvalidAttributeValueLength
            }
            ATT_ERROR_UNLIKELY => AttErrorCode::Unlikely,
            ATT_ERROR_INSUFFICIENT_ENCRYPTION => AttErrorCode::InsufficientEncryption,
            ATT_ERROR_INSUFFICIENT_RESOURCES => AttErrorCode::InsufficientResources,
            ATT_ERROR_VALUE_NOT_ALLOWED => AttErrorCode::ValueNotAllowed,
            c if (ATT_ERROR_APPLICATION_ERROR_START..=ATT_ERROR_APPLICATION_ERROR_END)
                .contains(&c) =>
            {
                AttErrorCode::ApplicationError(c)
            }
            c => AttErrorCode::Other(c),
        }
    }
}

impl From<AttErrorCode> for u8 {
    fn from(code: AttErrorCode) -> u8 {
        match code {
            AttErrorCode::InvalidHandle => ATT_ERROR_INVALID_HANDLE,
            AttErrorCode::ReadNotPermitted => ATT_ERROR_READ_NOT_PERMITTED,
            AttErrorCode::WriteNotPermitted => ATT_ERROR_WRITE_NOT_PERMITTED,
            AttErrorCode::InsufficientAuthentication => ATT_ERROR_INSUFFICIENT_AUTHENTICATION,
            AttErrorCode::RequestNotSupported => ATT_ERROR_REQUEST_NOT_SUPPORTED,
            AttErrorCode::InvalidOffset => ATT_ERROR_INVALID_OFFSET,
            AttErrorCode::InsufficientAuthorization => ATT_ERROR_INSUFFICIENT_AUTHORIZATION,
            AttErrorCode::PrepareQueueFull => ATT_ERROR_PREPARE_QUEUE_FULL,
            AttErrorCode::AttributeNotFound => ATT_ERROR_ATTRIBUTE_NOT_FOUND,
            AttErrorCode::InvalidAttributeValueLength => {
                ATT_ERROR_INVALID_ATTRIBUTE_VALUE_LENGTH
            }
            AttErrorCode::Unlikely => ATT_ERROR_UNLIKELY,
            AttErrorCode::InsufficientEncryption => ATT_ERROR_INSUFFICIENT_ENCRYPTION,
            AttErrorCode::InsufficientResources => ATT_ERROR_INSUFFICIENT_RESOURCES,
            AttErrorCode::ValueNotAllowed => ATT_ERROR_VALUE_NOT_ALLOWED,
            AttErrorCode::ApplicationError(code) => code,
            AttErrorCode::Other(code) => code,
        }
    }
}

/// Engine-level error for registry, configuration, and parameter calls.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ServError {
    /// Malformed or out-of-domain call argument
    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),

    /// Well-formed request that cannot be satisfied given current state
    #[error("operation failed: {0}")]
    Failure(&'static str),

    /// Registration slot or table capacity exhausted
    #[error("memory allocation error")]
    MemAllocError,

    /// Value outside the declared domain for a parameter
    #[error("value out of range")]
    InvalidRange,
}

/// Result alias for engine calls
pub type ServResult<T> = Result<T, ServError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip_through_u8() {
        for raw in [0x01u8, 0x02, 0x08, 0x0A, 0x0F, 0x13, 0x85, 0x70] {
            let code = AttErrorCode::from(raw);
            assert_eq!(u8::from(code), raw);
        }
    }

    #[test]
    fn application_error_band() {
        assert_eq!(AttErrorCode::from(0x80), AttErrorCode::ApplicationError(0x80));
        assert_eq!(AttErrorCode::from(0x9F), AttErrorCode::ApplicationError(0x9F));
        assert_eq!(AttErrorCode::from(0xA0), AttErrorCode::Other(0xA0));
    }
}
