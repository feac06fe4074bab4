//! Service callback interface
//!
//! Each registering service supplies one implementation of
//! [`ServiceCallbacks`]; the dispatch router invokes it for every attribute
//! protocol operation that lands inside the service's handle range. The
//! encoding of each attribute value is defined by the owning service, never
//! by the engine.

use crate::att::{AttErrorCode, Attribute};

/// The three operation classes a service can handle.
///
/// All methods have defaults so a service only implements the classes it
/// supports. An omitted class reports "operation not permitted" rather than
/// failing in any harder way:
///
/// * `read_attr` defaults to [`AttErrorCode::ReadNotPermitted`]
/// * `write_attr` defaults to [`AttErrorCode::WriteNotPermitted`]
/// * `authorize_attr` defaults to [`AttErrorCode::InsufficientAuthorization`],
///   since the transport only consults it for attributes whose permissions
///   demand authorization; a service without an authorizer denies them.
pub trait ServiceCallbacks: Send + Sync {
    /// Read an attribute value.
    ///
    /// `offset` is the first octet to return and `max_len` the most the
    /// transport can carry in the response; the service returns the value
    /// slice or a protocol error code.
    fn read_attr(
        &self,
        conn_handle: u16,
        attr: &Attribute,
        offset: u16,
        max_len: usize,
    ) -> Result<Vec<u8>, AttErrorCode> {
        let _ = (conn_handle, attr, offset, max_len);
        Err(AttErrorCode::ReadNotPermitted)
    }

    /// Write an attribute value at the given offset.
    fn write_attr(
        &self,
        conn_handle: u16,
        attr: &Attribute,
        value: &[u8],
        offset: u16,
    ) -> Result<(), AttErrorCode> {
        let _ = (conn_handle, attr, value, offset);
        Err(AttErrorCode::WriteNotPermitted)
    }

    /// Authorize a pending read or write (`opcode` is the ATT request code).
    fn authorize_attr(
        &self,
        conn_handle: u16,
        attr: &Attribute,
        opcode: u8,
    ) -> Result<(), AttErrorCode> {
        let _ = (conn_handle, attr, opcode);
        Err(AttErrorCode::InsufficientAuthorization)
    }
}

/// Callback set for a service that supports no operations itself, e.g. one
/// whose attributes are all read by the transport from declaration data.
pub struct NoCallbacks;

impl ServiceCallbacks for NoCallbacks {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::att::{AttPermissions, ValueRef, ATT_READ_REQ};
    use crate::uuid::Uuid;

    #[test]
    fn omitted_classes_report_not_permitted() {
        let cbs = NoCallbacks;
        let attr = Attribute::new(
            Uuid::from_u16(0x2A00),
            AttPermissions::read_write(),
            ValueRef::NONE,
        );
        assert_eq!(
            cbs.read_attr(1, &attr, 0, 22),
            Err(AttErrorCode::ReadNotPermitted)
        );
        assert_eq!(
            cbs.write_attr(1, &attr, &[0], 0),
            Err(AttErrorCode::WriteNotPermitted)
        );
        assert_eq!(
            cbs.authorize_attr(1, &attr, ATT_READ_REQ),
            Err(AttErrorCode::InsufficientAuthorization)
        );
    }
}
