//! Attribute operation dispatch
//!
//! One entry point per ATT operation class. Each resolves the target handle
//! to its owning registration, releases the registry lock, and invokes the
//! matching service callback with the attribute record and parameters
//! unchanged. Callback results flow back verbatim; the router is pure
//! dispatch and never interprets protocol error codes.

use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;

use log::trace;

use crate::att::types::Attribute;
use crate::att::AttErrorCode;

use super::server::GattServApp;
use super::service::ServiceCallbacks;

/// Marks the owning service handle for the duration of a callback so
/// deregistration of that service can be rejected while its callback runs.
struct DispatchGuard<'a> {
    flag: &'a AtomicU16,
    previous: u16,
}

impl<'a> DispatchGuard<'a> {
    fn enter(flag: &'a AtomicU16, service_handle: u16) -> Self {
        let previous = flag.swap(service_handle, Ordering::Relaxed);
        Self { flag, previous }
    }
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        // Restore rather than clear so nested dispatches keep the outer
        // callback's service marked after the inner one returns.
        self.flag.store(self.previous, Ordering::Relaxed);
    }
}

impl GattServApp {
    fn resolve_for_dispatch(
        &self,
        handle: u16,
    ) -> Result<(Arc<dyn ServiceCallbacks>, Attribute, u16), AttErrorCode> {
        let registry = self.registry.read().unwrap();
        registry.resolve(handle).ok_or_else(|| {
            trace!("dispatch miss on handle {:#06x}", handle);
            AttErrorCode::AttributeNotFound
        })
    }

    /// Route an ATT read request to the owning service.
    ///
    /// On success the returned bytes start at `offset` within the value and
    /// hold at most `max_len` octets.
    pub fn dispatch_read(
        &self,
        conn_handle: u16,
        handle: u16,
        offset: u16,
        max_len: usize,
    ) -> Result<Vec<u8>, AttErrorCode> {
        let (callbacks, attr, service) = self.resolve_for_dispatch(handle)?;
        let _guard = DispatchGuard::enter(&self.dispatching, service);
        callbacks.read_attr(conn_handle, &attr, offset, max_len)
    }

    /// Route an ATT write request to the owning service.
    pub fn dispatch_write(
        &self,
        conn_handle: u16,
        handle: u16,
        value: &[u8],
        offset: u16,
    ) -> Result<(), AttErrorCode> {
        let (callbacks, attr, service) = self.resolve_for_dispatch(handle)?;
        let _guard = DispatchGuard::enter(&self.dispatching, service);
        callbacks.write_attr(conn_handle, &attr, value, offset)
    }

    /// Route an authorization check for a pending read or write request.
    pub fn dispatch_authorize(
        &self,
        conn_handle: u16,
        handle: u16,
        opcode: u8,
    ) -> Result<(), AttErrorCode> {
        let (callbacks, attr, service) = self.resolve_for_dispatch(handle)?;
        let _guard = DispatchGuard::enter(&self.dispatching, service);
        callbacks.authorize_attr(conn_handle, &attr, opcode)
    }
}
