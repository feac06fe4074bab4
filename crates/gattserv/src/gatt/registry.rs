//! Service registry
//!
//! Owns every registered service's attribute table, allocates contiguous
//! handle ranges, and resolves a handle back to the owning registration.
//! Handle ranges never overlap and are never reassigned while a
//! registration is live; handles are not recycled after deregistration.

use std::sync::Arc;

use log::debug;

use crate::att::{AttributeTable, ServError, ServResult, ATT_HANDLE_MAX, ATT_HANDLE_MIN};
use crate::att::types::Attribute;
use super::service::ServiceCallbacks;

/// One registered service: a contiguous handle range, the owned attribute
/// table, and the callback set the dispatch router invokes.
pub struct ServiceRegistration {
    first_handle: u16,
    last_handle: u16,
    table: AttributeTable,
    callbacks: Arc<dyn ServiceCallbacks>,
}

impl ServiceRegistration {
    /// Service handle, equal to the first attribute's handle
    pub fn service_handle(&self) -> u16 {
        self.first_handle
    }

    /// Inclusive handle range of this registration
    pub fn range(&self) -> (u16, u16) {
        (self.first_handle, self.last_handle)
    }

    pub fn table(&self) -> &AttributeTable {
        &self.table
    }
}

/// Ordered collection of service registrations.
///
/// Kept sorted by first handle; since handles are allocated monotonically,
/// new registrations always append in order.
pub struct ServiceRegistry {
    registrations: Vec<ServiceRegistration>,
    /// Highest handle ever allocated; the next block starts one above it
    last_allocated: u16,
    /// Fixed registration-slot count, never grown
    capacity: usize,
}

impl ServiceRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            registrations: Vec::with_capacity(capacity),
            last_allocated: ATT_HANDLE_MIN - 1,
            capacity,
        }
    }

    /// Register a service's attribute table and callbacks.
    ///
    /// On success the table moves into the registry, contiguous handles
    /// starting at the next free handle are stamped into its records, and
    /// the first handle (the service handle) is returned. Attribute values
    /// are never copied; the records keep their opaque value tokens.
    pub fn register_service(
        &mut self,
        mut table: AttributeTable,
        callbacks: Arc<dyn ServiceCallbacks>,
    ) -> ServResult<u16> {
        if table.is_empty() {
            return Err(ServError::InvalidParameter("empty attribute table"));
        }
        if !table.get(0).map_or(false, Attribute::is_service_decl) {
            return Err(ServError::InvalidParameter(
                "first attribute must be a service declaration",
            ));
        }

        // Handles are a fixed-width space and are not recycled, so the new
        // block must fit above everything ever allocated.
        let count = table.len() as u32;
        if u32::from(self.last_allocated) + count > u32::from(ATT_HANDLE_MAX) {
            return Err(ServError::Failure("attribute handle space exhausted"));
        }
        if self.registrations.len() >= self.capacity {
            return Err(ServError::MemAllocError);
        }

        let first = self.last_allocated + 1;
        let last = first + (count as u16 - 1);
        table.assign_handles(first);
        self.last_allocated = last;

        debug!(
            "registered service {:#06x}..{:#06x} ({} attrs)",
            first, last, count
        );

        self.registrations.push(ServiceRegistration {
            first_handle: first,
            last_handle: last,
            table,
            callbacks,
        });
        Ok(first)
    }

    /// Deregister the service whose first handle equals `handle`.
    ///
    /// The attribute table moves back to the caller, handles still stamped
    /// so the freed range stays visible; the registry keeps no reference to
    /// it. Handles in the freed range are not reused.
    pub fn deregister_service(&mut self, handle: u16) -> ServResult<AttributeTable> {
        let index = self
            .registrations
            .iter()
            .position(|r| r.first_handle == handle)
            .ok_or(ServError::Failure("service not found"))?;
        let reg = self.registrations.remove(index);
        debug!(
            "deregistered service {:#06x}..{:#06x}",
            reg.first_handle, reg.last_handle
        );
        Ok(reg.table)
    }

    /// Registration whose range contains `handle`, if any
    pub fn find_registration(&self, handle: u16) -> Option<&ServiceRegistration> {
        // Ranges are sorted by first handle: the candidate is the last
        // registration starting at or below the handle.
        let idx = self
            .registrations
            .partition_point(|r| r.first_handle <= handle);
        let reg = self.registrations.get(idx.checked_sub(1)?)?;
        (handle <= reg.last_handle).then_some(reg)
    }

    /// Attribute record for a handle anywhere in the registry
    pub fn find_by_handle(&self, handle: u16) -> Option<&Attribute> {
        self.find_registration(handle)?.table().get_by_handle(handle)
    }

    /// Owning callbacks, a copy of the attribute record, and the owning
    /// service handle for a target handle.
    ///
    /// The copies let the dispatch router drop the registry lock before the
    /// callback runs.
    pub fn resolve(&self, handle: u16) -> Option<(Arc<dyn ServiceCallbacks>, Attribute, u16)> {
        let reg = self.find_registration(handle)?;
        let attr = reg.table().get_by_handle(handle)?.clone();
        Some((Arc::clone(&reg.callbacks), attr, reg.first_handle))
    }

    /// Inclusive handle range owned by the service registered at `handle`
    pub fn service_range(&self, handle: u16) -> Option<(u16, u16)> {
        self.registrations
            .iter()
            .find(|r| r.first_handle == handle)
            .map(ServiceRegistration::range)
    }

    /// Number of attributes in a contiguous handle sub-range
    pub fn attr_count(&self, first: u16, last: u16) -> usize {
        self.registrations
            .iter()
            .map(|r| r.table.count_in_range(first, last))
            .sum()
    }

    /// Number of live registrations
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn set_last_allocated(&mut self, handle: u16) {
        self.last_allocated = handle;
    }
}
