//! Caller-built attribute tables
//!
//! A service builds an [`AttributeTable`] describing its attributes in the
//! order they should appear in the server's handle space, then moves it into
//! the registry. The registry stamps contiguous handles into the records and
//! moves the table back out on deregistration.

use super::types::{Attribute, ValueRef};

/// An ordered list of attribute records belonging to one service.
///
/// The first entry must be a primary or secondary service declaration; the
/// registry rejects tables that are empty or start with anything else.
#[derive(Debug, Clone, Default)]
pub struct AttributeTable {
    attrs: Vec<Attribute>,
}

impl AttributeTable {
    pub fn new(attrs: Vec<Attribute>) -> Self {
        Self { attrs }
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.attrs.iter()
    }

    /// Attribute at a position within this table
    pub fn get(&self, index: usize) -> Option<&Attribute> {
        self.attrs.get(index)
    }

    /// First handle of this table, 0 while unregistered
    pub fn first_handle(&self) -> u16 {
        self.attrs.first().map_or(0, |a| a.handle)
    }

    /// Last handle of this table, 0 while unregistered
    pub fn last_handle(&self) -> u16 {
        self.attrs.last().map_or(0, |a| a.handle)
    }

    /// Attribute record for a handle inside this table.
    ///
    /// Handles within a table are contiguous and strictly increasing, so the
    /// lookup is direct indexing from the first handle.
    pub fn get_by_handle(&self, handle: u16) -> Option<&Attribute> {
        let first = self.first_handle();
        if first == 0 || handle < first {
            return None;
        }
        self.attrs.get((handle - first) as usize)
    }

    /// Find the first attribute with a matching value reference.
    ///
    /// Linear scan, used by services that track their value storage but not
    /// the handle the registry assigned to it.
    pub fn find_by_value_ref(&self, value: ValueRef) -> Option<&Attribute> {
        self.attrs.iter().find(|a| a.value == value)
    }

    /// Number of attributes falling inside a contiguous handle sub-range
    pub fn count_in_range(&self, first: u16, last: u16) -> usize {
        self.attrs
            .iter()
            .filter(|a| a.handle >= first && a.handle <= last)
            .count()
    }

    /// Stamp contiguous handles starting at `first` into the records
    pub(crate) fn assign_handles(&mut self, first: u16) {
        for (i, attr) in self.attrs.iter_mut().enumerate() {
            attr.handle = first + i as u16;
        }
    }
}

impl From<Vec<Attribute>> for AttributeTable {
    fn from(attrs: Vec<Attribute>) -> Self {
        Self::new(attrs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::att::types::AttPermissions;
    use crate::uuid::Uuid;

    fn table_of(n: usize) -> AttributeTable {
        let mut attrs = vec![Attribute::primary_service(ValueRef(1))];
        for i in 1..n {
            attrs.push(Attribute::new(
                Uuid::from_u16(0x2A00 + i as u16),
                AttPermissions::read_only(),
                ValueRef(1 + i as u32),
            ));
        }
        AttributeTable::new(attrs)
    }

    #[test]
    fn handle_assignment_is_contiguous() {
        let mut table = table_of(4);
        table.assign_handles(0x0010);
        assert_eq!(table.first_handle(), 0x0010);
        assert_eq!(table.last_handle(), 0x0013);
        let handles: Vec<u16> = table.iter().map(|a| a.handle).collect();
        assert_eq!(handles, vec![0x0010, 0x0011, 0x0012, 0x0013]);
    }

    #[test]
    fn lookup_by_handle_indexes_from_first() {
        let mut table = table_of(3);
        table.assign_handles(5);
        assert_eq!(table.get_by_handle(6).unwrap().value, ValueRef(2));
        assert!(table.get_by_handle(4).is_none());
        assert!(table.get_by_handle(8).is_none());
    }

    #[test]
    fn lookup_by_value_ref_finds_first_match() {
        let mut table = table_of(4);
        table.assign_handles(1);
        assert_eq!(table.find_by_value_ref(ValueRef(3)).unwrap().handle, 3);
        assert!(table.find_by_value_ref(ValueRef(99)).is_none());
    }

    #[test]
    fn count_in_range_clips_to_table() {
        let mut table = table_of(4);
        table.assign_handles(10);
        assert_eq!(table.count_in_range(10, 13), 4);
        assert_eq!(table.count_in_range(11, 12), 2);
        assert_eq!(table.count_in_range(20, 30), 0);
    }
}
