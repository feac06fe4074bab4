//! Client characteristic configuration store
//!
//! Per-attribute tables of per-connection subscription values. Each table is
//! statically sized to the maximum concurrent connection count and never
//! grows; a reserved connection handle marks a free row. Persistence across
//! power cycles belongs to the bonding collaborator, which replays stored
//! values through [`CharCfgStore::update`] on reconnect.

use std::collections::BTreeMap;

use log::{debug, warn};

use crate::att::types::ClientCfg;
use crate::att::{ServError, ServResult, CONN_HANDLE_INVALID};

/// One (connection, configuration) row
#[derive(Debug, Clone, Copy)]
struct CccRow {
    conn_handle: u16,
    value: ClientCfg,
}

impl CccRow {
    const EMPTY: CccRow = CccRow {
        conn_handle: CONN_HANDLE_INVALID,
        value: ClientCfg::NONE,
    };
}

/// Subscription state for every attribute that carries a client
/// characteristic configuration table.
pub struct CharCfgStore {
    /// Attribute handle -> fixed-size per-connection table
    tables: BTreeMap<u16, Vec<CccRow>>,
    max_connections: usize,
}

impl CharCfgStore {
    pub fn new(max_connections: usize) -> Self {
        Self {
            tables: BTreeMap::new(),
            max_connections,
        }
    }

    /// Create (or reset) the per-connection table for an attribute.
    ///
    /// Called when a registration containing a configurable attribute is
    /// installed; until then [`CharCfgStore::update`] rejects the handle.
    /// Error message for a table with no free row, shared with the CCC
    /// write path so its error-code mapping stays in sync.
    pub(crate) const TABLE_FULL: &'static str = "client configuration table full";

    pub fn init_table(&mut self, attr_handle: u16) {
        self.tables
            .insert(attr_handle, vec![CccRow::EMPTY; self.max_connections]);
    }

    /// True when `attr_handle` has a configuration table
    pub fn has_table(&self, attr_handle: u16) -> bool {
        self.tables.contains_key(&attr_handle)
    }

    /// Update the configuration value for a (connection, attribute) pair.
    ///
    /// Reuses the connection's existing row when present, otherwise claims a
    /// free one. Fails with `InvalidParameter` when the attribute has no
    /// table or every row is taken by another live connection.
    pub fn update(&mut self, conn_handle: u16, attr_handle: u16, value: ClientCfg) -> ServResult<()> {
        if conn_handle == CONN_HANDLE_INVALID {
            return Err(ServError::InvalidParameter("invalid connection handle"));
        }
        let table = self
            .tables
            .get_mut(&attr_handle)
            .ok_or(ServError::InvalidParameter("no client configuration table"))?;

        let row = match table.iter_mut().find(|r| r.conn_handle == conn_handle) {
            Some(row) => row,
            None => table
                .iter_mut()
                .find(|r| r.conn_handle == CONN_HANDLE_INVALID)
                .ok_or_else(|| {
                    warn!(
                        "client cfg table for {:#06x} full ({} connections)",
                        attr_handle, self.max_connections
                    );
                    ServError::InvalidParameter(Self::TABLE_FULL)
                })?,
        };
        row.conn_handle = conn_handle;
        row.value = value;
        Ok(())
    }

    /// Configuration value for a (connection, attribute) pair.
    ///
    /// `ClientCfg::NONE` when the pair has no live row.
    pub fn read(&self, conn_handle: u16, attr_handle: u16) -> ClientCfg {
        self.tables
            .get(&attr_handle)
            .and_then(|t| t.iter().find(|r| r.conn_handle == conn_handle))
            .map_or(ClientCfg::NONE, |r| r.value)
    }

    /// Connections with notifications or indications enabled for an
    /// attribute, consumed by the outbound notification sender.
    pub fn subscribed(&self, attr_handle: u16) -> Vec<(u16, ClientCfg)> {
        self.tables.get(&attr_handle).map_or_else(Vec::new, |t| {
            t.iter()
                .filter(|r| r.conn_handle != CONN_HANDLE_INVALID && r.value.subscribed())
                .map(|r| (r.conn_handle, r.value))
                .collect()
        })
    }

    /// Invalidate every row belonging to a torn-down connection.
    ///
    /// Rows are marked free but keep their value in memory; a bonded peer
    /// reconnecting gets the value replayed by the bond manager.
    pub fn connection_closed(&mut self, conn_handle: u16) {
        let mut cleared = 0usize;
        for table in self.tables.values_mut() {
            for row in table.iter_mut().filter(|r| r.conn_handle == conn_handle) {
                row.conn_handle = CONN_HANDLE_INVALID;
                cleared += 1;
            }
        }
        debug!(
            "connection {:#06x} closed, {} client cfg rows invalidated",
            conn_handle, cleared
        );
    }

    /// Drop every table whose attribute handle falls in a freed range.
    ///
    /// Called on service deregistration so recycled application logic never
    /// observes stale subscription state.
    pub fn purge_range(&mut self, first: u16, last: u16) {
        self.tables.retain(|&h, _| h < first || h > last);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_then_read_round_trips() {
        let mut store = CharCfgStore::new(2);
        store.init_table(0x0004);

        store.update(0x0001, 0x0004, ClientCfg::NOTIFY).unwrap();
        assert_eq!(store.read(0x0001, 0x0004), ClientCfg::NOTIFY);

        // A later update overwrites in place.
        store.update(0x0001, 0x0004, ClientCfg::INDICATE).unwrap();
        assert_eq!(store.read(0x0001, 0x0004), ClientCfg::INDICATE);

        // Other connections read back empty.
        assert_eq!(store.read(0x0002, 0x0004), ClientCfg::NONE);
    }

    #[test]
    fn update_without_table_is_invalid_parameter() {
        let mut store = CharCfgStore::new(2);
        assert!(matches!(
            store.update(0x0001, 0x0009, ClientCfg::NOTIFY),
            Err(ServError::InvalidParameter(_))
        ));
    }

    #[test]
    fn table_never_grows_past_max_connections() {
        let mut store = CharCfgStore::new(2);
        store.init_table(0x0004);
        store.update(0x0001, 0x0004, ClientCfg::NOTIFY).unwrap();
        store.update(0x0002, 0x0004, ClientCfg::NOTIFY).unwrap();
        assert!(matches!(
            store.update(0x0003, 0x0004, ClientCfg::NOTIFY),
            Err(ServError::InvalidParameter(_))
        ));
        // Existing rows are still updatable at capacity.
        store.update(0x0002, 0x0004, ClientCfg::NONE).unwrap();
    }

    #[test]
    fn teardown_invalidates_rows_but_frees_slots() {
        let mut store = CharCfgStore::new(1);
        store.init_table(0x0004);
        store.update(0x0001, 0x0004, ClientCfg::INDICATE).unwrap();

        store.connection_closed(0x0001);
        assert_eq!(store.read(0x0001, 0x0004), ClientCfg::NONE);
        assert!(store.subscribed(0x0004).is_empty());

        // The freed slot is reusable by the next connection.
        store.update(0x0002, 0x0004, ClientCfg::NOTIFY).unwrap();
        assert_eq!(store.subscribed(0x0004), vec![(0x0002, ClientCfg::NOTIFY)]);
    }

    #[test]
    fn subscribed_reports_only_enabled_rows() {
        let mut store = CharCfgStore::new(3);
        store.init_table(0x0004);
        store.update(0x0001, 0x0004, ClientCfg::NOTIFY).unwrap();
        store.update(0x0002, 0x0004, ClientCfg::NONE).unwrap();
        store.update(0x0003, 0x0004, ClientCfg::INDICATE).unwrap();

        let mut subs = store.subscribed(0x0004);
        subs.sort_by_key(|(c, _)| *c);
        assert_eq!(
            subs,
            vec![(0x0001, ClientCfg::NOTIFY), (0x0003, ClientCfg::INDICATE)]
        );
    }

    #[test]
    fn purge_range_drops_tables_in_freed_handles() {
        let mut store = CharCfgStore::new(1);
        store.init_table(0x0004);
        store.init_table(0x0008);
        store.purge_range(0x0001, 0x0005);
        assert!(!store.has_table(0x0004));
        assert!(store.has_table(0x0008));
    }
}
