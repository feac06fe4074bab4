//! GATT server application
//!
//! [`GattServApp`] is the engine facade: it owns the service registry, the
//! client configuration store, and the parameter store, installs the built-in
//! GATT Service through the same registration path every profile uses, and
//! hosts the task hooks the scheduler drives. The dispatch entry points live
//! in [`super::dispatch`].

use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU8, Ordering};
use std::sync::{Arc, RwLock};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::{debug, info, warn};

use crate::att::types::{Attribute, ClientCfg, ValueRef};
use crate::att::{
    AttErrorCode, AttPermissions, AttributeTable, ServError, ServResult, CHARACTERISTIC_UUID,
    CLIENT_CHAR_CONFIG_UUID, GATT_PROP_INDICATE, GATT_SERVICE_UUID, SERVICE_CHANGED_UUID,
};
use crate::uuid::Uuid;

use super::charcfg::CharCfgStore;
use super::params::ParamStore;
use super::registry::ServiceRegistry;
use super::service::ServiceCallbacks;

// Built-in service bit fields
pub const GATT_SERVICE: u32 = 0x0000_0001;
pub const GATT_ALL_SERVICES: u32 = 0xFFFF_FFFF;
const DEFINED_SERVICES: u32 = GATT_SERVICE;

/// Task event bit: a registry change requires a Service Changed indication
pub const GATT_SERV_SERVICE_CHANGED_EVT: u16 = 0x0001;

/// Task id value meaning "not initialized"
const TASK_ID_UNASSIGNED: u8 = 0xFF;

/// Engine sizing. Both limits are fixed at construction; the engine never
/// grows past them.
#[derive(Debug, Clone)]
pub struct GattServConfig {
    /// Maximum concurrent connections tracked per configurable attribute
    pub max_connections: usize,
    /// Service registration slots
    pub registry_capacity: usize,
}

impl Default for GattServConfig {
    fn default() -> Self {
        Self {
            max_connections: 8,
            registry_capacity: 16,
        }
    }
}

/// The GATT server application engine.
///
/// All state is interior-mutable so callers hold the engine behind an `Arc`
/// and share it with the transport layer, the bond manager, and service
/// implementations. The runtime model is a single cooperative task; the
/// locks exist for API soundness, never for internal parallelism.
pub struct GattServApp {
    config: GattServConfig,
    pub(super) registry: RwLock<ServiceRegistry>,
    charcfg: Arc<RwLock<CharCfgStore>>,
    params: RwLock<ParamStore>,
    /// CCC descriptor handle -> owning characteristic value handle
    ccc_map: RwLock<BTreeMap<u16, u16>>,
    /// Service handle currently inside a dispatch callback, 0 when idle
    pub(super) dispatching: AtomicU16,
    task_id: AtomicU8,
    /// First handle of the installed built-in GATT Service, 0 when absent
    gatt_service_handle: AtomicU16,
    /// Affected handle range for the next Service Changed indication
    changed_range: RwLock<(u16, u16)>,
    service_changed_pending: AtomicBool,
}

impl GattServApp {
    pub fn new(config: GattServConfig) -> Self {
        Self {
            registry: RwLock::new(ServiceRegistry::new(config.registry_capacity)),
            charcfg: Arc::new(RwLock::new(CharCfgStore::new(config.max_connections))),
            params: RwLock::new(ParamStore::new()),
            ccc_map: RwLock::new(BTreeMap::new()),
            dispatching: AtomicU16::new(0),
            task_id: AtomicU8::new(TASK_ID_UNASSIGNED),
            gatt_service_handle: AtomicU16::new(0),
            changed_range: RwLock::new((0, 0)),
            service_changed_pending: AtomicBool::new(false),
            config,
        }
    }

    /// Engine sizing this instance was built with
    pub fn config(&self) -> &GattServConfig {
        &self.config
    }

    /// One-time task setup, called by the scheduler before any other entry
    /// point.
    pub fn init(&self, task_id: u8) {
        self.task_id.store(task_id, Ordering::Relaxed);
        info!("gatt server task {} initialized", task_id);
    }

    /// Cooperative event drain. Consumes the events this engine understands
    /// and returns the rest so the scheduler can re-deliver or drop them.
    pub fn process_event(&self, task_id: u8, events: u16) -> u16 {
        if task_id != self.task_id.load(Ordering::Relaxed) {
            return events;
        }
        if events & GATT_SERV_SERVICE_CHANGED_EVT != 0 {
            if self.service_changed_pending.swap(false, Ordering::Relaxed) {
                let range = *self.changed_range.read().unwrap();
                let eligible = self.notify_eligible(self.service_changed_value_handle());
                debug!(
                    "service changed {:#06x}..{:#06x}, {} subscribed connections",
                    range.0,
                    range.1,
                    eligible.len()
                );
            }
            return events & !GATT_SERV_SERVICE_CHANGED_EVT;
        }
        events
    }

    /// Register a service's attribute table and callback set.
    ///
    /// Client characteristic configuration descriptors in the table get a
    /// per-connection configuration table keyed by their characteristic's
    /// value handle.
    pub fn register_service(
        &self,
        table: AttributeTable,
        callbacks: Arc<dyn ServiceCallbacks>,
    ) -> ServResult<u16> {
        let (first, ccc_pairs) = {
            let mut registry = self.registry.write().unwrap();
            let first = registry.register_service(table, callbacks)?;
            let reg = registry
                .find_registration(first)
                .ok_or(ServError::Failure("registration vanished"))?;
            (first, collect_ccc_pairs(reg.table()))
        };

        {
            let mut store = self.charcfg.write().unwrap();
            let mut map = self.ccc_map.write().unwrap();
            for (ccc_handle, value_handle) in ccc_pairs {
                store.init_table(value_handle);
                map.insert(ccc_handle, value_handle);
            }
        }

        self.note_registry_change(first);
        Ok(first)
    }

    /// Deregister the service registered at `handle`, handing its attribute
    /// table back to the caller.
    ///
    /// Rejected while the dispatch router is inside one of this service's
    /// callbacks: the callback still holds the attribute record, and freeing
    /// the range under it is exactly the hazard this guard exists for.
    pub fn deregister_service(&self, handle: u16) -> ServResult<AttributeTable> {
        if self.dispatching.load(Ordering::Relaxed) == handle {
            return Err(ServError::Failure("service callback in progress"));
        }

        let table = {
            let mut registry = self.registry.write().unwrap();
            registry.deregister_service(handle)?
        };

        let (first, last) = (table.first_handle(), table.last_handle());
        self.charcfg.write().unwrap().purge_range(first, last);
        self.ccc_map
            .write()
            .unwrap()
            .retain(|&ccc, _| ccc < first || ccc > last);

        if self.gatt_service_handle.load(Ordering::Relaxed) == handle {
            self.gatt_service_handle.store(0, Ordering::Relaxed);
        }
        self.note_registry_change(first);
        Ok(table)
    }

    /// Find the attribute record within a caller-supplied table for a given
    /// value reference.
    pub fn find_attr(table: &AttributeTable, value: ValueRef) -> Option<&Attribute> {
        table.find_by_value_ref(value)
    }

    /// Attribute record for a handle anywhere in the registry
    pub fn find_by_handle(&self, handle: u16) -> Option<Attribute> {
        self.registry.read().unwrap().find_by_handle(handle).cloned()
    }

    /// Number of attributes in a contiguous handle sub-range
    pub fn attr_count(&self, first: u16, last: u16) -> usize {
        self.registry.read().unwrap().attr_count(first, last)
    }

    // --- client characteristic configuration -----------------------------

    /// Update the configuration value for a (connection, attribute) pair.
    ///
    /// This is the sanctioned writer for the bond manager replaying stored
    /// state on reconnect; ordinary ATT writes to the descriptor arrive
    /// through [`GattServApp::process_ccc_write`].
    pub fn update_char_cfg(
        &self,
        conn_handle: u16,
        attr_handle: u16,
        value: ClientCfg,
    ) -> ServResult<()> {
        self.charcfg
            .write()
            .unwrap()
            .update(conn_handle, attr_handle, value)
    }

    /// Configuration value for a (connection, attribute) pair
    pub fn read_char_cfg(&self, conn_handle: u16, attr_handle: u16) -> ClientCfg {
        self.charcfg.read().unwrap().read(conn_handle, attr_handle)
    }

    /// Connections with notifications or indications enabled for an
    /// attribute, for the outbound notification/indication sender.
    pub fn notify_eligible(&self, attr_handle: u16) -> Vec<(u16, ClientCfg)> {
        self.charcfg.read().unwrap().subscribed(attr_handle)
    }

    /// Link teardown hook from the connection manager. Rows for the
    /// connection are invalidated; values stay in memory for bonded
    /// reconnect replay.
    pub fn connection_closed(&self, conn_handle: u16) {
        self.charcfg.write().unwrap().connection_closed(conn_handle);
    }

    /// Validate and apply an ATT write to a client characteristic
    /// configuration descriptor, for use inside service write callbacks.
    pub fn process_ccc_write(
        &self,
        conn_handle: u16,
        ccc_attr: &Attribute,
        value: &[u8],
        offset: u16,
    ) -> Result<(), AttErrorCode> {
        let cfg = parse_ccc_value(value, offset)?;
        let value_handle = self
            .ccc_map
            .read()
            .unwrap()
            .get(&ccc_attr.handle)
            .copied()
            .ok_or(AttErrorCode::Unlikely)?;
        self.charcfg
            .write()
            .unwrap()
            .update(conn_handle, value_handle, cfg)
            .map_err(|e| match e {
                ServError::InvalidParameter(msg) if msg == CharCfgStore::TABLE_FULL => {
                    AttErrorCode::InsufficientResources
                }
                _ => AttErrorCode::Unlikely,
            })
    }

    // --- parameters -------------------------------------------------------

    pub fn set_parameter(&self, id: u8, value: &[u8]) -> ServResult<()> {
        self.params.write().unwrap().set_parameter(id, value)
    }

    pub fn get_parameter(&self, id: u8) -> ServResult<Vec<u8>> {
        self.params.read().unwrap().get_parameter(id)
    }

    pub fn set_param_value(&self, value: u16) {
        self.params.write().unwrap().set_param_value(value);
    }

    pub fn param_value(&self) -> u16 {
        self.params.read().unwrap().param_value()
    }

    /// Current prepare-write limit
    pub fn num_prepare_writes(&self) -> u8 {
        self.params.read().unwrap().num_prepare_writes()
    }

    /// Open a prepare-write transaction: the prepare-write limit is locked
    /// against changes until [`GattServApp::end_prepare_writes`].
    pub fn begin_prepare_writes(&self) -> ServResult<()> {
        self.params
            .write()
            .unwrap()
            .lock(super::params::GATT_PARAM_NUM_PREPARE_WRITES)
    }

    pub fn end_prepare_writes(&self) {
        self.params
            .write()
            .unwrap()
            .unlock(super::params::GATT_PARAM_NUM_PREPARE_WRITES);
    }

    // --- built-in service lifecycle --------------------------------------

    /// Install the requested built-in services.
    ///
    /// All-or-none: if any requested bit fails, services added earlier in
    /// the same call are rolled back before the error returns.
    pub fn add_service(&self, services: u32) -> ServResult<()> {
        let bits = normalize_service_bits(services)?;
        let mut added: Vec<u16> = Vec::new();

        let result = (|| {
            if bits & GATT_SERVICE != 0 {
                if self.gatt_service_handle.load(Ordering::Relaxed) != 0 {
                    return Err(ServError::Failure("service already added"));
                }
                let handle = self.register_gatt_service()?;
                added.push(handle);
            }
            Ok(())
        })();

        if let Err(err) = result {
            for handle in added {
                if let Err(rollback) = self.deregister_service(handle) {
                    warn!("rollback of service {:#06x} failed: {}", handle, rollback);
                }
            }
            return Err(err);
        }
        Ok(())
    }

    /// Remove the requested built-in services.
    pub fn del_service(&self, services: u32) -> ServResult<()> {
        let bits = normalize_service_bits(services)?;
        if bits & GATT_SERVICE != 0 {
            let handle = self.gatt_service_handle.load(Ordering::Relaxed);
            if handle == 0 {
                return Err(ServError::Failure("service not present"));
            }
            self.deregister_service(handle)?;
        }
        Ok(())
    }

    /// First handle of the installed built-in GATT Service, if present
    pub fn gatt_service_handle(&self) -> Option<u16> {
        match self.gatt_service_handle.load(Ordering::Relaxed) {
            0 => None,
            h => Some(h),
        }
    }

    /// Wire form of the Service Changed characteristic value: affected
    /// start and end handles, little-endian. The outbound indication sender
    /// pairs this with [`GattServApp::notify_eligible`].
    pub fn service_changed_value(&self) -> [u8; 4] {
        let (start, end) = *self.changed_range.read().unwrap();
        let mut out = [0u8; 4];
        let mut cursor = &mut out[..];
        cursor.write_u16::<LittleEndian>(start).unwrap();
        cursor.write_u16::<LittleEndian>(end).unwrap();
        out
    }

    fn service_changed_value_handle(&self) -> u16 {
        // Layout of the built-in table: decl, char decl, value, CCC.
        match self.gatt_service_handle.load(Ordering::Relaxed) {
            0 => 0,
            h => h + 2,
        }
    }

    fn register_gatt_service(&self) -> ServResult<u16> {
        let table = AttributeTable::new(vec![
            Attribute::primary_service(GattServiceCallbacks::VREF_SERVICE_DECL),
            Attribute::characteristic_decl(GattServiceCallbacks::VREF_CHANGED_DECL),
            Attribute::new(
                Uuid::from_u16(SERVICE_CHANGED_UUID),
                AttPermissions::none(), // indicate-only
                GattServiceCallbacks::VREF_CHANGED_VALUE,
            ),
            Attribute::client_char_cfg(GattServiceCallbacks::VREF_CHANGED_CCC),
        ]);

        let callbacks = Arc::new(GattServiceCallbacks {
            charcfg: Arc::clone(&self.charcfg),
        });
        let handle = self.register_service(table, callbacks)?;
        self.gatt_service_handle.store(handle, Ordering::Relaxed);
        info!("built-in GATT service at {:#06x}", handle);
        Ok(handle)
    }

    /// Record the affected range and queue a Service Changed indication
    fn note_registry_change(&self, first_affected: u16) {
        let mut range = self.changed_range.write().unwrap();
        if self.service_changed_pending.swap(true, Ordering::Relaxed) {
            range.0 = range.0.min(first_affected);
            range.1 = crate::att::ATT_HANDLE_MAX;
        } else {
            *range = (first_affected, crate::att::ATT_HANDLE_MAX);
        }
    }
}

/// Callback set for the built-in GATT Service.
///
/// The Service Changed characteristic is indicate-only; only its declaration
/// attributes and CCC descriptor are readable, and only the CCC descriptor
/// is writable.
struct GattServiceCallbacks {
    charcfg: Arc<RwLock<CharCfgStore>>,
}

impl GattServiceCallbacks {
    const VREF_SERVICE_DECL: ValueRef = ValueRef(1);
    const VREF_CHANGED_DECL: ValueRef = ValueRef(2);
    const VREF_CHANGED_VALUE: ValueRef = ValueRef(3);
    const VREF_CHANGED_CCC: ValueRef = ValueRef(4);
}

impl ServiceCallbacks for GattServiceCallbacks {
    fn read_attr(
        &self,
        conn_handle: u16,
        attr: &Attribute,
        offset: u16,
        max_len: usize,
    ) -> Result<Vec<u8>, AttErrorCode> {
        let full: Vec<u8> = match attr.value {
            Self::VREF_SERVICE_DECL => GATT_SERVICE_UUID.to_le_bytes().to_vec(),
            Self::VREF_CHANGED_DECL => {
                // properties, value handle, characteristic UUID
                let mut out = Vec::with_capacity(5);
                out.push(GATT_PROP_INDICATE);
                out.write_u16::<LittleEndian>(attr.handle + 1).unwrap();
                out.write_u16::<LittleEndian>(SERVICE_CHANGED_UUID).unwrap();
                out
            }
            Self::VREF_CHANGED_CCC => {
                // CCC descriptor directly follows the characteristic value.
                let cfg = self
                    .charcfg
                    .read()
                    .unwrap()
                    .read(conn_handle, attr.handle - 1);
                cfg.0.to_le_bytes().to_vec()
            }
            _ => return Err(AttErrorCode::ReadNotPermitted),
        };

        let offset = usize::from(offset);
        if offset > full.len() {
            return Err(AttErrorCode::InvalidOffset);
        }
        Ok(full[offset..].iter().copied().take(max_len).collect())
    }

    fn write_attr(
        &self,
        conn_handle: u16,
        attr: &Attribute,
        value: &[u8],
        offset: u16,
    ) -> Result<(), AttErrorCode> {
        if attr.value != Self::VREF_CHANGED_CCC {
            return Err(AttErrorCode::WriteNotPermitted);
        }
        let cfg = parse_ccc_value(value, offset)?;
        // Service Changed supports indications only.
        if cfg.notify_enabled() {
            return Err(AttErrorCode::ValueNotAllowed);
        }
        self.charcfg
            .write()
            .unwrap()
            .update(conn_handle, attr.handle - 1, cfg)
            .map_err(|_| AttErrorCode::InsufficientResources)
    }
}

/// Decode and validate a CCC descriptor write
fn parse_ccc_value(value: &[u8], offset: u16) -> Result<ClientCfg, AttErrorCode> {
    if offset != 0 {
        return Err(AttErrorCode::InvalidOffset);
    }
    if value.len() != 2 {
        return Err(AttErrorCode::InvalidAttributeValueLength);
    }
    let mut cursor = Cursor::new(value);
    let raw = cursor
        .read_u16::<LittleEndian>()
        .map_err(|_| AttErrorCode::InvalidAttributeValueLength)?;
    let cfg = ClientCfg(raw);
    if !cfg.is_valid() {
        return Err(AttErrorCode::ValueNotAllowed);
    }
    Ok(cfg)
}

/// Check a service bitmask against the defined set, expanding the
/// all-services shorthand.
fn normalize_service_bits(services: u32) -> ServResult<u32> {
    if services == GATT_ALL_SERVICES {
        return Ok(DEFINED_SERVICES);
    }
    if services & !DEFINED_SERVICES != 0 {
        return Err(ServError::InvalidParameter("unknown service bit"));
    }
    if services == 0 {
        return Err(ServError::InvalidParameter("no service bits set"));
    }
    Ok(services)
}

/// CCC descriptors in a registered table, paired with their characteristic
/// value handles. A descriptor with no preceding characteristic declaration
/// is skipped; such a table is malformed and gets no configuration rows.
fn collect_ccc_pairs(table: &AttributeTable) -> Vec<(u16, u16)> {
    let mut pairs = Vec::new();
    let mut last_value_handle = None;
    for attr in table.iter() {
        match attr.type_.as_u16() {
            Some(CHARACTERISTIC_UUID) => last_value_handle = Some(attr.handle + 1),
            Some(CLIENT_CHAR_CONFIG_UUID) => match last_value_handle {
                Some(value_handle) => pairs.push((attr.handle, value_handle)),
                None => warn!(
                    "CCC descriptor {:#06x} has no preceding characteristic",
                    attr.handle
                ),
            },
            _ => {}
        }
    }
    pairs
}
