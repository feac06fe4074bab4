//! GATT server application layer
//!
//! Service registration, attribute dispatch, per-connection client
//! configuration, server parameters, and the built-in GATT Service
//! lifecycle.

pub mod charcfg;
pub mod dispatch;
pub mod params;
pub mod registry;
pub mod server;
pub mod service;


pub use charcfg::CharCfgStore;
pub use params::{ParamStore, GATT_PARAM_NUM_PREPARE_WRITES, GATT_PARAM_SERVER_VALUE};
pub use registry::{ServiceRegistration, ServiceRegistry};
pub use server::{
    GattServApp, GattServConfig, GATT_ALL_SERVICES, GATT_SERVICE, GATT_SERV_SERVICE_CHANGED_EVT,
};
pub use service::{NoCallbacks, ServiceCallbacks};
