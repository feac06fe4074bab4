//! gattserv - the attribute database and dispatch engine of a BLE GATT server
//!
//! Independent profile implementations register ordered attribute tables with
//! the [`gatt::GattServApp`] engine, which assigns stable protocol handles,
//! routes incoming ATT Read/Write/Authorize operations to the owning
//! service's callbacks, and tracks per-connection notify/indicate
//! configuration for every attribute that supports it.
//!
//! The ATT/L2CAP transport, link-layer connection management, bonding
//! persistence, and the byte-level encoding of each attribute's value are
//! external collaborators; the engine exposes the interfaces they drive and
//! never interprets attribute payloads itself.

pub mod att;
pub mod gatt;
pub mod uuid;

// Re-export common types for convenience
pub use att::{
    AttErrorCode, AttPermissions, Attribute, AttributeTable, ClientCfg, GattCharFormat,
    ServError, ServResult, ValueRef,
};
pub use gatt::{GattServApp, GattServConfig, ServiceCallbacks};
pub use uuid::Uuid;
