//! Attribute protocol foundation for the GATT server engine
//!
//! Defines the attribute record types, permission and configuration bit
//! fields, protocol error codes, and the caller-built attribute table the
//! registry operates on.

pub mod constants;
pub mod error;
pub mod table;
pub mod types;

pub use self::constants::*;
pub use self::error::{AttErrorCode, ServError, ServResult};
pub use self::table::AttributeTable;
pub use self::types::{AttPermissions, Attribute, ClientCfg, GattCharFormat, ValueRef};
