//! Core attribute record types

use super::constants::*;
use crate::uuid::Uuid;
use byteorder::{LittleEndian, WriteBytesExt};

/// Attribute permission flags.
///
/// Read/write access plus the security requirements (encryption,
/// authentication, authorization) the transport must satisfy before the
/// operation reaches a service callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttPermissions(u16);

impl AttPermissions {
    /// No access
    pub const fn none() -> Self {
        Self(0)
    }

    /// Create permissions from a raw bitmask
    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    pub const fn read_only() -> Self {
        Self(ATT_PERM_READ)
    }

    pub const fn write_only() -> Self {
        Self(ATT_PERM_WRITE)
    }

    pub const fn read_write() -> Self {
        Self(ATT_PERM_READ | ATT_PERM_WRITE)
    }

    /// Raw bitmask value
    pub const fn value(&self) -> u16 {
        self.0
    }

    pub const fn can_read(&self) -> bool {
        self.0 & ATT_PERM_READ != 0
    }

    pub const fn can_write(&self) -> bool {
        self.0 & ATT_PERM_WRITE != 0
    }

    pub const fn read_requires_encryption(&self) -> bool {
        self.0 & ATT_PERM_READ_ENCRYPTED != 0
    }

    pub const fn write_requires_encryption(&self) -> bool {
        self.0 & ATT_PERM_WRITE_ENCRYPTED != 0
    }

    pub const fn read_requires_authentication(&self) -> bool {
        self.0 & ATT_PERM_READ_AUTHENTICATED != 0
    }

    pub const fn write_requires_authentication(&self) -> bool {
        self.0 & ATT_PERM_WRITE_AUTHENTICATED != 0
    }

    /// True when a read or write must first pass the authorize callback
    pub const fn requires_authorization(&self) -> bool {
        self.0 & (ATT_PERM_READ_AUTHORIZED | ATT_PERM_WRITE_AUTHORIZED) != 0
    }
}

/// Opaque token identifying a service-owned attribute value.
///
/// The registering service picks the token and keeps the storage behind it;
/// the engine never dereferences, interprets, or copies the payload. Tokens
/// only need to be unique within one service's attribute table, since
/// value-reference lookup is always scoped to a single table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueRef(pub u32);

impl ValueRef {
    /// Token for attributes the owning service never looks up by value
    pub const NONE: ValueRef = ValueRef(0);
}

/// One entry in the server's attribute table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Protocol handle, assigned by the registry; 0 until registered
    pub handle: u16,
    /// Attribute type
    pub type_: Uuid,
    /// Access permissions
    pub permissions: AttPermissions,
    /// Service-owned value token
    pub value: ValueRef,
}

impl Attribute {
    /// Create an unregistered attribute record
    pub fn new(type_: Uuid, permissions: AttPermissions, value: ValueRef) -> Self {
        Self {
            handle: 0,
            type_,
            permissions,
            value,
        }
    }

    /// Primary service declaration record
    pub fn primary_service(value: ValueRef) -> Self {
        Self::new(
            Uuid::from_u16(PRIMARY_SERVICE_UUID),
            AttPermissions::read_only(),
            value,
        )
    }

    /// Characteristic declaration record
    pub fn characteristic_decl(value: ValueRef) -> Self {
        Self::new(
            Uuid::from_u16(CHARACTERISTIC_UUID),
            AttPermissions::read_only(),
            value,
        )
    }

    /// Client characteristic configuration descriptor record
    pub fn client_char_cfg(value: ValueRef) -> Self {
        Self::new(
            Uuid::from_u16(CLIENT_CHAR_CONFIG_UUID),
            AttPermissions::read_write(),
            value,
        )
    }

    /// True when this record is a primary or secondary service declaration
    pub fn is_service_decl(&self) -> bool {
        matches!(
            self.type_.as_u16(),
            Some(PRIMARY_SERVICE_UUID) | Some(SECONDARY_SERVICE_UUID)
        )
    }
}

/// Client characteristic configuration value for one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClientCfg(pub u16);

impl ClientCfg {
    pub const NONE: ClientCfg = ClientCfg(GATT_CFG_NO_OPERATION);
    pub const NOTIFY: ClientCfg = ClientCfg(GATT_CLIENT_CFG_NOTIFY);
    pub const INDICATE: ClientCfg = ClientCfg(GATT_CLIENT_CFG_INDICATE);

    pub const fn notify_enabled(&self) -> bool {
        self.0 & GATT_CLIENT_CFG_NOTIFY != 0
    }

    pub const fn indicate_enabled(&self) -> bool {
        self.0 & GATT_CLIENT_CFG_INDICATE != 0
    }

    /// True when either subscription bit is set
    pub const fn subscribed(&self) -> bool {
        self.notify_enabled() || self.indicate_enabled()
    }

    /// True when no bits outside the defined configuration mask are set
    pub const fn is_valid(&self) -> bool {
        self.0 & !(GATT_CLIENT_CFG_NOTIFY | GATT_CLIENT_CFG_INDICATE) == 0
    }
}

/// Characteristic presentation format descriptor value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GattCharFormat {
    /// Format of the characteristic value
    pub format: u8,
    /// Exponent applied to integer formats
    pub exponent: i8,
    /// Unit as defined in the data dictionary
    pub unit: u16,
    /// Namespace of the description
    pub name_space: u8,
    /// Description as defined in a higher layer profile
    pub desc: u16,
}

impl GattCharFormat {
    /// Encode into the 7-octet descriptor wire form
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(7);
        out.write_u8(self.format).unwrap();
        out.write_i8(self.exponent).unwrap();
        out.write_u16::<LittleEndian>(self.unit).unwrap();
        out.write_u8(self.name_space).unwrap();
        out.write_u16::<LittleEndian>(self.desc).unwrap();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_predicates() {
        let p = AttPermissions::new(ATT_PERM_READ | ATT_PERM_WRITE_AUTHORIZED);
        assert!(p.can_read());
        assert!(!p.can_write());
        assert!(p.requires_authorization());
        assert!(!AttPermissions::read_write().requires_authorization());
    }

    #[test]
    fn service_decl_detection() {
        assert!(Attribute::primary_service(ValueRef::NONE).is_service_decl());
        let char_decl = Attribute::characteristic_decl(ValueRef::NONE);
        assert!(!char_decl.is_service_decl());
    }

    #[test]
    fn client_cfg_bits() {
        assert!(ClientCfg::NOTIFY.subscribed());
        assert!(!ClientCfg::NONE.subscribed());
        assert!(ClientCfg(0x0003).is_valid());
        assert!(!ClientCfg(0x0004).is_valid());
    }

    #[test]
    fn char_format_wire_form() {
        let fmt = GattCharFormat {
            format: 0x06, // uint16
            exponent: -1,
            unit: 0x272F,
            name_space: 0x01,
            desc: 0x0000,
        };
        assert_eq!(fmt.to_bytes(), vec![0x06, 0xFF, 0x2F, 0x27, 0x01, 0x00, 0x00]);
    }
}
