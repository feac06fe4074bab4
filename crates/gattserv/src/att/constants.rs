//! Attribute protocol constants used by the server engine

// ATT error codes
pub const ATT_ERROR_INVALID_HANDLE: u8 = 0x01;
pub const ATT_ERROR_READ_NOT_PERMITTED: u8 = 0x02;
pub const ATT_ERROR_WRITE_NOT_PERMITTED: u8 = 0x03;
pub const ATT_ERROR_INSUFFICIENT_AUTHENTICATION: u8 = 0x05;
pub const ATT_ERROR_REQUEST_NOT_SUPPORTED: u8 = 0x06;
pub const ATT_ERROR_INVALID_OFFSET: u8 = 0x07;
pub const ATT_ERROR_INSUFFICIENT_AUTHORIZATION: u8 = 0x08;
pub const ATT_ERROR_PREPARE_QUEUE_FULL: u8 = 0x09;
pub const ATT_ERROR_ATTRIBUTE_NOT_FOUND: u8 = 0x0A;
pub const ATT_ERROR_INSUFFICIENT_ENCRYPTION: u8 = 0x0F;
pub const ATT_ERROR_INVALID_ATTRIBUTE_VALUE_LENGTH: u8 = 0x0D;
pub const ATT_ERROR_UNLIKELY: u8 = 0x0E;
pub const ATT_ERROR_INSUFFICIENT_RESOURCES: u8 = 0x11;
pub const ATT_ERROR_VALUE_NOT_ALLOWED: u8 = 0x13;
pub const ATT_ERROR_APPLICATION_ERROR_START: u8 = 0x80;
pub const ATT_ERROR_APPLICATION_ERROR_END: u8 = 0x9F;

// Request opcodes seen by the authorize callback
pub const ATT_READ_REQ: u8 = 0x0A;
pub const ATT_WRITE_REQ: u8 = 0x12;

// ATT handle space
pub const ATT_HANDLE_MIN: u16 = 0x0001;
pub const ATT_HANDLE_MAX: u16 = 0xFFFF;

// Reserved connection handle marking a free client configuration row
pub const CONN_HANDLE_INVALID: u16 = 0xFFFF;

// ATT attribute permission flags
pub const ATT_PERM_READ: u16 = 0x0001;
pub const ATT_PERM_WRITE: u16 = 0x0002;
pub const ATT_PERM_READ_ENCRYPTED: u16 = 0x0004;
pub const ATT_PERM_WRITE_ENCRYPTED: u16 = 0x0008;
pub const ATT_PERM_READ_AUTHENTICATED: u16 = 0x0010;
pub const ATT_PERM_WRITE_AUTHENTICATED: u16 = 0x0020;
pub const ATT_PERM_READ_AUTHORIZED: u16 = 0x0040;
pub const ATT_PERM_WRITE_AUTHORIZED: u16 = 0x0080;

// Attribute declaration UUIDs
pub const PRIMARY_SERVICE_UUID: u16 = 0x2800;
pub const SECONDARY_SERVICE_UUID: u16 = 0x2801;
pub const INCLUDE_UUID: u16 = 0x2802;
pub const CHARACTERISTIC_UUID: u16 = 0x2803;
pub const CLIENT_CHAR_CONFIG_UUID: u16 = 0x2902;
pub const CHAR_FORMAT_UUID: u16 = 0x2904;

// SIG-assigned service and characteristic UUIDs used by the built-in service
pub const GATT_SERVICE_UUID: u16 = 0x1801;
pub const SERVICE_CHANGED_UUID: u16 = 0x2A05;

// Client characteristic configuration bits
pub const GATT_CLIENT_CFG_NOTIFY: u16 = 0x0001;
pub const GATT_CLIENT_CFG_INDICATE: u16 = 0x0002;
pub const GATT_CFG_NO_OPERATION: u16 = 0x0000;

// Characteristic property bits (characteristic declaration value)
pub const GATT_PROP_BCAST: u8 = 0x01;
pub const GATT_PROP_READ: u8 = 0x02;
pub const GATT_PROP_WRITE_NO_RSP: u8 = 0x04;
pub const GATT_PROP_WRITE: u8 = 0x08;
pub const GATT_PROP_NOTIFY: u8 = 0x10;
pub const GATT_PROP_INDICATE: u8 = 0x20;
pub const GATT_PROP_AUTHEN: u8 = 0x40;
pub const GATT_PROP_EXTENDED: u8 = 0x80;

// Upper bound for the simultaneous prepare-write tunable
pub const PREPARE_WRITE_QUEUE_MAX: u8 = 64;
