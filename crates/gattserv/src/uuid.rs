//! Bluetooth UUID representation for attribute types and service identities.

use rand::RngCore;
use std::fmt;
use std::str::FromStr;

/// A Bluetooth UUID in its 16-bit, 32-bit, or full 128-bit form.
///
/// SIG-assigned identifiers (attribute declaration types, standard services
/// and characteristics) use the short forms; vendor services carry a full
/// 128-bit UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Uuid {
    /// 16-bit SIG-assigned UUID
    Uuid16(u16),
    /// 32-bit SIG-assigned UUID
    Uuid32(u32),
    /// Full 128-bit UUID, little-endian bytes
    Uuid128([u8; 16]),
}

impl Uuid {
    /// Create a UUID from a 16-bit value
    pub const fn from_u16(uuid: u16) -> Self {
        Uuid::Uuid16(uuid)
    }

    /// Create a UUID from a 32-bit value
    pub const fn from_u32(uuid: u32) -> Self {
        Uuid::Uuid32(uuid)
    }

    /// Create a UUID from a 128-bit value
    pub const fn from_u128(uuid: u128) -> Self {
        Uuid::Uuid128(uuid.to_le_bytes())
    }

    /// Convert raw little-endian bytes to a UUID based on length.
    ///
    /// Accepts slices of length 2, 4, or 16; returns `None` otherwise.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        match bytes.len() {
            2 => Some(Uuid::Uuid16(u16::from_le_bytes([bytes[0], bytes[1]]))),
            4 => Some(Uuid::Uuid32(u32::from_le_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3],
            ]))),
            16 => {
                let mut uuid = [0u8; 16];
                uuid.copy_from_slice(bytes);
                Some(Uuid::Uuid128(uuid))
            }
            _ => None,
        }
    }

    /// Generate a random (version 4) 128-bit UUID for a vendor service.
    pub fn new_random_v4() -> Self {
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        // Version 4, RFC 4122 variant. Stored little-endian, so the version
        // nibble lands in byte 7 and the variant bits in byte 8.
        bytes[7] = (bytes[7] & 0x0F) | 0x40;
        bytes[8] = (bytes[8] & 0x3F) | 0x80;
        Uuid::Uuid128(bytes)
    }

    /// Get the little-endian byte representation of this UUID
    pub fn as_bytes(&self) -> Vec<u8> {
        match self {
            Uuid::Uuid16(uuid) => uuid.to_le_bytes().to_vec(),
            Uuid::Uuid32(uuid) => uuid.to_le_bytes().to_vec(),
            Uuid::Uuid128(uuid) => uuid.to_vec(),
        }
    }

    /// Get the 16-bit value if this is a 16-bit UUID
    pub fn as_u16(&self) -> Option<u16> {
        match self {
            Uuid::Uuid16(uuid) => Some(*uuid),
            _ => None,
        }
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Uuid::Uuid16(uuid) => write!(f, "{:04x}", uuid),
            Uuid::Uuid32(uuid) => write!(f, "{:08x}", uuid),
            Uuid::Uuid128(uuid) => {
                write!(
                    f,
                    "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
                    uuid[15], uuid[14], uuid[13], uuid[12],
                    uuid[11], uuid[10],
                    uuid[9], uuid[8],
                    uuid[7], uuid[6],
                    uuid[5], uuid[4], uuid[3], uuid[2], uuid[1], uuid[0]
                )
            }
        }
    }
}

/// Error parsing a UUID from its string form
#[derive(Debug, thiserror::Error)]
pub enum UuidParseError {
    #[error("invalid UUID length: {0}")]
    InvalidLength(usize),
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
}

impl FromStr for Uuid {
    type Err = UuidParseError;

    /// Parse `"2902"`, `"00002902"`, or the full dashed 128-bit form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned: String = s.chars().filter(|c| *c != '-').collect();
        match cleaned.len() {
            4 => {
                let mut be = [0u8; 2];
                hex::decode_to_slice(&cleaned, &mut be)?;
                Ok(Uuid::Uuid16(u16::from_be_bytes(be)))
            }
            8 => {
                let mut be = [0u8; 4];
                hex::decode_to_slice(&cleaned, &mut be)?;
                Ok(Uuid::Uuid32(u32::from_be_bytes(be)))
            }
            32 => {
                let mut be = [0u8; 16];
                hex::decode_to_slice(&cleaned, &mut be)?;
                be.reverse();
                Ok(Uuid::Uuid128(be))
            }
            len => Err(UuidParseError::InvalidLength(len)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_forms_round_trip_through_bytes() {
        let u = Uuid::from_u16(0x2902);
        assert_eq!(Uuid::from_bytes(&u.as_bytes()), Some(u));

        let u = Uuid::from_u32(0x0001_2902);
        assert_eq!(Uuid::from_bytes(&u.as_bytes()), Some(u));

        assert_eq!(Uuid::from_bytes(&[1, 2, 3]), None);
    }

    #[test]
    fn parse_and_display() {
        let u: Uuid = "2803".parse().unwrap();
        assert_eq!(u, Uuid::Uuid16(0x2803));
        assert_eq!(u.to_string(), "2803");

        let u: Uuid = "f000aa00-0451-4000-b000-000000000000".parse().unwrap();
        assert_eq!(u.to_string(), "f000aa00-0451-4000-b000-000000000000");

        assert!("xyz".parse::<Uuid>().is_err());
    }

    #[test]
    fn random_v4_sets_version_and_variant() {
        if let Uuid::Uuid128(bytes) = Uuid::new_random_v4() {
            assert_eq!(bytes[7] & 0xF0, 0x40);
            assert_eq!(bytes[8] & 0xC0, 0x80);
        } else {
            panic!("expected 128-bit UUID");
        }
    }
}
