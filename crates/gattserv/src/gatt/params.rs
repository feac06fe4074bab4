//! Server-wide tunable parameters
//!
//! A small keyed store of typed values. The recognized id set and each
//! value's width are fixed; unrecognized ids and mis-sized writes fail fast,
//! and a parameter locked by an in-progress operation (e.g. the prepare-write
//! limit while a prepare-write transaction is open) rejects writes until the
//! operation completes.

use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::att::{ServError, ServResult, PREPARE_WRITE_QUEUE_MAX};

/// Maximum simultaneous prepare-write operations (u8, read-write)
pub const GATT_PARAM_NUM_PREPARE_WRITES: u8 = 0x00;
/// General server application parameter value (u16, read-write)
pub const GATT_PARAM_SERVER_VALUE: u8 = 0x01;

/// Default prepare-write limit
const DEFAULT_NUM_PREPARE_WRITES: u8 = 5;

const PARAM_COUNT: usize = 2;

pub struct ParamStore {
    num_prepare_writes: u8,
    server_value: u16,
    locked: [bool; PARAM_COUNT],
}

impl Default for ParamStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ParamStore {
    pub fn new() -> Self {
        Self {
            num_prepare_writes: DEFAULT_NUM_PREPARE_WRITES,
            server_value: 0,
            locked: [false; PARAM_COUNT],
        }
    }

    /// Set a parameter from its wire encoding.
    ///
    /// The length must match the parameter's declared width exactly and the
    /// value must fall in its domain; failed writes never mutate the stored
    /// value.
    pub fn set_parameter(&mut self, id: u8, value: &[u8]) -> ServResult<()> {
        if usize::from(id) >= PARAM_COUNT {
            return Err(ServError::InvalidParameter("unknown parameter id"));
        }
        if self.locked[usize::from(id)] {
            return Err(ServError::Failure("parameter in use"));
        }
        match id {
            GATT_PARAM_NUM_PREPARE_WRITES => {
                if value.len() != 1 || value[0] > PREPARE_WRITE_QUEUE_MAX {
                    return Err(ServError::InvalidRange);
                }
                self.num_prepare_writes = value[0];
            }
            GATT_PARAM_SERVER_VALUE => {
                if value.len() != 2 {
                    return Err(ServError::InvalidRange);
                }
                let mut cursor = Cursor::new(value);
                self.server_value = cursor
                    .read_u16::<LittleEndian>()
                    .map_err(|_| ServError::InvalidRange)?;
            }
            _ => unreachable!(),
        }
        Ok(())
    }

    /// Get a parameter in its wire encoding
    pub fn get_parameter(&self, id: u8) -> ServResult<Vec<u8>> {
        let mut out = Vec::new();
        match id {
            GATT_PARAM_NUM_PREPARE_WRITES => out.push(self.num_prepare_writes),
            GATT_PARAM_SERVER_VALUE => out
                .write_u16::<LittleEndian>(self.server_value)
                .map_err(|_| ServError::Failure("encode"))?,
            _ => return Err(ServError::InvalidParameter("unknown parameter id")),
        }
        Ok(out)
    }

    /// Current prepare-write limit
    pub fn num_prepare_writes(&self) -> u8 {
        self.num_prepare_writes
    }

    /// Direct accessor for the u16 server parameter value
    pub fn set_param_value(&mut self, value: u16) {
        self.server_value = value;
    }

    pub fn param_value(&self) -> u16 {
        self.server_value
    }

    /// Mark a parameter in use by an in-progress operation
    pub fn lock(&mut self, id: u8) -> ServResult<()> {
        let slot = self
            .locked
            .get_mut(usize::from(id))
            .ok_or(ServError::InvalidParameter("unknown parameter id"))?;
        *slot = true;
        Ok(())
    }

    /// Release a parameter after the operation completes
    pub fn unlock(&mut self, id: u8) {
        if let Some(slot) = self.locked.get_mut(usize::from(id)) {
            *slot = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_every_recognized_id() {
        let mut store = ParamStore::new();

        store
            .set_parameter(GATT_PARAM_NUM_PREPARE_WRITES, &[12])
            .unwrap();
        assert_eq!(store.get_parameter(GATT_PARAM_NUM_PREPARE_WRITES), Ok(vec![12]));
        assert_eq!(store.num_prepare_writes(), 12);

        store
            .set_parameter(GATT_PARAM_SERVER_VALUE, &0x1234u16.to_le_bytes())
            .unwrap();
        assert_eq!(
            store.get_parameter(GATT_PARAM_SERVER_VALUE),
            Ok(vec![0x34, 0x12])
        );
        assert_eq!(store.param_value(), 0x1234);
    }

    #[test]
    fn unknown_id_fails_fast() {
        let mut store = ParamStore::new();
        assert!(matches!(
            store.set_parameter(0x7F, &[0]),
            Err(ServError::InvalidParameter(_))
        ));
        assert!(matches!(
            store.get_parameter(0x7F),
            Err(ServError::InvalidParameter(_))
        ));
    }

    #[test]
    fn out_of_range_rejected_without_mutation() {
        let mut store = ParamStore::new();
        let before = store.num_prepare_writes();

        // Over the domain bound.
        assert_eq!(
            store.set_parameter(GATT_PARAM_NUM_PREPARE_WRITES, &[PREPARE_WRITE_QUEUE_MAX + 1]),
            Err(ServError::InvalidRange)
        );
        // Wrong width.
        assert_eq!(
            store.set_parameter(GATT_PARAM_NUM_PREPARE_WRITES, &[1, 2]),
            Err(ServError::InvalidRange)
        );
        assert_eq!(store.num_prepare_writes(), before);

        assert_eq!(
            store.set_parameter(GATT_PARAM_SERVER_VALUE, &[1]),
            Err(ServError::InvalidRange)
        );
        assert_eq!(store.param_value(), 0);
    }

    #[test]
    fn locked_parameter_rejects_writes_until_unlocked() {
        let mut store = ParamStore::new();
        store.lock(GATT_PARAM_NUM_PREPARE_WRITES).unwrap();
        assert_eq!(
            store.set_parameter(GATT_PARAM_NUM_PREPARE_WRITES, &[3]),
            Err(ServError::Failure("parameter in use"))
        );
        // Reads still work while locked.
        assert!(store.get_parameter(GATT_PARAM_NUM_PREPARE_WRITES).is_ok());

        store.unlock(GATT_PARAM_NUM_PREPARE_WRITES);
        store
            .set_parameter(GATT_PARAM_NUM_PREPARE_WRITES, &[3])
            .unwrap();
        assert_eq!(store.num_prepare_writes(), 3);
    }
}
