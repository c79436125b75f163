//! Prefix-scoped key construction. Every table gets a one-byte prefix so a
//! single key-value store can hold all of them without collision; singleton
//! keys additionally carry a one-byte sub-key distinguishing the few scalar
//! fields the chain tracks outside any table.

use pulsevm_types::{Digest32, Name};

const PREFIX_SINGLETON: u8 = 0x00;
const PREFIX_BLOCK_ID_BY_HEIGHT: u8 = 0x01;
const PREFIX_BLOCK: u8 = 0x02;
const PREFIX_TX: u8 = 0x03;
const PREFIX_ACCOUNT: u8 = 0x04;
const PREFIX_PERMISSION: u8 = 0x05;
const PREFIX_CODE: u8 = 0x06;

pub const SINGLETON_INITIALIZED: u8 = 0x00;
pub const SINGLETON_TIMESTAMP: u8 = 0x01;
pub const SINGLETON_LAST_ACCEPTED: u8 = 0x02;

pub fn singleton_key(sub: u8) -> Vec<u8> {
    vec![PREFIX_SINGLETON, sub]
}

pub fn block_id_by_height_key(height: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(9);
    key.push(PREFIX_BLOCK_ID_BY_HEIGHT);
    key.extend_from_slice(&height.to_be_bytes());
    key
}

pub fn block_key(id: &Digest32) -> Vec<u8> {
    let mut key = Vec::with_capacity(33);
    key.push(PREFIX_BLOCK);
    key.extend_from_slice(id);
    key
}

pub fn tx_key(id: &Digest32) -> Vec<u8> {
    let mut key = Vec::with_capacity(33);
    key.push(PREFIX_TX);
    key.extend_from_slice(id);
    key
}

pub fn account_key(name: Name) -> Vec<u8> {
    let mut key = Vec::with_capacity(9);
    key.push(PREFIX_ACCOUNT);
    key.extend_from_slice(&name.bytes());
    key
}

pub fn permission_key(owner: Name, name: Name) -> Vec<u8> {
    let mut key = Vec::with_capacity(17);
    key.push(PREFIX_PERMISSION);
    key.extend_from_slice(&owner.bytes());
    key.extend_from_slice(&name.bytes());
    key
}

pub fn code_key(hash: &Digest32) -> Vec<u8> {
    let mut key = Vec::with_capacity(33);
    key.push(PREFIX_CODE);
    key.extend_from_slice(hash);
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_keep_tables_disjoint() {
        let a = account_key(Name::from_str_lossy("pulse"));
        let p = permission_key(Name::from_str_lossy("pulse"), Name::from_str_lossy("active"));
        assert_ne!(a[0], p[0]);
    }
}
