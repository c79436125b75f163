use pulsevm_codec::{CodecError, Marshal, Packer, Unmarshal, Unpacker};
use serde::{Deserialize, Serialize};

use crate::digest::{Digest32, EMPTY_DIGEST};
use crate::name::Name;

/// On-chain account record: identity, code pointer, and bookkeeping the
/// system contract updates on `setcode`/`setabi`.
///
/// Wire layout is `name(8) ++ creation_time(8) ++ privileged(1) ++
/// code_hash(32) ++ code_sequence(4) ++ abi(len-prefixed) ++
/// abi_sequence(4)`, 61 bytes with an empty `abi`.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Account {
    pub name: Name,
    pub creation_time: u64,
    pub privileged: bool,
    pub code_hash: Digest32,
    pub code_sequence: u32,
    pub abi: Vec<u8>,
    pub abi_sequence: u32,
}

impl Account {
    pub fn new(name: Name, creation_time: u64) -> Self {
        Account {
            name,
            creation_time,
            privileged: false,
            code_hash: EMPTY_DIGEST,
            code_sequence: 0,
            abi: Vec::new(),
            abi_sequence: 0,
        }
    }

    pub fn has_code(&self) -> bool {
        self.code_hash != EMPTY_DIGEST
    }
}

impl Marshal for Account {
    fn marshal(&self, packer: &mut Packer) -> Result<(), CodecError> {
        self.name.marshal(packer)?;
        packer.pack_u64(self.creation_time)?;
        packer.pack_bool(self.privileged)?;
        packer.pack_fixed(&self.code_hash)?;
        packer.pack_u32(self.code_sequence)?;
        packer.pack_bytes(&self.abi)?;
        packer.pack_u32(self.abi_sequence)
    }
}

impl Unmarshal for Account {
    fn unmarshal(unpacker: &mut Unpacker) -> Result<Self, CodecError> {
        Ok(Account {
            name: Name::unmarshal(unpacker)?,
            creation_time: unpacker.unpack_u64()?,
            privileged: unpacker.unpack_bool()?,
            code_hash: unpacker.unpack_fixed()?,
            code_sequence: unpacker.unpack_u32()?,
            abi: unpacker.unpack_bytes()?,
            abi_sequence: unpacker.unpack_u32()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marshaled_size_is_61_bytes() {
        let account = Account::new(Name::from_str_lossy("pulse"), 0);
        let bytes = account.marshal_to_vec().unwrap();
        assert_eq!(bytes.len(), 61);
    }

    #[test]
    fn round_trips() {
        let mut account = Account::new(Name::from_str_lossy("pulse"), 12345);
        account.code_hash = [7u8; 32];
        account.code_sequence = 2;
        account.abi = vec![1, 2, 3, 4];
        account.abi_sequence = 3;
        account.privileged = true;
        let bytes = account.marshal_to_vec().unwrap();
        let back = Account::unmarshal_exact(&bytes).unwrap();
        assert_eq!(account, back);
    }

    #[test]
    fn new_account_has_no_code() {
        let account = Account::new(Name::from_str_lossy("pulse"), 0);
        assert!(!account.has_code());
    }
}
