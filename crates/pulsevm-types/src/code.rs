use pulsevm_codec::{CodecError, Marshal, Packer, Unmarshal, Unpacker};
use serde::{Deserialize, Serialize};

use crate::digest::{sha256, Digest32};

/// Raw contract bytecode together with its precomputed content hash.
///
/// `setcode` stores the hash in [`crate::Account::code_hash`] and keeps the
/// bytes themselves in a separate code table keyed by hash, so identical
/// code deployed by two accounts is stored once.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Code {
    pub bytes: Vec<u8>,
}

impl Code {
    pub fn new(bytes: Vec<u8>) -> Self {
        Code { bytes }
    }

    pub fn hash(&self) -> Digest32 {
        sha256(&self.bytes)
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl Marshal for Code {
    fn marshal(&self, packer: &mut Packer) -> Result<(), CodecError> {
        packer.pack_bytes(&self.bytes)
    }
}

impl Unmarshal for Code {
    fn unmarshal(unpacker: &mut Unpacker) -> Result<Self, CodecError> {
        Ok(Code {
            bytes: unpacker.unpack_bytes()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        let a = Code::new(vec![1, 2, 3]);
        let b = Code::new(vec![1, 2, 3]);
        assert_eq!(a.hash(), b.hash());
    }

    #[test]
    fn round_trips() {
        let code = Code::new(vec![0xde, 0xad, 0xbe, 0xef]);
        let bytes = code.marshal_to_vec().unwrap();
        let back = Code::unmarshal_exact(&bytes).unwrap();
        assert_eq!(code, back);
    }
}
