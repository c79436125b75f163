use pulsevm_codec::{CodecError, Marshal, Packer, Unmarshal, Unpacker};
use serde::{Deserialize, Serialize};

use crate::digest::{sha256, Digest32};
use crate::tx::Tx;

/// A block as the consensus engine and the executor see it: a parent
/// pointer, height, wall-clock time, and the ordered transactions it
/// contains.
///
/// `merkle_root` is carried on the wire for forward compatibility but is not
/// computed over the transaction set today — every block's root is the
/// all-zero digest (see `docs::merkle_root` open question resolution in
/// `DESIGN.md`). `block_id` is `SHA256` of the full marshaled block.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct StandardBlock {
    pub parent_id: Digest32,
    pub height: u64,
    pub time: u64,
    pub merkle_root: Digest32,
    pub txs: Vec<Tx>,
}

impl StandardBlock {
    pub fn new(parent_id: Digest32, height: u64, time: u64, txs: Vec<Tx>) -> Self {
        StandardBlock {
            parent_id,
            height,
            time,
            merkle_root: [0u8; 32],
            txs,
        }
    }

    pub fn id(&self) -> Result<Digest32, CodecError> {
        Ok(sha256(&self.marshal_to_vec()?))
    }

    pub fn is_empty(&self) -> bool {
        self.txs.is_empty()
    }
}

impl Marshal for StandardBlock {
    fn marshal(&self, packer: &mut Packer) -> Result<(), CodecError> {
        packer.pack_fixed(&self.parent_id)?;
        packer.pack_u64(self.height)?;
        packer.pack_u64(self.time)?;
        packer.pack_fixed(&self.merkle_root)?;
        packer.pack_u32(self.txs.len() as u32)?;
        for tx in &self.txs {
            tx.marshal(packer)?;
        }
        Ok(())
    }
}

impl Unmarshal for StandardBlock {
    fn unmarshal(unpacker: &mut Unpacker) -> Result<Self, CodecError> {
        let parent_id = unpacker.unpack_fixed()?;
        let height = unpacker.unpack_u64()?;
        let time = unpacker.unpack_u64()?;
        let merkle_root = unpacker.unpack_fixed()?;
        let num_txs = unpacker.unpack_u32()?;
        let mut txs = Vec::with_capacity(num_txs as usize);
        for _ in 0..num_txs {
            txs.push(Tx::unmarshal(unpacker)?);
        }
        Ok(StandardBlock {
            parent_id,
            height,
            time,
            merkle_root,
            txs,
        })
    }
}
