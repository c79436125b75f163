use pulsevm_codec::{CodecError, Marshal, Packer, Unmarshal, Unpacker};
use pulsevm_types::{Account, Code, Digest32, Name, Permission, StandardBlock, Tx};

use crate::error::StateError;

/// A `Code` blob together with the number of accounts currently pointing at
/// it. `setcode`/`setabi` increment and decrement this as accounts install
/// and replace code; a zero count makes the entry eligible for removal.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct CodeEntry {
    pub code: Code,
    pub ref_count: u32,
}

impl Marshal for CodeEntry {
    fn marshal(&self, packer: &mut Packer) -> Result<(), CodecError> {
        self.code.marshal(packer)?;
        packer.pack_u32(self.ref_count)
    }
}

impl Unmarshal for CodeEntry {
    fn unmarshal(unpacker: &mut Unpacker) -> Result<Self, CodecError> {
        Ok(CodeEntry {
            code: Code::unmarshal(unpacker)?,
            ref_count: unpacker.unpack_u32()?,
        })
    }
}

/// The read side of a chain view: the persistent `State`, or any `Diff`
/// layered above it.
pub trait ReadOnlyChain {
    fn get_tx(&self, id: &Digest32) -> Result<Option<Tx>, StateError>;
    fn get_block(&self, id: &Digest32) -> Result<Option<StandardBlock>, StateError>;
    fn get_block_id_at(&self, height: u64) -> Result<Option<Digest32>, StateError>;
    fn get_last_accepted(&self) -> Result<Option<Digest32>, StateError>;
    fn get_timestamp(&self) -> Result<Option<u64>, StateError>;
    fn get_account(&self, name: Name) -> Result<Option<Account>, StateError>;
    fn get_permission(&self, owner: Name, name: Name) -> Result<Option<Permission>, StateError>;
    fn get_code(&self, hash: &Digest32) -> Result<Option<CodeEntry>, StateError>;
}

/// The full read/write surface used by the executor, the block builder, and
/// the block manager. Every mutating method takes `&self`: tables are
/// internally synchronized so a `Diff` can be constructed from a shared
/// reference to its parent and still buffer writes without a `&mut` borrow
/// that would collide with the parent's own borrow when the diff is later
/// applied back onto it.
pub trait Chain: ReadOnlyChain {
    fn add_tx(&self, tx: Tx) -> Result<(), StateError>;
    fn add_block(&self, block: StandardBlock) -> Result<(), StateError>;
    fn set_block_id_at(&self, height: u64, id: Digest32) -> Result<(), StateError>;
    fn modify_account(&self, account: Account) -> Result<(), StateError>;
    fn add_permission(&self, permission: Permission) -> Result<(), StateError>;
    fn modify_code(&self, hash: Digest32, entry: CodeEntry) -> Result<(), StateError>;
    fn remove_code(&self, hash: &Digest32) -> Result<(), StateError>;
    fn set_last_accepted(&self, id: Digest32) -> Result<(), StateError>;
    fn set_timestamp(&self, ts: u64) -> Result<(), StateError>;
}
