use std::cell::RefCell;
use std::collections::HashMap;

use pulsevm_types::{Account, Digest32, Name, Permission, StandardBlock, Tx};

use crate::chain::{Chain, CodeEntry, ReadOnlyChain};
use crate::error::StateError;

/// The buffered contents of a [`Diff`], independent of its parent. Held
/// behind a `RefCell` so every `Chain` write method can take `&self`: a
/// `Diff`'s own mutations never need a `&mut` borrow, which is what lets one
/// be constructed from a shared reference to its parent and still be
/// applied back onto that same parent later.
#[derive(Default)]
struct DiffPatch {
    txs: HashMap<Digest32, Tx>,
    blocks: HashMap<Digest32, StandardBlock>,
    block_ids: HashMap<u64, Digest32>,
    accounts: HashMap<Name, Account>,
    permissions: HashMap<(Name, Name), Permission>,
    code: HashMap<Digest32, Option<CodeEntry>>,
    timestamp: Option<u64>,
    last_accepted: Option<Digest32>,
}

/// A single-owner, single-use mutation buffer layered over a parent
/// [`ReadOnlyChain`]. Reads check the diff's own buffer first and fall
/// through to the parent on a miss; writes only ever touch the buffer.
/// `apply` consumes the diff, so it cannot be applied twice, and because it
/// never needs a `&mut` borrow of its parent, a diff can be applied directly
/// onto the very `Chain` it was built over.
pub struct Diff<'p, P: ?Sized> {
    parent: &'p P,
    patch: RefCell<DiffPatch>,
}

impl<'p, P: ReadOnlyChain + ?Sized> Diff<'p, P> {
    pub fn new(parent: &'p P) -> Self {
        Diff {
            parent,
            patch: RefCell::new(DiffPatch::default()),
        }
    }

    /// Commits every buffered write into `base` in one pass. `base` is
    /// typically this diff's own parent (nested diffs promote upward one
    /// level at a time), but need not be: a diff can be applied to any
    /// `Chain` whose data it's allowed to extend.
    pub fn apply(self, base: &impl Chain) -> Result<(), StateError> {
        let patch = self.patch.into_inner();
        for (_, tx) in patch.txs {
            base.add_tx(tx)?;
        }
        for (height, id) in patch.block_ids {
            base.set_block_id_at(height, id)?;
        }
        for (_, block) in patch.blocks {
            base.add_block(block)?;
        }
        for (_, account) in patch.accounts {
            base.modify_account(account)?;
        }
        for (_, perm) in patch.permissions {
            base.add_permission(perm)?;
        }
        for (hash, entry) in patch.code {
            match entry {
                Some(e) => base.modify_code(hash, e)?,
                None => base.remove_code(&hash)?,
            }
        }
        if let Some(ts) = patch.timestamp {
            base.set_timestamp(ts)?;
        }
        if let Some(id) = patch.last_accepted {
            base.set_last_accepted(id)?;
        }
        Ok(())
    }
}

impl<'p, P: ReadOnlyChain + ?Sized> ReadOnlyChain for Diff<'p, P> {
    fn get_tx(&self, id: &Digest32) -> Result<Option<Tx>, StateError> {
        if let Some(tx) = self.patch.borrow().txs.get(id) {
            return Ok(Some(tx.clone()));
        }
        self.parent.get_tx(id)
    }

    fn get_block(&self, id: &Digest32) -> Result<Option<StandardBlock>, StateError> {
        if let Some(block) = self.patch.borrow().blocks.get(id) {
            return Ok(Some(block.clone()));
        }
        self.parent.get_block(id)
    }

    fn get_block_id_at(&self, height: u64) -> Result<Option<Digest32>, StateError> {
        if let Some(id) = self.patch.borrow().block_ids.get(&height) {
            return Ok(Some(*id));
        }
        self.parent.get_block_id_at(height)
    }

    fn get_last_accepted(&self) -> Result<Option<Digest32>, StateError> {
        if let Some(id) = self.patch.borrow().last_accepted {
            return Ok(Some(id));
        }
        self.parent.get_last_accepted()
    }

    fn get_timestamp(&self) -> Result<Option<u64>, StateError> {
        if let Some(ts) = self.patch.borrow().timestamp {
            return Ok(Some(ts));
        }
        self.parent.get_timestamp()
    }

    fn get_account(&self, name: Name) -> Result<Option<Account>, StateError> {
        if let Some(account) = self.patch.borrow().accounts.get(&name) {
            return Ok(Some(account.clone()));
        }
        self.parent.get_account(name)
    }

    fn get_permission(&self, owner: Name, name: Name) -> Result<Option<Permission>, StateError> {
        if let Some(perm) = self.patch.borrow().permissions.get(&(owner, name)) {
            return Ok(Some(perm.clone()));
        }
        self.parent.get_permission(owner, name)
    }

    fn get_code(&self, hash: &Digest32) -> Result<Option<CodeEntry>, StateError> {
        if let Some(entry) = self.patch.borrow().code.get(hash) {
            return Ok(entry.clone());
        }
        self.parent.get_code(hash)
    }

}

impl<'p, P: ReadOnlyChain + ?Sized> Chain for Diff<'p, P> {
    fn add_tx(&self, tx: Tx) -> Result<(), StateError> {
        let id = tx.id()?;
        self.patch.borrow_mut().txs.insert(id, tx);
        Ok(())
    }

    fn add_block(&self, block: StandardBlock) -> Result<(), StateError> {
        let id = block.id()?;
        self.patch.borrow_mut().blocks.insert(id, block);
        Ok(())
    }

    fn set_block_id_at(&self, height: u64, id: Digest32) -> Result<(), StateError> {
        self.patch.borrow_mut().block_ids.insert(height, id);
        Ok(())
    }

    fn modify_account(&self, account: Account) -> Result<(), StateError> {
        self.patch.borrow_mut().accounts.insert(account.name, account);
        Ok(())
    }

    fn add_permission(&self, permission: Permission) -> Result<(), StateError> {
        self.patch
            .borrow_mut()
            .permissions
            .insert((permission.owner, permission.name), permission);
        Ok(())
    }

    fn modify_code(&self, hash: Digest32, entry: CodeEntry) -> Result<(), StateError> {
        self.patch.borrow_mut().code.insert(hash, Some(entry));
        Ok(())
    }

    fn remove_code(&self, hash: &Digest32) -> Result<(), StateError> {
        self.patch.borrow_mut().code.insert(*hash, None);
        Ok(())
    }

    fn set_last_accepted(&self, id: Digest32) -> Result<(), StateError> {
        self.patch.borrow_mut().last_accepted = Some(id);
        Ok(())
    }

    fn set_timestamp(&self, ts: u64) -> Result<(), StateError> {
        self.patch.borrow_mut().timestamp = Some(ts);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{CacheSizes, State};
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn new_state() -> State {
        State::new(Arc::new(MemoryStore::new()), CacheSizes::default())
    }

    #[test]
    fn diff_reads_fall_through_to_parent() {
        let state = new_state();
        let account = Account::new(Name::from_str_lossy("pulse"), 0);
        state.modify_account(account.clone()).unwrap();
        state.commit_batch().unwrap();

        let diff = Diff::new(&state);
        assert_eq!(diff.get_account(account.name).unwrap(), Some(account));
    }

    #[test]
    fn diff_writes_are_invisible_to_parent_until_applied() {
        let state = new_state();
        let diff = Diff::new(&state);
        let account = Account::new(Name::from_str_lossy("glenn"), 0);
        diff.modify_account(account.clone()).unwrap();

        assert_eq!(state.get_account(account.name).unwrap(), None);
        assert_eq!(diff.get_account(account.name).unwrap(), Some(account.clone()));

        diff.apply(&state).unwrap();
        assert_eq!(state.get_account(account.name).unwrap(), Some(account));
    }

    #[test]
    fn nested_diff_promotes_through_intermediate_patch() {
        let state = new_state();
        let block_diff = Diff::new(&state);
        let account = Account::new(Name::from_str_lossy("glenn"), 0);

        let patch_applied = {
            let tx_diff = Diff::new(&block_diff);
            tx_diff.modify_account(account.clone()).unwrap();
            tx_diff.apply(&block_diff)
        };
        patch_applied.unwrap();

        assert_eq!(block_diff.get_account(account.name).unwrap(), Some(account.clone()));
        assert_eq!(state.get_account(account.name).unwrap(), None);

        block_diff.apply(&state).unwrap();
        assert_eq!(state.get_account(account.name).unwrap(), Some(account));
    }
}
