use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use pulsevm_state::{Chain, CodeEntry, ReadOnlyChain, StateError};
use pulsevm_types::{Account, Digest32, Name, Permission, StandardBlock, Tx};

/// The buffered writes a single block's execution produced, independent of
/// any borrow — unlike [`pulsevm_state::Diff`], a `Layer` owns its data
/// outright so it can be stacked behind an `Arc` and shared across the
/// several blocks whose `Verify` runs concurrently with their still-pending
/// ancestors.
#[derive(Default)]
pub struct Layer {
    pub accounts: HashMap<Name, Account>,
    pub permissions: HashMap<(Name, Name), Permission>,
    pub code: HashMap<Digest32, Option<CodeEntry>>,
    pub txs: HashMap<Digest32, Tx>,
}

/// Collects one block's writes during execution. Implements
/// [`pulsevm_state::Chain`] so [`pulsevm_state::Diff::apply`] can drain a
/// transaction-execution diff straight into it; its read half only ever
/// needs to see what's already landed in this same layer.
pub struct LayerWriter {
    inner: RefCell<Layer>,
}

impl LayerWriter {
    pub fn new() -> Self {
        LayerWriter { inner: RefCell::new(Layer::default()) }
    }

    pub fn into_layer(self) -> Layer {
        self.inner.into_inner()
    }
}

impl ReadOnlyChain for LayerWriter {
    fn get_tx(&self, id: &Digest32) -> Result<Option<Tx>, StateError> {
        Ok(self.inner.borrow().txs.get(id).cloned())
    }

    fn get_block(&self, _id: &Digest32) -> Result<Option<StandardBlock>, StateError> {
        Ok(None)
    }

    fn get_block_id_at(&self, _height: u64) -> Result<Option<Digest32>, StateError> {
        Ok(None)
    }

    fn get_last_accepted(&self) -> Result<Option<Digest32>, StateError> {
        Ok(None)
    }

    fn get_timestamp(&self) -> Result<Option<u64>, StateError> {
        Ok(None)
    }

    fn get_account(&self, name: Name) -> Result<Option<Account>, StateError> {
        Ok(self.inner.borrow().accounts.get(&name).cloned())
    }

    fn get_permission(&self, owner: Name, name: Name) -> Result<Option<Permission>, StateError> {
        Ok(self.inner.borrow().permissions.get(&(owner, name)).cloned())
    }

    fn get_code(&self, hash: &Digest32) -> Result<Option<CodeEntry>, StateError> {
        Ok(self.inner.borrow().code.get(hash).cloned().flatten())
    }
}

impl Chain for LayerWriter {
    fn add_tx(&self, tx: Tx) -> Result<(), StateError> {
        let id = tx.id()?;
        self.inner.borrow_mut().txs.insert(id, tx);
        Ok(())
    }

    fn add_block(&self, _block: StandardBlock) -> Result<(), StateError> {
        Ok(())
    }

    fn set_block_id_at(&self, _height: u64, _id: Digest32) -> Result<(), StateError> {
        Ok(())
    }

    fn modify_account(&self, account: Account) -> Result<(), StateError> {
        self.inner.borrow_mut().accounts.insert(account.name, account);
        Ok(())
    }

    fn add_permission(&self, permission: Permission) -> Result<(), StateError> {
        self.inner.borrow_mut().permissions.insert((permission.owner, permission.name), permission);
        Ok(())
    }

    fn modify_code(&self, hash: Digest32, entry: CodeEntry) -> Result<(), StateError> {
        self.inner.borrow_mut().code.insert(hash, Some(entry));
        Ok(())
    }

    fn remove_code(&self, hash: &Digest32) -> Result<(), StateError> {
        self.inner.borrow_mut().code.insert(*hash, None);
        Ok(())
    }

    fn set_last_accepted(&self, _id: Digest32) -> Result<(), StateError> {
        Ok(())
    }

    fn set_timestamp(&self, _ts: u64) -> Result<(), StateError> {
        Ok(())
    }
}

/// A read-only view of a persistent [`pulsevm_state::State`] with zero or
/// more pending block [`Layer`]s stacked on top, newest last. Lookups scan
/// the stack newest-first and fall through to `state` on a full miss — this
/// is what lets a block's `Verify` see its still-unaccepted ancestors'
/// writes without needing the borrowed, type-nested [`pulsevm_state::Diff`]
/// chain that would otherwise require one concrete type per stack depth.
pub struct LayeredView<'s, S: ReadOnlyChain + ?Sized> {
    base: &'s S,
    layers: Vec<Arc<Layer>>,
}

impl<'s, S: ReadOnlyChain + ?Sized> LayeredView<'s, S> {
    pub fn new(base: &'s S, layers: Vec<Arc<Layer>>) -> Self {
        LayeredView { base, layers }
    }

    pub fn layers(&self) -> &[Arc<Layer>] {
        &self.layers
    }
}

impl<'s, S: ReadOnlyChain + ?Sized> ReadOnlyChain for LayeredView<'s, S> {
    fn get_tx(&self, id: &Digest32) -> Result<Option<Tx>, StateError> {
        for layer in self.layers.iter().rev() {
            if let Some(tx) = layer.txs.get(id) {
                return Ok(Some(tx.clone()));
            }
        }
        self.base.get_tx(id)
    }

    fn get_block(&self, id: &Digest32) -> Result<Option<StandardBlock>, StateError> {
        self.base.get_block(id)
    }

    fn get_block_id_at(&self, height: u64) -> Result<Option<Digest32>, StateError> {
        self.base.get_block_id_at(height)
    }

    fn get_last_accepted(&self) -> Result<Option<Digest32>, StateError> {
        self.base.get_last_accepted()
    }

    fn get_timestamp(&self) -> Result<Option<u64>, StateError> {
        self.base.get_timestamp()
    }

    fn get_account(&self, name: Name) -> Result<Option<Account>, StateError> {
        for layer in self.layers.iter().rev() {
            if let Some(account) = layer.accounts.get(&name) {
                return Ok(Some(account.clone()));
            }
        }
        self.base.get_account(name)
    }

    fn get_permission(&self, owner: Name, name: Name) -> Result<Option<Permission>, StateError> {
        for layer in self.layers.iter().rev() {
            if let Some(perm) = layer.permissions.get(&(owner, name)) {
                return Ok(Some(perm.clone()));
            }
        }
        self.base.get_permission(owner, name)
    }

    fn get_code(&self, hash: &Digest32) -> Result<Option<CodeEntry>, StateError> {
        for layer in self.layers.iter().rev() {
            if let Some(entry) = layer.code.get(hash) {
                return Ok(entry.clone());
            }
        }
        self.base.get_code(hash)
    }
}
