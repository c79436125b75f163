use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use pulsevm_codec::{Marshal, Unmarshal};
use pulsevm_types::{Account, Digest32, Name, Permission, StandardBlock, Tx};

use crate::cache::TableCache;
use crate::chain::{Chain, CodeEntry, ReadOnlyChain};
use crate::error::StateError;
use crate::keys;
use crate::store::{KeyValueStore, WriteBatch};

/// Cache capacities for each table. A node with a hot working set of a few
/// thousand accounts and permissions keeps essentially all of it resident;
/// these are generous enough for that without being unbounded.
#[derive(Clone, Copy, Debug)]
pub struct CacheSizes {
    pub txs: usize,
    pub blocks: usize,
    pub block_ids: usize,
    pub accounts: usize,
    pub permissions: usize,
    pub code: usize,
}

impl Default for CacheSizes {
    fn default() -> Self {
        CacheSizes {
            txs: 4096,
            blocks: 1024,
            block_ids: 1024,
            accounts: 8192,
            permissions: 8192,
            code: 512,
        }
    }
}

#[derive(Default)]
struct PendingBatch {
    txs: HashMap<Digest32, Tx>,
    blocks: HashMap<Digest32, StandardBlock>,
    block_ids: HashMap<u64, Digest32>,
    accounts: HashMap<Name, Account>,
    permissions: HashMap<(Name, Name), Permission>,
    code: HashMap<Digest32, Option<CodeEntry>>,
    timestamp: Option<u64>,
    last_accepted: Option<Digest32>,
}

impl PendingBatch {
    fn is_empty(&self) -> bool {
        self.txs.is_empty()
            && self.blocks.is_empty()
            && self.block_ids.is_empty()
            && self.accounts.is_empty()
            && self.permissions.is_empty()
            && self.code.is_empty()
            && self.timestamp.is_none()
            && self.last_accepted.is_none()
    }
}

/// The persistent world state: one key-value store underneath, a
/// write-through LRU cache per table, and a buffer of pending mutations that
/// only reach the store on [`State::commit_batch`].
pub struct State {
    store: Arc<dyn KeyValueStore>,
    tx_cache: TableCache<Digest32, Tx>,
    block_cache: TableCache<Digest32, StandardBlock>,
    block_id_cache: TableCache<u64, Digest32>,
    account_cache: TableCache<Name, Account>,
    permission_cache: TableCache<(Name, Name), Permission>,
    code_cache: TableCache<Digest32, CodeEntry>,
    pending: Mutex<PendingBatch>,
}

impl State {
    pub fn new(store: Arc<dyn KeyValueStore>, sizes: CacheSizes) -> Self {
        State {
            store,
            tx_cache: TableCache::new(sizes.txs),
            block_cache: TableCache::new(sizes.blocks),
            block_id_cache: TableCache::new(sizes.block_ids),
            account_cache: TableCache::new(sizes.accounts),
            permission_cache: TableCache::new(sizes.permissions),
            code_cache: TableCache::new(sizes.code),
            pending: Mutex::new(PendingBatch::default()),
        }
    }

    pub fn is_initialized(&self) -> Result<bool, StateError> {
        Ok(self
            .store
            .get(&keys::singleton_key(keys::SINGLETON_INITIALIZED))?
            .is_some())
    }

    fn mark_initialized(&self, batch: &mut WriteBatch) {
        batch.put(keys::singleton_key(keys::SINGLETON_INITIALIZED), vec![1]);
    }

    /// Drains every pending mutation into a single atomic write against the
    /// backing store, in the fixed order the spec mandates: txs, block-ids,
    /// blocks, accounts, permissions, code, metadata. Caches are updated to
    /// match so subsequent reads don't have to hit the store again.
    pub fn commit_batch(&self) -> Result<(), StateError> {
        let mut pending = self.pending.lock();
        if pending.is_empty() {
            return Ok(());
        }
        let mut batch = WriteBatch::new();
        self.mark_initialized(&mut batch);

        for (id, tx) in pending.txs.drain() {
            batch.put(keys::tx_key(&id), tx.marshal_to_vec()?);
            self.tx_cache.put(id, Some(tx));
        }
        for (height, id) in pending.block_ids.drain() {
            batch.put(keys::block_id_by_height_key(height), id.to_vec());
            self.block_id_cache.put(height, Some(id));
        }
        for (id, block) in pending.blocks.drain() {
            batch.put(keys::block_key(&id), block.marshal_to_vec()?);
            self.block_cache.put(id, Some(block));
        }
        for (name, account) in pending.accounts.drain() {
            batch.put(keys::account_key(name), account.marshal_to_vec()?);
            self.account_cache.put(name, Some(account));
        }
        for ((owner, name), perm) in pending.permissions.drain() {
            batch.put(keys::permission_key(owner, name), perm.marshal_to_vec()?);
            self.permission_cache.put((owner, name), Some(perm));
        }
        for (hash, entry) in pending.code.drain() {
            let key = keys::code_key(&hash);
            match &entry {
                Some(e) => batch.put(key, e.marshal_to_vec()?),
                None => batch.delete(key),
            }
            self.code_cache.put(hash, entry);
        }
        if let Some(ts) = pending.timestamp.take() {
            batch.put(keys::singleton_key(keys::SINGLETON_TIMESTAMP), ts.to_be_bytes().to_vec());
        }
        if let Some(id) = pending.last_accepted.take() {
            batch.put(keys::singleton_key(keys::SINGLETON_LAST_ACCEPTED), id.to_vec());
        }

        self.store.write_batch(batch)?;
        tracing::debug!("committed state batch");
        Ok(())
    }

    /// Discards every pending mutation without touching the store.
    pub fn abort(&self) {
        let mut pending = self.pending.lock();
        *pending = PendingBatch::default();
        tracing::debug!("aborted pending state batch");
    }
}

impl ReadOnlyChain for State {
    fn get_tx(&self, id: &Digest32) -> Result<Option<Tx>, StateError> {
        if let Some(tx) = self.pending.lock().txs.get(id) {
            return Ok(Some(tx.clone()));
        }
        if let Some(hit) = self.tx_cache.get(id) {
            return Ok(hit);
        }
        let value = match self.store.get(&keys::tx_key(id))? {
            Some(bytes) => Some(Tx::unmarshal_exact(&bytes)?),
            None => None,
        };
        self.tx_cache.put(*id, value.clone());
        Ok(value)
    }

    fn get_block(&self, id: &Digest32) -> Result<Option<StandardBlock>, StateError> {
        if let Some(block) = self.pending.lock().blocks.get(id) {
            return Ok(Some(block.clone()));
        }
        if let Some(hit) = self.block_cache.get(id) {
            return Ok(hit);
        }
        let value = match self.store.get(&keys::block_key(id))? {
            Some(bytes) => Some(StandardBlock::unmarshal_exact(&bytes)?),
            None => None,
        };
        self.block_cache.put(*id, value.clone());
        Ok(value)
    }

    fn get_block_id_at(&self, height: u64) -> Result<Option<Digest32>, StateError> {
        if let Some(id) = self.pending.lock().block_ids.get(&height) {
            return Ok(Some(*id));
        }
        if let Some(hit) = self.block_id_cache.get(&height) {
            return Ok(hit);
        }
        let value = match self.store.get(&keys::block_id_by_height_key(height))? {
            Some(bytes) if bytes.len() == 32 => {
                let mut id = [0u8; 32];
                id.copy_from_slice(&bytes);
                Some(id)
            }
            _ => None,
        };
        self.block_id_cache.put(height, value);
        Ok(value)
    }

    fn get_last_accepted(&self) -> Result<Option<Digest32>, StateError> {
        if let Some(id) = self.pending.lock().last_accepted {
            return Ok(Some(id));
        }
        let value = match self.store.get(&keys::singleton_key(keys::SINGLETON_LAST_ACCEPTED))? {
            Some(bytes) if bytes.len() == 32 => {
                let mut id = [0u8; 32];
                id.copy_from_slice(&bytes);
                Some(id)
            }
            _ => None,
        };
        Ok(value)
    }

    fn get_timestamp(&self) -> Result<Option<u64>, StateError> {
        if let Some(ts) = self.pending.lock().timestamp {
            return Ok(Some(ts));
        }
        let value = match self.store.get(&keys::singleton_key(keys::SINGLETON_TIMESTAMP))? {
            Some(bytes) if bytes.len() == 8 => {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(&bytes);
                Some(u64::from_be_bytes(buf))
            }
            _ => None,
        };
        Ok(value)
    }

    fn get_account(&self, name: Name) -> Result<Option<Account>, StateError> {
        if let Some(account) = self.pending.lock().accounts.get(&name) {
            return Ok(Some(account.clone()));
        }
        if let Some(hit) = self.account_cache.get(&name) {
            return Ok(hit);
        }
        let value = match self.store.get(&keys::account_key(name))? {
            Some(bytes) => Some(Account::unmarshal_exact(&bytes)?),
            None => None,
        };
        self.account_cache.put(name, value.clone());
        Ok(value)
    }

    fn get_permission(&self, owner: Name, name: Name) -> Result<Option<Permission>, StateError> {
        if let Some(perm) = self.pending.lock().permissions.get(&(owner, name)) {
            return Ok(Some(perm.clone()));
        }
        if let Some(hit) = self.permission_cache.get(&(owner, name)) {
            return Ok(hit);
        }
        let value = match self.store.get(&keys::permission_key(owner, name))? {
            Some(bytes) => Some(Permission::unmarshal_exact(&bytes)?),
            None => None,
        };
        self.permission_cache.put((owner, name), value.clone());
        Ok(value)
    }

    fn get_code(&self, hash: &Digest32) -> Result<Option<CodeEntry>, StateError> {
        if let Some(entry) = self.pending.lock().code.get(hash) {
            return Ok(entry.clone());
        }
        if let Some(hit) = self.code_cache.get(hash) {
            return Ok(hit);
        }
        let value = match self.store.get(&keys::code_key(hash))? {
            Some(bytes) => Some(CodeEntry::unmarshal_exact(&bytes)?),
            None => None,
        };
        self.code_cache.put(*hash, value.clone());
        Ok(value)
    }

}

impl Chain for State {
    fn add_tx(&self, tx: Tx) -> Result<(), StateError> {
        let id = tx.id()?;
        self.pending.lock().txs.insert(id, tx);
        Ok(())
    }

    fn add_block(&self, block: StandardBlock) -> Result<(), StateError> {
        let id = block.id()?;
        self.pending.lock().blocks.insert(id, block);
        Ok(())
    }

    fn set_block_id_at(&self, height: u64, id: Digest32) -> Result<(), StateError> {
        self.pending.lock().block_ids.insert(height, id);
        Ok(())
    }

    fn modify_account(&self, account: Account) -> Result<(), StateError> {
        self.pending.lock().accounts.insert(account.name, account);
        Ok(())
    }

    fn add_permission(&self, permission: Permission) -> Result<(), StateError> {
        self.pending
            .lock()
            .permissions
            .insert((permission.owner, permission.name), permission);
        Ok(())
    }

    fn modify_code(&self, hash: Digest32, entry: CodeEntry) -> Result<(), StateError> {
        self.pending.lock().code.insert(hash, Some(entry));
        Ok(())
    }

    fn remove_code(&self, hash: &Digest32) -> Result<(), StateError> {
        self.pending.lock().code.insert(*hash, None);
        Ok(())
    }

    fn set_last_accepted(&self, id: Digest32) -> Result<(), StateError> {
        self.pending.lock().last_accepted = Some(id);
        Ok(())
    }

    fn set_timestamp(&self, ts: u64) -> Result<(), StateError> {
        self.pending.lock().timestamp = Some(ts);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn new_state() -> State {
        State::new(Arc::new(MemoryStore::new()), CacheSizes::default())
    }

    #[test]
    fn uncommitted_write_is_visible_through_pending() {
        let state = new_state();
        let account = Account::new(Name::from_str_lossy("pulse"), 0);
        state.modify_account(account.clone()).unwrap();
        assert_eq!(state.get_account(account.name).unwrap(), Some(account));
    }

    #[test]
    fn abort_discards_uncommitted_writes() {
        let state = new_state();
        let account = Account::new(Name::from_str_lossy("pulse"), 0);
        state.modify_account(account.clone()).unwrap();
        state.abort();
        assert_eq!(state.get_account(account.name).unwrap(), None);
    }

    #[test]
    fn commit_persists_and_survives_cache_eviction() {
        let state = new_state();
        let account = Account::new(Name::from_str_lossy("pulse"), 0);
        state.modify_account(account.clone()).unwrap();
        state.commit_batch().unwrap();
        assert_eq!(state.get_account(account.name).unwrap(), Some(account));
        assert!(state.is_initialized().unwrap());
    }

    #[test]
    fn code_ref_count_zero_is_removable() {
        use pulsevm_types::Code;
        let state = new_state();
        let code = Code::new(vec![1, 2, 3]);
        let hash = code.hash();
        state
            .modify_code(hash, CodeEntry { code, ref_count: 1 })
            .unwrap();
        state.commit_batch().unwrap();
        state.remove_code(&hash).unwrap();
        state.commit_batch().unwrap();
        assert_eq!(state.get_code(&hash).unwrap(), None);
    }
}
