use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::error::StateError;

/// A single logical write: either a `put` or a `delete` of one key.
pub enum WriteOp {
    Put(Vec<u8>, Vec<u8>),
    Delete(Vec<u8>),
}

/// An ordered collection of writes applied together by [`KeyValueStore::write_batch`].
#[derive(Default)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.ops.push(WriteOp::Put(key, value));
    }

    pub fn delete(&mut self, key: Vec<u8>) {
        self.ops.push(WriteOp::Delete(key));
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }
}

/// The single underlying byte store every prefix-scoped table is carved out
/// of. `write_batch` must apply every op or none: a commit that fails midway
/// would desynchronize the tables from the caches layered on top of them.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StateError>;
    fn write_batch(&self, batch: WriteBatch) -> Result<(), StateError>;
}

/// An in-memory store backed by a sorted map, used in tests and as the
/// default backend before a node is pointed at a real data directory.
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StateError> {
        Ok(self.data.read().get(key).cloned())
    }

    fn write_batch(&self, batch: WriteBatch) -> Result<(), StateError> {
        let mut guard = self.data.write();
        for op in batch.ops {
            match op {
                WriteOp::Put(k, v) => {
                    guard.insert(k, v);
                }
                WriteOp::Delete(k) => {
                    guard.remove(&k);
                }
            }
        }
        Ok(())
    }
}

#[cfg(feature = "rocksdb")]
pub mod rocks {
    use std::path::Path;

    use super::{KeyValueStore, StateError, WriteBatch, WriteOp};

    /// Production backend. Gated behind the `rocksdb` feature the way the
    /// teacher's storage adapters gate an on-disk engine behind a feature
    /// flag rather than pulling it into every build.
    pub struct RocksDbStore {
        db: rocksdb::DB,
    }

    impl RocksDbStore {
        pub fn open(path: impl AsRef<Path>) -> Result<Self, StateError> {
            let mut opts = rocksdb::Options::default();
            opts.create_if_missing(true);
            let db = rocksdb::DB::open(&opts, path).map_err(|e| StateError::Backend(e.to_string()))?;
            Ok(Self { db })
        }
    }

    impl KeyValueStore for RocksDbStore {
        fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StateError> {
            self.db
                .get(key)
                .map_err(|e| StateError::Backend(e.to_string()))
        }

        fn write_batch(&self, batch: WriteBatch) -> Result<(), StateError> {
            let mut wb = rocksdb::WriteBatch::default();
            for op in batch.ops {
                match op {
                    WriteOp::Put(k, v) => wb.put(k, v),
                    WriteOp::Delete(k) => wb.delete(k),
                }
            }
            self.db
                .write(wb)
                .map_err(|e| StateError::Backend(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trips() {
        let store = MemoryStore::new();
        let mut batch = WriteBatch::new();
        batch.put(b"k".to_vec(), b"v".to_vec());
        store.write_batch(batch).unwrap();
        assert_eq!(store.get(b"k").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn delete_removes_key() {
        let store = MemoryStore::new();
        let mut batch = WriteBatch::new();
        batch.put(b"k".to_vec(), b"v".to_vec());
        store.write_batch(batch).unwrap();
        let mut batch = WriteBatch::new();
        batch.delete(b"k".to_vec());
        store.write_batch(batch).unwrap();
        assert_eq!(store.get(b"k").unwrap(), None);
    }
}
