use std::hash::Hash;
use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;

/// A write-through LRU cache over one table. `Some(None)` entries are
/// negative cache hits ("known absent"), distinct from a true cache miss
/// which still has to fall through to the backing store.
pub struct TableCache<K, V> {
    inner: Mutex<LruCache<K, Option<V>>>,
}

impl<K: Hash + Eq + Clone, V: Clone> TableCache<K, V> {
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).expect("capacity must be nonzero");
        Self {
            inner: Mutex::new(LruCache::new(cap)),
        }
    }

    /// Returns `Some(hit)` if cached (hit may itself be `None`, meaning
    /// "known absent"), or `None` if the cache has no opinion and the
    /// caller must consult the backing store.
    pub fn get(&self, key: &K) -> Option<Option<V>> {
        self.inner.lock().get(key).cloned()
    }

    pub fn put(&self, key: K, value: Option<V>) {
        self.inner.lock().put(key, value);
    }

    pub fn invalidate(&self, key: &K) {
        self.inner.lock().pop(key);
    }
}
