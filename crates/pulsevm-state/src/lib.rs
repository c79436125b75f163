//! The persistent world state and the `Diff` overlay executors and the
//! block builder/manager stack transactions and blocks against.
//!
//! `State` owns one [`store::KeyValueStore`], prefix-scoped per table, with a
//! write-through LRU cache in front of each and a buffer of pending writes
//! that only reach the store on [`state::State::commit_batch`]. A [`diff::Diff`]
//! wraps any [`chain::ReadOnlyChain`] (another `Diff`, or `State` itself) and
//! buffers its own writes privately until [`diff::Diff::apply`] promotes them
//! upward; nesting is how the executor gives each transaction its own
//! throwaway view of the block it's being packed into.

mod cache;
mod chain;
mod diff;
mod error;
mod keys;
mod state;
mod store;

pub use chain::{Chain, CodeEntry, ReadOnlyChain};
pub use diff::Diff;
pub use error::StateError;
pub use state::{CacheSizes, State};
pub use store::{KeyValueStore, MemoryStore, WriteBatch};

#[cfg(feature = "rocksdb")]
pub use store::rocks::RocksDbStore;
