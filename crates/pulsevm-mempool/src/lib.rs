//! Bounded, FIFO-ordered queue of transactions waiting to be packed into a
//! block. Admission is capacity-checked by total byte size, not by count;
//! a small bounded cache remembers why recently-dropped transactions left
//! the queue so resubmitting callers can be told the reason instead of
//! silently failing to find it again.

mod error;
mod metrics;
mod pool;

pub use error::MempoolError;
pub use pool::{DropReason, Mempool, MAX_TX_SIZE, MEMPOOL_CAPACITY};
