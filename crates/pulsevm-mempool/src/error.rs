use thiserror::Error;

/// Errors raised by [`crate::Mempool::add`]. `MempoolFull` is capacity
/// pressure rather than a fault with the transaction itself: callers should
/// treat it as retryable and must not record it in the drop-reason cache
/// (see [`crate::DropReason`]), or a transient full mempool would look like
/// a permanently bad transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MempoolError {
    #[error("transaction {0:?} already in mempool")]
    DuplicateTx(pulsevm_types::Digest32),

    #[error("transaction is {size} bytes, exceeding the {max} byte cap")]
    TxTooLarge { size: usize, max: usize },

    #[error("mempool is full")]
    MempoolFull,

    #[error(transparent)]
    Codec(#[from] pulsevm_codec::CodecError),
}
