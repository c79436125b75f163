use pulsevm_types::Digest32;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlockExecError {
    #[error("block has no transactions")]
    EmptyBlock,

    #[error("block {0:?} references an unknown parent")]
    UnknownParent(Digest32),

    #[error("transaction conflicts with another already packed into this block")]
    ConflictingBlockTxs,

    #[error("block {0:?} is not a known processing block")]
    UnknownProcessingBlock(Digest32),

    #[error("block height {got} does not follow parent height {parent} (expected {expected})")]
    HeightMismatch { parent: u64, expected: u64, got: u64 },

    #[error("block time {got} precedes parent time {parent}")]
    NonMonotonicTime { parent: u64, got: u64 },

    #[error(transparent)]
    State(#[from] pulsevm_state::StateError),

    #[error(transparent)]
    Codec(#[from] pulsevm_codec::CodecError),

    #[error(transparent)]
    Executor(#[from] pulsevm_executor::ExecutorError),
}
