use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuilderError {
    #[error("no pending transactions to build a block from")]
    NoPendingBlocks,

    #[error("preferred block {0:?} has no known parent state")]
    MissingParentState(pulsevm_types::Digest32),

    #[error(transparent)]
    State(#[from] pulsevm_state::StateError),

    #[error(transparent)]
    Codec(#[from] pulsevm_codec::CodecError),
}
