use pulsevm_codec::CodecError;
use thiserror::Error;

/// Errors raised by the persistence layer and the `Diff` overlay.
#[derive(Debug, Error)]
pub enum StateError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// A `Diff`'s declared parent id is not resident in the underlying store.
    #[error("missing parent state")]
    ErrMissingParentState,

    /// The underlying key-value store failed to read, write, or iterate.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A stored value could not be decoded with its expected wire format.
    #[error("corrupt stored value at key {key:?}: {source}")]
    Corrupt {
        key: Vec<u8>,
        #[source]
        source: CodecError,
    },
}
