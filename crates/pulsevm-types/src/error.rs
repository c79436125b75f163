use pulsevm_codec::CodecError;
use thiserror::Error;

/// Errors raised while constructing or validating a domain value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypesError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("authority threshold must be greater than zero")]
    ZeroThreshold,

    #[error("authority has no keys or accounts")]
    EmptyAuthority,

    #[error("authority weights sum to {sum} but threshold is {threshold}")]
    InsufficientWeight { sum: u64, threshold: u64 },

    #[error("account name is empty")]
    EmptyAccountName,

    #[error("account name longer than 12 characters")]
    AccountNameTooLong,
}
