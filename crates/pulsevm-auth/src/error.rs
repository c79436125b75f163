use pulsevm_codec::CodecError;
use pulsevm_state::StateError;
use thiserror::Error;

/// Errors raised while recovering signer keys or walking the permission
/// graph to decide whether a transaction's signatures satisfy a declared
/// authorizer.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("signature at index {index} failed to recover a public key: {reason}")]
    InvalidSignature { index: usize, reason: String },

    #[error("permission {owner}@{permission} not found")]
    PermissionNotFound { owner: String, permission: String },

    #[error("recursion depth exceeded walking permission {owner}@{permission}")]
    RecursionDepthExceeded { owner: String, permission: String },

    #[error("permission level {owner}@{permission} not satisfied by provided keys")]
    NotSatisfied { owner: String, permission: String },
}
