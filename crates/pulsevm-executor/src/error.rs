use pulsevm_auth::AuthError;
use pulsevm_codec::CodecError;
use pulsevm_state::StateError;
use thiserror::Error;

/// Errors raised while executing a single transaction: authority failures,
/// malformed native-action payloads, and the state-consistency checks each
/// native handler enforces.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("transaction declares no authorizer")]
    NoAuthorizer,

    #[error("missing authority of {actor}")]
    MissingAuthority { actor: String },

    #[error("action data for {action} is malformed: {reason}")]
    MalformedActionData { action: String, reason: String },

    #[error("account name is empty")]
    EmptyAccountName,

    #[error("account name longer than 12 characters")]
    AccountNameTooLong,

    #[error("'{name}' uses the reserved 'pulse.' prefix but creator '{creator}' is not privileged")]
    ReservedPrefixWithoutPrivilege { name: String, creator: String },

    #[error("account '{0}' already exists")]
    AccountAlreadyExists(String),

    #[error("creator account '{0}' not found")]
    CreatorNotFound(String),

    #[error("account '{0}' has no account record")]
    AccountNotFound(String),

    #[error("code is already running this version")]
    AlreadyRunningThisVersion,
}
