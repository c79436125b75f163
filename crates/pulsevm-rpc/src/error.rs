use jsonrpsee::types::ErrorObject;
use thiserror::Error;

/// Errors raised while servicing an RPC call, before they're folded into a
/// JSON-RPC `ErrorObject` at the edge.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("unknown encoding {0:?}, expected \"hex\" or \"cb58\"")]
    UnknownEncoding(String),

    #[error("malformed {field}: {reason}")]
    Malformed { field: &'static str, reason: String },

    #[error(transparent)]
    Mempool(#[from] pulsevm_mempool::MempoolError),

    #[error(transparent)]
    BlockExec(#[from] pulsevm_blockexec::BlockExecError),

    #[error(transparent)]
    State(#[from] pulsevm_state::StateError),

    #[error(transparent)]
    Codec(#[from] pulsevm_codec::CodecError),
}

/// JSON-RPC 2.0 reserved code for invalid method parameters.
const INVALID_PARAMS: i32 = -32602;
/// JSON-RPC 2.0 reserved code for an internal server error.
const INTERNAL_ERROR: i32 = -32603;

impl From<RpcError> for ErrorObject<'static> {
    fn from(err: RpcError) -> Self {
        let code = match &err {
            RpcError::UnknownEncoding(_) | RpcError::Malformed { .. } | RpcError::Codec(_) | RpcError::Mempool(_) => INVALID_PARAMS,
            RpcError::BlockExec(_) | RpcError::State(_) => INTERNAL_ERROR,
        };
        ErrorObject::owned(code, err.to_string(), None::<()>)
    }
}
