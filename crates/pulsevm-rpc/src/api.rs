use jsonrpsee::core::RpcResult;
use jsonrpsee::proc_macros::rpc;

use crate::types::{GetBlockResponse, IssueTxResponse, PingResponse};

/// pulsevm JSON-RPC 2.0 API definition.
///
/// All method names are prefixed with "pulsevm." via `namespace = "pulsevm"`.
#[rpc(server, namespace = "pulsevm")]
pub trait PulseVmApi {
    /// Liveness check.
    #[method(name = "ping")]
    async fn ping(&self) -> RpcResult<PingResponse>;

    /// Submits a signed transaction to the mempool. `tx` is the marshaled
    /// `Tx` bytes, encoded per `encoding` ("hex" or "cb58").
    #[method(name = "issueTx")]
    async fn issue_tx(&self, tx: String, encoding: String) -> RpcResult<IssueTxResponse>;

    /// Looks up an accepted block by height. `encoding` controls how the
    /// returned block bytes are rendered.
    #[method(name = "getBlockByHeight")]
    async fn get_block_by_height(&self, height: u64, encoding: String) -> RpcResult<GetBlockResponse>;
}
