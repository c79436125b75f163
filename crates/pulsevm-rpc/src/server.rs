use std::net::SocketAddr;
use std::sync::Arc;

use jsonrpsee::core::{async_trait, RpcResult};
use jsonrpsee::server::{Server, ServerHandle};
use pulsevm_codec::{Marshal, Unmarshal};
use pulsevm_mempool::Mempool;
use pulsevm_state::{ReadOnlyChain, State};
use pulsevm_types::Tx;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::api::PulseVmApiServer;
use crate::error::RpcError;
use crate::gossip::GossipNetwork;
use crate::types::{decode_bytes, encode_bytes, GetBlockResponse, IssueTxResponse, PingResponse};

/// Shared state passed to the RPC server: the committed chain view and the
/// mempool transactions are admitted into. Holds `State` rather than the
/// `Chain`/`ReadOnlyChain` trait object since only accepted, persisted
/// blocks are ever served here — in-flight blocks live in `BlockManager`
/// and aren't part of this read surface.
pub struct RpcServerState {
    pub state: Arc<State>,
    pub mempool: Arc<Mempool>,
    pub gossip: Arc<dyn GossipNetwork>,
}

/// The RPC server implementation.
pub struct RpcServer {
    pub(crate) state: Arc<RpcServerState>,
}

impl RpcServer {
    pub fn new(state: Arc<RpcServerState>) -> Self {
        RpcServer { state }
    }

    /// Starts the JSON-RPC server on `addr` with permissive CORS headers.
    /// Returns a handle the caller can use to stop it.
    pub async fn start(self, addr: SocketAddr) -> anyhow::Result<ServerHandle> {
        let cors = CorsLayer::new().allow_methods(Any).allow_origin(Any).allow_headers(Any);

        let server = Server::builder()
            .set_http_middleware(tower::ServiceBuilder::new().layer(cors))
            .build(addr)
            .await?;

        let module = self.into_rpc();
        let handle = server.start(module);
        info!(%addr, "RPC server started");
        Ok(handle)
    }

    fn issue_tx_inner(&self, tx: &str, encoding: &str) -> Result<IssueTxResponse, RpcError> {
        let bytes = decode_bytes(tx, encoding)?;
        let parsed = Tx::unmarshal_exact(&bytes)?;
        let id = self.state.mempool.add(parsed)?;
        self.state.gossip.broadcast_tx(id);
        Ok(IssueTxResponse { tx_id: hex::encode(id) })
    }

    fn get_block_by_height_inner(&self, height: u64, encoding: &str) -> Result<GetBlockResponse, RpcError> {
        let id = self
            .state
            .state
            .get_block_id_at(height)?
            .ok_or_else(|| RpcError::Malformed { field: "height", reason: "no accepted block at that height".to_string() })?;
        let block = self
            .state
            .state
            .get_block(&id)?
            .ok_or_else(|| RpcError::Malformed { field: "height", reason: "block id indexed but not stored".to_string() })?;

        if encoding == "json" {
            let encoded = serde_json::to_string(&block)
                .map_err(|e| RpcError::Malformed { field: "height", reason: e.to_string() })?;
            return Ok(GetBlockResponse { block: encoded, encoding: encoding.to_string() });
        }

        let bytes = block.marshal_to_vec()?;
        let encoded = encode_bytes(&bytes, encoding)?;
        Ok(GetBlockResponse { block: encoded, encoding: encoding.to_string() })
    }
}

#[async_trait]
impl PulseVmApiServer for RpcServer {
    async fn ping(&self) -> RpcResult<PingResponse> {
        Ok(PingResponse { success: true })
    }

    async fn issue_tx(&self, tx: String, encoding: String) -> RpcResult<IssueTxResponse> {
        self.issue_tx_inner(&tx, &encoding).map_err(Into::into)
    }

    async fn get_block_by_height(&self, height: u64, encoding: String) -> RpcResult<GetBlockResponse> {
        self.get_block_by_height_inner(height, &encoding).map_err(Into::into)
    }
}
