//! JSON-RPC facade over the execution core: liveness, transaction
//! submission into the mempool, and accepted-block lookup by height.
//!
//! Mounted at `/rpc` by `pulsevm-node`; the wire methods and their
//! `encoding` parameter (`"hex"` or `"cb58"`) are the external contract,
//! everything else here is plumbing.

mod api;
mod error;
mod gossip;
mod server;
mod types;

pub use api::PulseVmApiServer;
pub use error::RpcError;
pub use gossip::{GossipNetwork, NoopGossipNetwork};
pub use server::{RpcServer, RpcServerState};
pub use types::{decode_bytes, encode_bytes, GetBlockResponse, IssueTxResponse, PingResponse};

#[cfg(test)]
mod tests {
    use super::*;
    use pulsevm_mempool::Mempool;
    use pulsevm_state::{CacheSizes, MemoryStore, State};
    use pulsevm_types::{BaseTx, StandardBlock, Tx, UnsignedTx};
    use std::sync::Arc;

    fn server() -> RpcServer {
        let state = Arc::new(State::new(Arc::new(MemoryStore::new()), CacheSizes::default()));
        let (mempool, _rx) = Mempool::new();
        RpcServer::new(Arc::new(RpcServerState {
            state,
            mempool: Arc::new(mempool),
            gossip: Arc::new(crate::NoopGossipNetwork),
        }))
    }

    #[tokio::test]
    async fn ping_reports_success() {
        let response = PulseVmApiServer::ping(&server()).await.unwrap();
        assert!(response.success);
    }

    #[tokio::test]
    async fn issue_tx_rejects_unknown_encoding() {
        let base = BaseTx { network_id: 1, blockchain_id: [0u8; 32], actions: vec![] };
        let tx = Tx::new(UnsignedTx::Base(base), vec![[0u8; 65]]);
        let hex_bytes = hex::encode(pulsevm_codec::Marshal::marshal_to_vec(&tx).unwrap());
        let err = PulseVmApiServer::issue_tx(&server(), hex_bytes, "base64".to_string())
            .await
            .unwrap_err();
        assert_eq!(err.code(), -32602);
    }

    #[tokio::test]
    async fn issue_tx_admits_a_well_formed_transaction() {
        let base = BaseTx { network_id: 1, blockchain_id: [0u8; 32], actions: vec![] };
        let tx = Tx::new(UnsignedTx::Base(base), vec![[0u8; 65]]);
        let hex_bytes = hex::encode(pulsevm_codec::Marshal::marshal_to_vec(&tx).unwrap());
        let response = PulseVmApiServer::issue_tx(&server(), hex_bytes, "hex".to_string()).await.unwrap();
        assert_eq!(response.tx_id.len(), 64);
    }

    #[tokio::test]
    async fn get_block_by_height_reports_missing_heights() {
        let err = PulseVmApiServer::get_block_by_height(&server(), 5, "hex".to_string())
            .await
            .unwrap_err();
        assert_eq!(err.code(), -32602);
    }

    #[tokio::test]
    async fn get_block_by_height_honors_json_encoding() {
        use pulsevm_state::Chain;

        let srv = server();
        let genesis = StandardBlock::new(pulsevm_types::EMPTY_DIGEST, 0, 0, vec![]);
        let block_id = genesis.id().unwrap();
        srv.state.state.set_block_id_at(0, block_id).unwrap();
        srv.state.state.add_block(genesis.clone()).unwrap();
        srv.state.state.commit_batch().unwrap();

        let response = PulseVmApiServer::get_block_by_height(&srv, 0, "json".to_string()).await.unwrap();
        assert_eq!(response.encoding, "json");
        let decoded: StandardBlock = serde_json::from_str(&response.block).unwrap();
        assert_eq!(decoded.id().unwrap(), block_id);
    }

    #[tokio::test]
    async fn get_block_by_height_returns_a_stored_block() {
        use pulsevm_state::Chain;

        let srv = server();
        let genesis = StandardBlock::new(pulsevm_types::EMPTY_DIGEST, 0, 0, vec![]);
        let block_id = genesis.id().unwrap();
        srv.state.state.set_block_id_at(0, block_id).unwrap();
        srv.state.state.add_block(genesis.clone()).unwrap();
        srv.state.state.commit_batch().unwrap();

        let response = PulseVmApiServer::get_block_by_height(&srv, 0, "hex".to_string()).await.unwrap();
        assert_eq!(response.encoding, "hex");
        let decoded = hex::decode(&response.block).unwrap();
        let decoded_block: StandardBlock = pulsevm_codec::Unmarshal::unmarshal_exact(&decoded).unwrap();
        assert_eq!(decoded_block.id().unwrap(), block_id);
    }
}
