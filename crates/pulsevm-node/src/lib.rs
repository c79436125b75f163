//! Wires the execution core into a runnable node: loads configuration,
//! opens persistent state, applies genesis on first boot, and starts the
//! block builder's timer loop and the JSON-RPC server.
//!
//! The consensus engine and gossip substrate this core plugs into are
//! represented by the trait seams in [`collaborators`] rather than a real
//! implementation — wiring those in is an integration concern for whatever
//! embeds this core, not something this crate can commit to.

pub mod collaborators;
pub mod config;
pub mod genesis;

use std::sync::Arc;

use pulsevm_blockexec::BlockManager;
use pulsevm_builder::{BuilderLoop, WakeDecision};
use pulsevm_mempool::Mempool;
use pulsevm_rpc::RpcServerState;
use pulsevm_state::State;
use tracing::info;

use crate::collaborators::{ConsensusEngine, GenesisSource, GossipNetwork};
use crate::config::NodeConfig;

/// Every long-lived piece this core owns once booted, held together so the
/// binary (or an embedding integration test) can shut them down in order.
///
/// `build_signal_rx` is taken out by [`spawn_builder_loop`]: it's the
/// receiving half of the channel `mempool.request_build_block` (and every
/// successful `add`) nudges, so the builder loop must be the one consuming
/// it, not `bootstrap`.
pub struct Node {
    pub state: Arc<State>,
    pub mempool: Arc<Mempool>,
    pub block_manager: Arc<BlockManager>,
    pub rpc_state: Arc<RpcServerState>,
    build_signal_rx: Option<tokio::sync::mpsc::Receiver<()>>,
}

/// Builds every long-lived component against `store`, applying genesis
/// through `genesis_source` if the store is fresh. Does not start the
/// builder timer task or the RPC server — the caller (the binary, or a
/// test) decides whether and how those run.
pub fn bootstrap(
    store: Arc<dyn pulsevm_state::KeyValueStore>,
    config: &NodeConfig,
    genesis_source: &dyn GenesisSource,
    gossip: Arc<dyn GossipNetwork>,
) -> anyhow::Result<Node> {
    let state = Arc::new(State::new(store, (&config.cache).into()));
    genesis::apply_if_fresh(&state, genesis_source)?;

    let (mempool, build_signal_rx) = Mempool::new();
    let mempool = Arc::new(mempool);

    let block_manager = Arc::new(BlockManager::new(state.clone(), mempool.clone())?);

    let rpc_state = Arc::new(RpcServerState { state: state.clone(), mempool: mempool.clone(), gossip });

    info!(data_dir = %config.storage.data_dir.display(), "node bootstrapped");
    Ok(Node { state, mempool, block_manager, rpc_state, build_signal_rx: Some(build_signal_rx) })
}

/// Drives the block-build timer against `preferred`'s view of the chain:
/// probes for the preferred parent and the mempool's occupancy, and attempts
/// a build whenever the timer or the mempool's signal fires.
///
/// `engine.preferred_parent()` stands in for what a real consensus engine
/// would report; see [`collaborators::ConsensusEngine`].
pub fn spawn_builder_loop(
    node: &mut Node,
    engine: Arc<dyn ConsensusEngine>,
    sleep: std::time::Duration,
) -> (tokio::sync::oneshot::Sender<()>, tokio::task::JoinHandle<()>) {
    let build_signal_rx = node.build_signal_rx.take().expect("builder loop already spawned");
    let state = node.state.clone();
    let mempool = node.mempool.clone();
    let block_manager = node.block_manager.clone();

    let probe_engine = engine.clone();
    let probe = move || -> Option<WakeDecision> {
        let _ = probe_engine.preferred_parent();
        Some(WakeDecision::Sleep(sleep))
    };

    let attempt_build = move || {
        let parent_id = engine.preferred_parent();
        let parent = match block_manager.get_block(&parent_id) {
            Ok(Some(b)) => b,
            _ => return,
        };
        let height = parent.height;
        match pulsevm_builder::build_block(state.as_ref(), &parent, parent_id, &mempool, &*block_manager, now_secs()) {
            Ok((block, _inputs)) => {
                if let Ok(consensus_block) = block_manager.new_block(block) {
                    info!(height, block = ?consensus_block.id, "block built");
                }
            }
            Err(pulsevm_builder::BuilderError::NoPendingBlocks) => {}
            Err(e) => tracing::warn!(error = %e, "block build failed"),
        }
    };

    let (loop_task, shutdown_tx, _reset_tx) = BuilderLoop::new(probe, attempt_build, build_signal_rx);
    let handle = tokio::spawn(loop_task.run());
    (shutdown_tx, handle)
}

fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{FixedGenesisSource, NoopConsensusEngine, NoopGossipNetwork};
    use pulsevm_state::MemoryStore;
    use pulsevm_types::Name;

    #[tokio::test]
    async fn bootstrap_applies_genesis_and_wires_components() {
        let store: Arc<dyn pulsevm_state::KeyValueStore> = Arc::new(MemoryStore::new());
        let config = NodeConfig::default();
        let source = FixedGenesisSource::new(Name::from_str_lossy("pulse"), [2u8; 33], 1_700_000_000);

        let node = bootstrap(store, &config, &source, Arc::new(NoopGossipNetwork)).unwrap();
        assert!(node.mempool.is_empty());
        let last_accepted = node.block_manager.last_accepted();
        assert_ne!(last_accepted, pulsevm_types::EMPTY_DIGEST);
    }

    #[tokio::test]
    async fn builder_loop_can_be_started_and_shut_down() {
        let store: Arc<dyn pulsevm_state::KeyValueStore> = Arc::new(MemoryStore::new());
        let config = NodeConfig::default();
        let source = FixedGenesisSource::new(Name::from_str_lossy("pulse"), [2u8; 33], 1);
        let mut node = bootstrap(store, &config, &source, Arc::new(NoopGossipNetwork)).unwrap();

        let engine = Arc::new(NoopConsensusEngine::new(node.block_manager.last_accepted()));
        let (shutdown_tx, handle) = spawn_builder_loop(&mut node, engine, std::time::Duration::from_millis(10));
        let _ = shutdown_tx.send(());
        handle.await.unwrap();
    }
}
