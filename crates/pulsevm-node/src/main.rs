//! pulsevm-node — boots the execution core as a standalone process.
//!
//! Startup sequence:
//!   1. Load (or default) `NodeConfig`
//!   2. Open the data directory and its persistent state
//!   3. Apply genesis if the store is fresh
//!   4. Start the block builder's timer loop
//!   5. Start the JSON-RPC server
//!   6. Wait for shutdown

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use pulsevm_node::collaborators::{FixedGenesisSource, NoopConsensusEngine, NoopGossipNetwork};
use pulsevm_node::config::NodeConfig;
use pulsevm_node::{bootstrap, spawn_builder_loop};
use pulsevm_rpc::RpcServer;
use pulsevm_types::Name;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "pulsevm-node", version, about = "pulsevm execution core node")]
struct Args {
    /// Path to a TOML config file; defaults are used if omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Name of the privileged seed account created at genesis.
    #[arg(long, default_value = "pulse")]
    genesis_account: String,

    /// Hex-encoded compressed secp256k1 public key (33 bytes) controlling
    /// the genesis account's owner/active authority.
    #[arg(long)]
    genesis_key: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,pulsevm=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();
    info!("pulsevm node starting");

    let config = match &args.config {
        Some(path) => NodeConfig::load(path).with_context(|| format!("loading config from {}", path.display()))?,
        None => NodeConfig::default(),
    };

    if config.builder.mempool_capacity_bytes != pulsevm_mempool::MEMPOOL_CAPACITY
        || config.builder.max_tx_size_bytes != pulsevm_mempool::MAX_TX_SIZE
        || config.builder.target_block_size_bytes != pulsevm_builder::TARGET_BLOCK_SIZE
    {
        warn!("config declares capacity limits that differ from the compiled-in ones; the compiled-in limits are what actually apply");
    }

    std::fs::create_dir_all(&config.storage.data_dir)
        .with_context(|| format!("creating data dir {}", config.storage.data_dir.display()))?;

    let store: Arc<dyn pulsevm_state::KeyValueStore> = open_store(&config)?;

    let genesis_key = match &args.genesis_key {
        Some(hex_key) => {
            let bytes = hex::decode(hex_key).context("decoding --genesis-key")?;
            let mut key = [0u8; 33];
            if bytes.len() != 33 {
                anyhow::bail!("--genesis-key must be 33 bytes (compressed secp256k1 pubkey), got {}", bytes.len());
            }
            key.copy_from_slice(&bytes);
            key
        }
        None => {
            warn!("no --genesis-key provided, using an all-zero placeholder key — do not use this in production");
            [0u8; 33]
        }
    };
    let genesis_source = FixedGenesisSource::new(Name::from_str_lossy(&args.genesis_account), genesis_key, now_secs());

    let mut node = bootstrap(store, &config, &genesis_source, Arc::new(NoopGossipNetwork)).context("bootstrapping node")?;

    let engine = Arc::new(NoopConsensusEngine::new(node.block_manager.last_accepted()));
    let sleep = std::time::Duration::from_millis(config.builder.sleep_interval_ms);
    let (builder_shutdown, builder_handle) = spawn_builder_loop(&mut node, engine, sleep);

    let rpc_handle = RpcServer::new(node.rpc_state.clone())
        .start(config.network.rpc_addr)
        .await
        .context("starting RPC server")?;

    info!("node ready");
    tokio::signal::ctrl_c().await?;
    info!("shutting down");

    let _ = builder_shutdown.send(());
    let _ = builder_handle.await;
    rpc_handle.stop().ok();

    Ok(())
}

#[cfg(not(feature = "rocksdb"))]
fn open_store(_config: &NodeConfig) -> anyhow::Result<Arc<dyn pulsevm_state::KeyValueStore>> {
    warn!("built without the \"rocksdb\" feature, state is in-memory only and will not survive a restart");
    Ok(Arc::new(pulsevm_state::MemoryStore::new()))
}

#[cfg(feature = "rocksdb")]
fn open_store(config: &NodeConfig) -> anyhow::Result<Arc<dyn pulsevm_state::KeyValueStore>> {
    let store = pulsevm_state::RocksDbStore::open(&config.storage.data_dir)
        .with_context(|| format!("opening rocksdb store at {}", config.storage.data_dir.display()))?;
    Ok(Arc::new(store))
}

fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
