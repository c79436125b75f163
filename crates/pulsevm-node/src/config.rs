use std::net::SocketAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Complete node configuration, loadable from a TOML file via [`NodeConfig::load`]
/// or used as-is via [`Default`] for local development.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub network: NetworkConfig,
    pub storage: StorageConfig,
    pub cache: CacheConfig,
    pub builder: BuilderConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        NodeConfig {
            network: NetworkConfig::default(),
            storage: StorageConfig::default(),
            cache: CacheConfig::default(),
            builder: BuilderConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Parses a `NodeConfig` from a TOML file at `path`.
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e.to_string()))?;
        toml::from_str(&raw).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

/// JSON-RPC listen configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub rpc_addr: SocketAddr,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig { rpc_addr: ([127, 0, 0, 1], 9650).into() }
    }
}

/// Where persistent state lives on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig { data_dir: PathBuf::from("./data") }
    }
}

/// Per-table cache capacities, mapped directly onto [`pulsevm_state::CacheSizes`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub txs: usize,
    pub blocks: usize,
    pub block_ids: usize,
    pub accounts: usize,
    pub permissions: usize,
    pub code: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        let sizes = pulsevm_state::CacheSizes::default();
        CacheConfig {
            txs: sizes.txs,
            blocks: sizes.blocks,
            block_ids: sizes.block_ids,
            accounts: sizes.accounts,
            permissions: sizes.permissions,
            code: sizes.code,
        }
    }
}

impl From<&CacheConfig> for pulsevm_state::CacheSizes {
    fn from(c: &CacheConfig) -> Self {
        pulsevm_state::CacheSizes {
            txs: c.txs,
            blocks: c.blocks,
            block_ids: c.block_ids,
            accounts: c.accounts,
            permissions: c.permissions,
            code: c.code,
        }
    }
}

/// Block builder's timer loop and the compiled-in capacity limits it and the
/// mempool enforce.
///
/// `mempool_capacity_bytes`, `max_tx_size_bytes`, and `target_block_size_bytes`
/// are informational: `pulsevm-mempool` and `pulsevm-builder` fix these as
/// crate constants rather than runtime parameters (see
/// [`pulsevm_mempool::MEMPOOL_CAPACITY`], [`pulsevm_mempool::MAX_TX_SIZE`],
/// [`pulsevm_builder::TARGET_BLOCK_SIZE`]), so a config file that disagrees
/// with them describes the binary's actual behavior incorrectly; the node
/// logs a warning at startup rather than silently ignoring the mismatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuilderConfig {
    pub sleep_interval_ms: u64,
    pub mempool_capacity_bytes: usize,
    pub max_tx_size_bytes: usize,
    pub target_block_size_bytes: usize,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        BuilderConfig {
            sleep_interval_ms: pulsevm_builder::DEFAULT_SLEEP.as_millis() as u64,
            mempool_capacity_bytes: pulsevm_mempool::MEMPOOL_CAPACITY,
            max_tx_size_bytes: pulsevm_mempool::MAX_TX_SIZE,
            target_block_size_bytes: pulsevm_builder::TARGET_BLOCK_SIZE,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading config file {0:?}: {1}")]
    Read(PathBuf, String),
    #[error("parsing config: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_compiled_in_limits() {
        let config = NodeConfig::default();
        assert_eq!(config.builder.mempool_capacity_bytes, pulsevm_mempool::MEMPOOL_CAPACITY);
        assert_eq!(config.network.rpc_addr.port(), 9650);
    }

    #[test]
    fn round_trips_through_toml() {
        let config = NodeConfig::default();
        let text = toml::to_string(&config).unwrap();
        let back: NodeConfig = toml::from_str(&text).unwrap();
        assert_eq!(back.storage.data_dir, config.storage.data_dir);
    }
}
