//! Seams for the pieces this core deliberately doesn't implement: the
//! consensus engine decides block ordering and finality, the gossip
//! substrate propagates transactions and blocks between peers, and a
//! genesis source supplies the one-time bootstrap parameters. Each is a
//! trait so `pulsevm-node` can be exercised end to end with a fixed stand-in
//! while a real subnet VM wires in its own implementation.

use pulsevm_types::{Authority, Digest32};

/// `GossipNetwork` lives in `pulsevm-rpc` since `RpcServerState` is the thing
/// that actually calls it on `issueTx`; re-exported here so binaries only
/// need to reach into `collaborators` for every trait seam this core leaves
/// for its embedder.
pub use pulsevm_rpc::{GossipNetwork, NoopGossipNetwork};

/// What a consensus engine hands this core to get a block verified and,
/// eventually, accepted or rejected. Out of scope per this core's purpose:
/// fork choice, validator sets, and finality gadgets live entirely on the
/// other side of this trait.
pub trait ConsensusEngine: Send + Sync {
    /// The parent this engine currently prefers new blocks be built on.
    fn preferred_parent(&self) -> Digest32;
}

/// One-time genesis parameters: the seed privileged account's name and the
/// key authorized to act as its owner/active authority. Parsing these out
/// of a genesis file is out of scope; this core only consumes the parsed
/// result.
pub struct GenesisParams {
    pub account: pulsevm_types::Name,
    pub key: [u8; 33],
    pub timestamp: u64,
}

/// Supplies [`GenesisParams`] on first boot. Reading and validating an
/// actual genesis file format is left to the caller's implementation.
pub trait GenesisSource {
    fn load(&self) -> GenesisParams;
}

/// A fixed, no-network default used by the integration path and by
/// `pulsevm-node` until a real consensus/gossip implementation is wired in.
pub struct NoopConsensusEngine {
    preferred: Digest32,
}

impl NoopConsensusEngine {
    pub fn new(preferred: Digest32) -> Self {
        NoopConsensusEngine { preferred }
    }
}

impl ConsensusEngine for NoopConsensusEngine {
    fn preferred_parent(&self) -> Digest32 {
        self.preferred
    }
}

/// A genesis source with parameters fixed at construction time, for local
/// development and tests. Produces an `Authority` with a single key at
/// weight 1 and threshold 1 for both the seed account's owner and active
/// permissions.
pub struct FixedGenesisSource {
    params: GenesisParams,
}

impl FixedGenesisSource {
    pub fn new(account: pulsevm_types::Name, key: [u8; 33], timestamp: u64) -> Self {
        FixedGenesisSource { params: GenesisParams { account, key, timestamp } }
    }
}

impl GenesisSource for FixedGenesisSource {
    fn load(&self) -> GenesisParams {
        GenesisParams { account: self.params.account, key: self.params.key, timestamp: self.params.timestamp }
    }
}

/// The single-key, threshold-1 authority every genesis seed permission uses.
pub fn seed_authority(key: [u8; 33]) -> Authority {
    Authority { threshold: 1, keys: vec![pulsevm_types::KeyWeight { key, weight: 1 }], accounts: vec![] }
}
