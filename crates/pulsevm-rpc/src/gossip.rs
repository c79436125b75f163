//! Stand-in for the peer-to-peer substrate that relays transactions and
//! blocks between nodes. Lives here rather than in `pulsevm-node` since
//! `RpcServerState` is what actually needs to call it on `issueTx` — this
//! core only needs to announce "gossip this"; how it reaches other peers is
//! out of scope.

use pulsevm_types::Digest32;

pub trait GossipNetwork: Send + Sync {
    /// A transaction was just admitted to the mempool via `issueTx`.
    fn broadcast_tx(&self, id: Digest32);

    /// A block was just accepted.
    fn broadcast_block(&self, id: Digest32);
}

/// A [`GossipNetwork`] that does nothing. The default until a real gossip
/// substrate is wired in.
pub struct NoopGossipNetwork;

impl GossipNetwork for NoopGossipNetwork {
    fn broadcast_tx(&self, _id: Digest32) {}
    fn broadcast_block(&self, _id: Digest32) {}
}
