use pulsevm_executor::TxInputs;
use pulsevm_types::Digest32;

/// Asks whether a transaction's inputs collide with any block between
/// `parent` and the last accepted block that hasn't been accepted yet.
/// `build_block` only sees mempool-internal conflicts on its own; anything
/// the processing block manager is tracking across unaccepted ancestors
/// comes through here.
///
/// Implemented by the block manager, which is the only component that knows
/// about in-flight (verified but not yet accepted) blocks.
pub trait AncestorConflicts: Send + Sync {
    fn conflicts_with_ancestors(&self, parent: &Digest32, inputs: &TxInputs) -> bool;
}

/// An [`AncestorConflicts`] that never reports a conflict. Useful for a
/// single-ancestor chain (no in-flight competing blocks) and in tests.
pub struct NoAncestorConflicts;

impl AncestorConflicts for NoAncestorConflicts {
    fn conflicts_with_ancestors(&self, _parent: &Digest32, _inputs: &TxInputs) -> bool {
        false
    }
}
