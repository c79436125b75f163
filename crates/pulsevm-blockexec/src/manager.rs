use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use pulsevm_builder::AncestorConflicts;
use pulsevm_executor::{conflicts, execute_standard, TxInputs};
use pulsevm_mempool::Mempool;
use pulsevm_state::{Chain, Diff, ReadOnlyChain, State};
use pulsevm_types::{Digest32, StandardBlock};
use tracing::debug;

use crate::error::BlockExecError;
use crate::layer::{Layer, LayeredView, LayerWriter};

/// A block that has been `Verify`d but not yet `Accept`ed or `Reject`ed.
pub struct ProcessingState {
    pub block: StandardBlock,
    pub timestamp: u64,
    pub inputs: TxInputs,
    pub layers: Vec<Arc<Layer>>,
    pub verified_heights: HashSet<u64>,
}

/// A stateless block handed back to the consensus engine together with the
/// id it hashes to, so callers don't need to re-derive it.
pub struct ConsensusBlock {
    pub id: Digest32,
    pub block: StandardBlock,
}

/// Tracks every block between the last accepted block and the current
/// verification frontier, and commits accepted blocks into `state`
/// atomically.
///
/// Holds `state` behind an `Arc` rather than a lifetime-scoped borrow: this
/// is the component the RPC facade and the builder both reach into for the
/// life of the process, and an owned handle is what lets `pulsevm-node`
/// wire it into a `'static` RPC server without fighting borrow scopes.
pub struct BlockManager {
    state: Arc<State>,
    mempool: Arc<Mempool>,
    processing: Mutex<HashMap<Digest32, ProcessingState>>,
    preferred: Mutex<Digest32>,
    last_accepted: Mutex<Digest32>,
}

impl BlockManager {
    pub fn new(state: Arc<State>, mempool: Arc<Mempool>) -> Result<Self, BlockExecError> {
        let last_accepted = state.get_last_accepted()?.unwrap_or(pulsevm_types::EMPTY_DIGEST);
        Ok(BlockManager {
            state,
            mempool,
            processing: Mutex::new(HashMap::new()),
            preferred: Mutex::new(last_accepted),
            last_accepted: Mutex::new(last_accepted),
        })
    }

    pub fn last_accepted(&self) -> Digest32 {
        *self.last_accepted.lock()
    }

    pub fn preferred(&self) -> Digest32 {
        *self.preferred.lock()
    }

    pub fn set_preference(&self, id: Digest32) {
        *self.preferred.lock() = id;
    }

    /// Looks a block up by id: first among still-processing blocks, then in
    /// persistent storage.
    pub fn get_block(&self, id: &Digest32) -> Result<Option<StandardBlock>, BlockExecError> {
        if let Some(ps) = self.processing.lock().get(id) {
            return Ok(Some(ps.block.clone()));
        }
        Ok(self.state.get_block(id)?)
    }

    pub fn new_block(&self, block: StandardBlock) -> Result<ConsensusBlock, BlockExecError> {
        let id = block.id()?;
        Ok(ConsensusBlock { id, block })
    }

    /// Builds the read view a block with the given parent should execute
    /// against: the committed `state` plus every still-pending ancestor
    /// layer between it and `last_accepted`, oldest first.
    fn view_for_parent(&self, processing: &HashMap<Digest32, ProcessingState>, parent: Digest32) -> Result<Vec<Arc<Layer>>, BlockExecError> {
        if parent == self.last_accepted() {
            return Ok(Vec::new());
        }
        let parent_state = processing.get(&parent).ok_or(BlockExecError::UnknownParent(parent))?;
        Ok(parent_state.layers.clone())
    }

    /// Resolves `parent`'s height and time, checking still-processing blocks
    /// before falling back to persisted state. Takes the already-locked
    /// `processing` map rather than re-locking it, since callers hold it for
    /// the duration of `verify`. Returns `None` if `parent` isn't found
    /// anywhere, which only happens for the very first block built on top of
    /// an as-yet-ungenesised chain.
    fn parent_height_time(&self, processing: &HashMap<Digest32, ProcessingState>, parent: Digest32) -> Result<Option<(u64, u64)>, BlockExecError> {
        if let Some(ps) = processing.get(&parent) {
            return Ok(Some((ps.block.height, ps.block.time)));
        }
        Ok(self.state.get_block(&parent)?.map(|b| (b.height, b.time)))
    }

    /// Verifies `block`, executing every transaction against a view layered
    /// over its (possibly still-pending) parent. Calling this again for a
    /// block already processing is idempotent: it just records the new
    /// p-chain height and returns.
    pub fn verify(&self, block: StandardBlock, p_chain_height: u64) -> Result<Digest32, BlockExecError> {
        let id = block.id()?;

        let mut processing = self.processing.lock();
        if let Some(ps) = processing.get_mut(&id) {
            ps.verified_heights.insert(p_chain_height);
            return Ok(id);
        }

        if block.txs.is_empty() {
            return Err(BlockExecError::EmptyBlock);
        }

        if let Some((parent_height, parent_time)) = self.parent_height_time(&processing, block.parent_id)? {
            if block.height != parent_height + 1 {
                return Err(BlockExecError::HeightMismatch { parent: parent_height, expected: parent_height + 1, got: block.height });
            }
            if block.time < parent_time {
                return Err(BlockExecError::NonMonotonicTime { parent: parent_time, got: block.time });
            }
        }

        let ancestor_layers = self.view_for_parent(&processing, block.parent_id)?;
        let view = LayeredView::new(self.state.as_ref(), ancestor_layers);

        let writer = LayerWriter::new();
        let mut block_inputs = TxInputs::new();
        for tx in &block.txs {
            let tx_diff = Diff::new(&view);
            let (tx_inputs, _tracker) = execute_standard(tx, &tx_diff, block.time as u32)?;
            if conflicts(&block_inputs, &tx_inputs) {
                return Err(BlockExecError::ConflictingBlockTxs);
            }
            block_inputs.extend(tx_inputs);
            tx_diff.apply(&writer)?;
        }

        let layer = Arc::new(writer.into_layer());
        let mut layers = view.layers().to_vec();
        layers.push(layer);

        let tx_ids: Vec<Digest32> = block.txs.iter().map(|tx| tx.id()).collect::<Result<_, _>>()?;
        self.mempool.remove(tx_ids);

        let timestamp = block.time;
        processing.insert(
            id,
            ProcessingState {
                block,
                timestamp,
                inputs: block_inputs,
                layers,
                verified_heights: HashSet::from([p_chain_height]),
            },
        );

        debug!(block = ?id, "block verified");
        Ok(id)
    }

    /// Applies a verified block's accumulated writes into `state`, marks it
    /// as the new last accepted block, and evicts its processing entry.
    /// Uses `state.commit_batch` so the whole block lands atomically.
    pub fn accept(&self, id: &Digest32) -> Result<(), BlockExecError> {
        let ps = self
            .processing
            .lock()
            .remove(id)
            .ok_or(BlockExecError::UnknownProcessingBlock(*id))?;

        for layer in &ps.layers {
            apply_layer(layer, self.state.as_ref())?;
        }

        self.state.set_last_accepted(*id)?;
        self.state.set_block_id_at(ps.block.height, *id)?;
        self.state.add_block(ps.block.clone())?;
        for tx in &ps.block.txs {
            self.state.add_tx(tx.clone())?;
        }
        self.state.commit_batch()?;

        *self.last_accepted.lock() = *id;
        Ok(())
    }

    /// Discards a block's processing entry. The mempool is left untouched —
    /// any of its transactions that were bad were already marked dropped
    /// during `verify`, and the rest are simply still eligible to be packed
    /// into a future block.
    pub fn reject(&self, id: &Digest32) -> Result<(), BlockExecError> {
        self.processing
            .lock()
            .remove(id)
            .ok_or(BlockExecError::UnknownProcessingBlock(*id))?;
        Ok(())
    }
}

impl AncestorConflicts for BlockManager {
    /// Walks processing blocks from `parent` back to the last accepted
    /// block, reporting a conflict if any of their accumulated inputs
    /// overlap `inputs`.
    fn conflicts_with_ancestors(&self, parent: &Digest32, inputs: &TxInputs) -> bool {
        let processing = self.processing.lock();
        let last_accepted = self.last_accepted();
        let mut current = *parent;
        while current != last_accepted {
            let Some(ps) = processing.get(&current) else { break };
            if conflicts(&ps.inputs, inputs) {
                return true;
            }
            current = ps.block.parent_id;
        }
        false
    }
}

fn apply_layer(layer: &Layer, state: &State) -> Result<(), pulsevm_state::StateError> {
    for account in layer.accounts.values() {
        state.modify_account(account.clone())?;
    }
    for perm in layer.permissions.values() {
        state.add_permission(perm.clone())?;
    }
    for (hash, entry) in &layer.code {
        match entry {
            Some(e) => state.modify_code(*hash, e.clone())?,
            None => state.remove_code(hash)?,
        }
    }
    Ok(())
}
