use pulsevm_codec::Marshal;
use pulsevm_executor::{conflicts, execute_standard, TxInputs};
use pulsevm_mempool::{DropReason, Mempool};
use pulsevm_state::{Diff, ReadOnlyChain};
use pulsevm_types::StandardBlock;
use tracing::{debug, warn};

use crate::ancestors::AncestorConflicts;
use crate::error::BuilderError;

/// Chosen so the worst single admissible transaction (< [`pulsevm_mempool::MAX_TX_SIZE`],
/// 64 KiB) always fits, while still bounding how much a single block can
/// grow.
pub const TARGET_BLOCK_SIZE: usize = 128 * 1024;

/// Packs queued mempool transactions on top of `parent` into a new
/// [`StandardBlock`], executing each candidate against a fresh [`Diff`] over
/// `parent_state` to check authority and collect its input set before
/// committing it to the block.
///
/// Bad or conflicting transactions are evicted from the mempool with a
/// recorded drop reason and skipped; packing stops once the next queued
/// transaction doesn't fit in the remaining budget. Returns
/// [`BuilderError::NoPendingBlocks`] if nothing made it into the block.
pub fn build_block<P: ReadOnlyChain + ?Sized>(
    parent_state: &P,
    parent: &StandardBlock,
    parent_id: pulsevm_types::Digest32,
    mempool: &Mempool,
    ancestor_conflicts: &dyn AncestorConflicts,
    now: u64,
) -> Result<(StandardBlock, TxInputs), BuilderError> {
    let next_height = parent.height + 1;
    let timestamp = now.max(parent.time);

    let block_diff = Diff::new(parent_state);
    let mut block_inputs = TxInputs::new();
    let mut block_txs = Vec::new();
    let mut remaining = TARGET_BLOCK_SIZE;

    loop {
        let Some(candidate) = mempool.peek() else { break };
        let size = candidate.marshal_to_vec()?.len();
        if size > remaining {
            break;
        }

        let id = candidate.id()?;
        mempool.remove([id]);

        let tx_diff = Diff::new(&block_diff);
        let outcome = execute_standard(&candidate, &tx_diff, now as u32);
        let tx_inputs = match outcome {
            Ok((inputs, _tracker)) => inputs,
            Err(err) => {
                debug!(tx = ?id, error = %err, "dropping tx during block packing");
                mempool.mark_dropped(id, DropReason::ExecutionFailed(err.to_string()));
                continue;
            }
        };

        if conflicts(&block_inputs, &tx_inputs) || ancestor_conflicts.conflicts_with_ancestors(&parent_id, &tx_inputs) {
            warn!(tx = ?id, "tx conflicts with block or ancestor inputs, dropping");
            mempool.mark_dropped(id, DropReason::ConflictingBlockTxs);
            continue;
        }

        tx_diff.apply(&block_diff)?;
        block_inputs.extend(tx_inputs);
        remaining -= size;
        block_txs.push((*candidate).clone());
    }

    if block_txs.is_empty() {
        return Err(BuilderError::NoPendingBlocks);
    }

    let block = StandardBlock::new(parent_id, next_height, timestamp, block_txs);
    Ok((block, block_inputs))
}
