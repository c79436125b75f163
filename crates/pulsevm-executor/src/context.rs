use pulsevm_auth::AuthorityChecker;
use pulsevm_codec::Marshal;
use pulsevm_state::Chain;
use pulsevm_types::Tx;

use crate::error::ExecutorError;
use crate::handlers::{native_handler, pulse_account};
use crate::inputs::TxInputs;
use crate::resources::ResourceTracker;

/// Executes one transaction against `chain` (typically a fresh [`pulsevm_state::Diff`]
/// layered over the block-in-progress state): checks every declared
/// authorization, bills the first authorizer for network usage, then
/// dispatches each action to its native handler in order.
///
/// Any failure aborts the whole transaction with no partial effects — the
/// caller is expected to discard the diff it passed in rather than apply it.
/// Returns the set of chain entities the transaction mutated (its "inputs",
/// used by the builder and block manager to detect conflicting
/// transactions) together with the resource deltas it accumulated.
pub fn execute_standard(tx: &Tx, chain: &dyn Chain, now: u32) -> Result<(TxInputs, ResourceTracker), ExecutorError> {
    let unsigned_bytes = tx.unsigned_bytes()?;
    let checker = AuthorityChecker::new(&unsigned_bytes, &tx.signatures, chain)?;

    for action in tx.unsigned.actions() {
        for level in &action.authorization {
            checker.satisfies_permission_level(*level)?;
        }
    }

    let tracker = ResourceTracker::new();
    let first_authorizer = tx
        .unsigned
        .actions()
        .first()
        .and_then(|action| action.authorization.first())
        .map(|level| level.actor)
        .ok_or(ExecutorError::NoAuthorizer)?;
    let signed_len = tx.marshal_to_vec()?.len() as i64;
    tracker.add_net(first_authorizer, signed_len);

    let pulse = pulse_account();
    let mut inputs = TxInputs::new();
    for action in tx.unsigned.actions() {
        if action.account != pulse {
            continue;
        }
        if let Some(handler) = native_handler(action.name) {
            let action_inputs = handler(chain, &action.authorization, &action.data, &tracker, now)?;
            inputs.extend(action_inputs);
        }
    }

    Ok((inputs, tracker))
}
