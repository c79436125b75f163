use std::collections::HashSet;

use pulsevm_types::Name;

/// One chain entity a transaction mutates. The builder and block manager use
/// the set of a tx's inputs to detect conflicting transactions within the
/// same block: two txs that touch the same account can't both be safely
/// applied to the same parent state, since whichever runs second would see
/// effects the first already produced.
///
/// Only `Account` exists today because every native handler's mutations are
/// scoped to an account record (and the permissions/code hanging off it);
/// if a future handler mutates some other addressable entity, add a variant
/// here rather than overloading `Account`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Input {
    Account(Name),
}

pub type TxInputs = HashSet<Input>;

pub fn conflicts(a: &TxInputs, b: &TxInputs) -> bool {
    !a.is_disjoint(b)
}
