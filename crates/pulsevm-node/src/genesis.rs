//! Writes the genesis block and seeds the privileged `pulse` account, once.
//!
//! Guarded by [`pulsevm_state::State::is_initialized`]: every later boot
//! sees the flag already set and skips straight past this.

use pulsevm_state::{Chain, State, StateError};
use pulsevm_types::{Account, Name, Permission, StandardBlock};
use tracing::info;

use crate::collaborators::{seed_authority, GenesisParams, GenesisSource};

/// The seed account's two required permissions. `owner` is root (no
/// parent); `active` delegates from it, matching every other account's
/// permission pair.
fn seed_permissions(account: Name, key: [u8; 33], now: u32) -> (Permission, Permission) {
    let authority = seed_authority(key);
    let owner_name = Name::from_str_lossy("owner");
    let active_name = Name::from_str_lossy("active");
    let owner = Permission::new(account, owner_name, pulsevm_types::EMPTY_DIGEST, authority.clone(), now);
    let owner_id = Permission::id(account, owner_name);
    let active = Permission::new(account, active_name, owner_id, authority, now);
    (owner, active)
}

/// Applies genesis if `state` is fresh: a height-0, parentless block, and a
/// privileged seed account with owner/active permissions over `params.key`.
/// A no-op (besides logging) if genesis already ran.
pub fn apply_if_fresh(state: &State, source: &dyn GenesisSource) -> Result<(), StateError> {
    if state.is_initialized()? {
        info!("existing state found, skipping genesis");
        return Ok(());
    }

    let GenesisParams { account, key, timestamp } = source.load();
    info!(%account, timestamp, "fresh state, applying genesis");

    let mut seed = Account::new(account, timestamp);
    seed.privileged = true;
    state.modify_account(seed)?;

    let (owner, active) = seed_permissions(account, key, timestamp as u32);
    state.add_permission(owner)?;
    state.add_permission(active)?;

    let genesis_block = StandardBlock::new(pulsevm_types::EMPTY_DIGEST, 0, timestamp, vec![]);
    let genesis_id = genesis_block
        .id()
        .map_err(|e| StateError::Corrupt { key: b"genesis".to_vec(), source: e })?;
    state.set_block_id_at(0, genesis_id)?;
    state.add_block(genesis_block)?;
    state.set_last_accepted(genesis_id)?;
    state.set_timestamp(timestamp)?;

    state.commit_batch()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::FixedGenesisSource;
    use pulsevm_state::{CacheSizes, MemoryStore, ReadOnlyChain};
    use std::sync::Arc;

    #[test]
    fn first_boot_seeds_privileged_account_and_genesis_block() {
        let state = State::new(Arc::new(MemoryStore::new()), CacheSizes::default());
        let pulse = Name::from_str_lossy("pulse");
        let source = FixedGenesisSource::new(pulse, [3u8; 33], 1_700_000_000);

        apply_if_fresh(&state, &source).unwrap();

        let account = state.get_account(pulse).unwrap().unwrap();
        assert!(account.privileged);

        let owner = state.get_permission(pulse, Name::from_str_lossy("owner")).unwrap();
        assert!(owner.is_some());
        let active = state.get_permission(pulse, Name::from_str_lossy("active")).unwrap();
        assert!(active.is_some());

        let last_accepted = state.get_last_accepted().unwrap();
        assert!(last_accepted.is_some());
        assert_eq!(state.get_block_id_at(0).unwrap(), last_accepted);
    }

    #[test]
    fn second_boot_is_a_no_op() {
        let state = State::new(Arc::new(MemoryStore::new()), CacheSizes::default());
        let pulse = Name::from_str_lossy("pulse");
        let source = FixedGenesisSource::new(pulse, [3u8; 33], 1);

        apply_if_fresh(&state, &source).unwrap();
        let first = state.get_last_accepted().unwrap();

        apply_if_fresh(&state, &source).unwrap();
        let second = state.get_last_accepted().unwrap();
        assert_eq!(first, second);
    }
}
