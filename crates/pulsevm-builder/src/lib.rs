//! Packs mempool transactions into candidate blocks.
//!
//! [`packing::build_block`] is the synchronous packing algorithm, callable
//! either on demand or from [`timer::BuilderLoop`], which models the
//! always-running timer task that wakes on its own schedule, an external
//! reset, or the mempool's build-now signal.

mod ancestors;
mod error;
mod packing;
mod timer;

pub use ancestors::{AncestorConflicts, NoAncestorConflicts};
pub use error::BuilderError;
pub use packing::{build_block, TARGET_BLOCK_SIZE};
pub use timer::{BuilderLoop, WakeDecision, DEFAULT_SLEEP};

#[cfg(test)]
mod tests {
    use super::*;
    use pulsevm_codec::Marshal;
    use pulsevm_executor::NewAccountData;
    use pulsevm_mempool::Mempool;
    use pulsevm_state::{CacheSizes, Chain, MemoryStore, ReadOnlyChain, State};
    use pulsevm_types::{
        Account, Authority, BaseTx, KeyWeight, Name, Permission, PermissionLevel, StandardBlock, Tx, UnsignedTx,
    };
    use secp256k1::{Message, PublicKey, SecretKey, SECP256K1};
    use sha2::{Digest, Sha256};
    use std::sync::Arc;

    fn new_state() -> State {
        State::new(Arc::new(MemoryStore::new()), CacheSizes::default())
    }

    fn seed_pulse_account(state: &State, key: [u8; 33]) {
        let pulse = Name::from_str_lossy("pulse");
        let account = Account::new(pulse, 0);
        state.modify_account(account).unwrap();

        let authority = Authority {
            threshold: 1,
            keys: vec![KeyWeight { key, weight: 1 }],
            accounts: vec![],
        };
        let owner = Permission::new(pulse, Name::from_str_lossy("owner"), pulsevm_types::EMPTY_DIGEST, authority.clone(), 0);
        let owner_id = Permission::id(pulse, Name::from_str_lossy("owner"));
        let active = Permission::new(pulse, Name::from_str_lossy("active"), owner_id, authority, 0);
        state.add_permission(owner).unwrap();
        state.add_permission(active).unwrap();
        state.commit_batch().unwrap();
    }

    fn sign(secret: &SecretKey, unsigned: &[u8]) -> [u8; 65] {
        let hash: [u8; 32] = Sha256::digest(unsigned).into();
        let message = Message::from_digest(hash);
        let recoverable = SECP256K1.sign_ecdsa_recoverable(&message, secret);
        let (recid, compact) = recoverable.serialize_compact();
        let mut out = [0u8; 65];
        out[..64].copy_from_slice(&compact);
        out[64] = recid.to_i32() as u8;
        out
    }

    fn newaccount_tx(secret: &SecretKey, pubkey: [u8; 33], new_name: Name) -> Tx {
        newaccount_tx_seeded(secret, pubkey, new_name, 0)
    }

    fn newaccount_tx_seeded(secret: &SecretKey, pubkey: [u8; 33], new_name: Name, seed: u8) -> Tx {
        let pulse = Name::from_str_lossy("pulse");
        let authority = Authority {
            threshold: 1,
            keys: vec![KeyWeight { key: pubkey, weight: 1 }],
            accounts: vec![],
        };
        let data = NewAccountData {
            creator: pulse,
            name: new_name,
            owner: authority.clone(),
            active: authority,
        }
        .marshal_to_vec()
        .unwrap();
        let action = pulsevm_types::Action {
            account: pulse,
            name: Name::from_str_lossy("newaccount"),
            data,
            authorization: vec![PermissionLevel { actor: pulse, permission: Name::from_str_lossy("active") }],
        };
        let base = BaseTx { network_id: 1, blockchain_id: [seed; 32], actions: vec![action] };
        let unsigned = UnsignedTx::Base(base);
        let unsigned_bytes = unsigned.marshal_unsigned().unwrap();
        let sig = sign(secret, &unsigned_bytes);
        Tx::new(unsigned, vec![sig])
    }

    #[test]
    fn packs_a_valid_tx_into_a_block() {
        let state = new_state();
        let mut buf = [0u8; 32];
        buf[0] = 1;
        buf[31] = 5;
        let secret = SecretKey::from_slice(&buf).unwrap();
        let pubkey = PublicKey::from_secret_key(SECP256K1, &secret).serialize();
        seed_pulse_account(&state, pubkey);

        let (mempool, _rx) = Mempool::new();
        let tx = newaccount_tx(&secret, pubkey, Name::from_str_lossy("glenn"));
        mempool.add(tx).unwrap();

        let genesis = StandardBlock::new(pulsevm_types::EMPTY_DIGEST, 0, 0, vec![]);
        let genesis_id = genesis.id().unwrap();

        let (block, inputs) = build_block(&state, &genesis, genesis_id, &mempool, &NoAncestorConflicts, 1_700_000_000).unwrap();

        assert_eq!(block.height, 1);
        assert_eq!(block.txs.len(), 1);
        assert_eq!(inputs.len(), 2);
        assert_eq!(mempool.len(), 0);
    }

    #[test]
    fn empty_mempool_fails_with_no_pending_blocks() {
        let state = new_state();
        let (mempool, _rx) = Mempool::new();
        let genesis = StandardBlock::new(pulsevm_types::EMPTY_DIGEST, 0, 0, vec![]);
        let genesis_id = genesis.id().unwrap();

        let err = build_block(&state, &genesis, genesis_id, &mempool, &NoAncestorConflicts, 1).unwrap_err();
        assert!(matches!(err, BuilderError::NoPendingBlocks));
    }

    #[test]
    fn conflicting_txs_in_the_same_block_drop_the_second() {
        let state = new_state();
        let mut buf = [0u8; 32];
        buf[0] = 1;
        buf[31] = 7;
        let secret = SecretKey::from_slice(&buf).unwrap();
        let pubkey = PublicKey::from_secret_key(SECP256K1, &secret).serialize();
        seed_pulse_account(&state, pubkey);

        let (mempool, _rx) = Mempool::new();
        let name = Name::from_str_lossy("glenn");
        mempool.add(newaccount_tx_seeded(&secret, pubkey, name, 1)).unwrap();
        mempool.add(newaccount_tx_seeded(&secret, pubkey, name, 2)).unwrap();

        let genesis = StandardBlock::new(pulsevm_types::EMPTY_DIGEST, 0, 0, vec![]);
        let genesis_id = genesis.id().unwrap();

        let (block, _inputs) = build_block(&state, &genesis, genesis_id, &mempool, &NoAncestorConflicts, 1).unwrap();
        assert_eq!(block.txs.len(), 1);
    }
}
