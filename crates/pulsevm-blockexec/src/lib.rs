//! Tracks blocks between `Verify` and `Accept`/`Reject`, executing their
//! transactions against a view that layers every still-pending ancestor
//! over the committed [`pulsevm_state::State`], and committing accepted
//! blocks atomically.

mod error;
mod layer;
mod manager;

pub use error::BlockExecError;
pub use layer::{Layer, LayeredView, LayerWriter};
pub use manager::{BlockManager, ConsensusBlock, ProcessingState};

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

    fn new_state() -> Arc<State> {
        Arc::new(State::new(Arc::new(MemoryStore::new()), CacheSizes::default()))
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

    fn newaccount_tx(secret: &SecretKey, pubkey: [u8; 33], new_name: Name, seed: u8) -> Tx {
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
    fn verify_then_accept_lands_writes_in_state() {
        let state = new_state();
        let mut buf = [0u8; 32];
        buf[0] = 2;
        buf[31] = 9;
        let secret = SecretKey::from_slice(&buf).unwrap();
        let pubkey = PublicKey::from_secret_key(SECP256K1, &secret).serialize();
        seed_pulse_account(&state, pubkey);

        let mempool = Arc::new(Mempool::new().0);
        let manager = BlockManager::new(state.clone(), mempool).unwrap();

        let glenn = Name::from_str_lossy("glenn");
        let tx = newaccount_tx(&secret, pubkey, glenn, 1);
        let parent = manager.last_accepted();
        let block = StandardBlock::new(parent, 1, 1_700_000_000, vec![tx]);

        let id = manager.verify(block, 0).unwrap();
        assert!(state.get_account(glenn).unwrap().is_none(), "not yet accepted");

        manager.accept(&id).unwrap();
        assert!(state.get_account(glenn).unwrap().is_some());
        assert_eq!(manager.last_accepted(), id);
    }

    #[test]
    fn verify_is_idempotent_across_p_chain_heights() {
        let state = new_state();
        let mut buf = [0u8; 32];
        buf[0] = 2;
        buf[31] = 4;
        let secret = SecretKey::from_slice(&buf).unwrap();
        let pubkey = PublicKey::from_secret_key(SECP256K1, &secret).serialize();
        seed_pulse_account(&state, pubkey);

        let mempool = Arc::new(Mempool::new().0);
        let manager = BlockManager::new(state.clone(), mempool).unwrap();

        let glenn = Name::from_str_lossy("glenn");
        let tx = newaccount_tx(&secret, pubkey, glenn, 2);
        let parent = manager.last_accepted();
        let block = StandardBlock::new(parent, 1, 1, vec![tx]);
        let id = block.id().unwrap();

        manager.verify(block.clone(), 10).unwrap();
        manager.verify(block, 11).unwrap();

        manager.accept(&id).unwrap();
    }

    #[test]
    fn reject_discards_without_touching_state() {
        let state = new_state();
        let mut buf = [0u8; 32];
        buf[0] = 2;
        buf[31] = 6;
        let secret = SecretKey::from_slice(&buf).unwrap();
        let pubkey = PublicKey::from_secret_key(SECP256K1, &secret).serialize();
        seed_pulse_account(&state, pubkey);

        let mempool = Arc::new(Mempool::new().0);
        let manager = BlockManager::new(state.clone(), mempool).unwrap();

        let glenn = Name::from_str_lossy("glenn");
        let tx = newaccount_tx(&secret, pubkey, glenn, 3);
        let parent = manager.last_accepted();
        let block = StandardBlock::new(parent, 1, 1, vec![tx]);
        let id = manager.verify(block, 0).unwrap();

        manager.reject(&id).unwrap();
        assert!(state.get_account(glenn).unwrap().is_none());
        assert_ne!(manager.last_accepted(), id);
    }
}
