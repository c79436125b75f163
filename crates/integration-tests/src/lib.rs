//! End-to-end exercise of the execution core: a transaction is submitted to
//! the mempool, packed into a block by the builder, verified and accepted
//! by the block manager, and its effects are checked against persisted
//! state — the same path a consensus engine drives in production, run here
//! against an in-memory `KeyValueStore` with no networking involved.

#![cfg(test)]

use std::sync::Arc;

use pulsevm_blockexec::BlockManager;
use pulsevm_builder::{build_block, NoAncestorConflicts};
use pulsevm_codec::Marshal;
use pulsevm_executor::{NewAccountData, SetCodeData};
use pulsevm_mempool::Mempool;
use pulsevm_state::{CacheSizes, Chain, MemoryStore, ReadOnlyChain, State};
use pulsevm_types::{
    Account, Action, Authority, BaseTx, KeyWeight, Name, Permission, PermissionLevel, StandardBlock, Tx, UnsignedTx,
};
use secp256k1::{Message, PublicKey, SecretKey, SECP256K1};
use sha2::{Digest, Sha256};

fn new_state() -> Arc<State> {
    Arc::new(State::new(Arc::new(MemoryStore::new()), CacheSizes::default()))
}

fn seed_pulse_account(state: &State, key: [u8; 33]) {
    let pulse = Name::from_str_lossy("pulse");
    let mut account = Account::new(pulse, 0);
    account.privileged = true;
    state.modify_account(account).unwrap();

    let authority = Authority { threshold: 1, keys: vec![KeyWeight { key, weight: 1 }], accounts: vec![] };
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

fn signed_tx(secret: &SecretKey, actor: Name, account: Name, name: Name, data: Vec<u8>, seed: u8) -> Tx {
    let action = Action { account, name, data, authorization: vec![PermissionLevel { actor, permission: Name::from_str_lossy("active") }] };
    let base = BaseTx { network_id: 1, blockchain_id: [seed; 32], actions: vec![action] };
    let unsigned = UnsignedTx::Base(base);
    let unsigned_bytes = unsigned.marshal_unsigned().unwrap();
    let sig = sign(secret, &unsigned_bytes);
    Tx::new(unsigned, vec![sig])
}

/// Submits a `newaccount` transaction, builds a block from it, verifies and
/// accepts that block, and checks the new account landed in state and left
/// the mempool.
#[tokio::test]
async fn newaccount_flows_from_mempool_to_accepted_state() {
    let state = new_state();
    let mut buf = [0u8; 32];
    buf[0] = 1;
    buf[31] = 1;
    let secret = SecretKey::from_slice(&buf).unwrap();
    let pubkey = PublicKey::from_secret_key(SECP256K1, &secret).serialize();
    seed_pulse_account(&state, pubkey);

    let pulse = Name::from_str_lossy("pulse");
    let glenn = Name::from_str_lossy("glenn");
    let authority = Authority { threshold: 1, keys: vec![KeyWeight { key: pubkey, weight: 1 }], accounts: vec![] };
    let data = NewAccountData { creator: pulse, name: glenn, owner: authority.clone(), active: authority }
        .marshal_to_vec()
        .unwrap();
    let tx = signed_tx(&secret, pulse, pulse, Name::from_str_lossy("newaccount"), data, 11);

    let (mempool, _build_signal_rx) = Mempool::new();
    let mempool = Arc::new(mempool);
    mempool.add(tx).unwrap();
    assert_eq!(mempool.len(), 1);

    let manager = BlockManager::new(state.clone(), mempool.clone()).unwrap();
    let genesis_id = manager.last_accepted();
    let genesis = StandardBlock::new(pulsevm_types::EMPTY_DIGEST, 0, 0, vec![]);

    let (block, inputs) = build_block(state.as_ref(), &genesis, genesis_id, &mempool, &NoAncestorConflicts, 1_700_000_000).unwrap();
    assert_eq!(mempool.len(), 0, "packed transaction leaves the mempool");
    assert!(!inputs.is_empty());

    let block_id = manager.verify(block, 0).unwrap();
    assert!(state.get_account(glenn).unwrap().is_none(), "not visible before accept");

    manager.accept(&block_id).unwrap();
    assert!(state.get_account(glenn).unwrap().is_some());
    assert_eq!(manager.last_accepted(), block_id);
}

/// A second `setcode` transaction against the account created in the prior
/// block succeeds once that block has actually landed in persistent state.
#[tokio::test]
async fn setcode_succeeds_against_a_previously_accepted_account() {
    let state = new_state();
    let mut buf = [0u8; 32];
    buf[0] = 1;
    buf[31] = 2;
    let secret = SecretKey::from_slice(&buf).unwrap();
    let pubkey = PublicKey::from_secret_key(SECP256K1, &secret).serialize();
    seed_pulse_account(&state, pubkey);

    let pulse = Name::from_str_lossy("pulse");
    let glenn = Name::from_str_lossy("glenn");
    let authority = Authority { threshold: 1, keys: vec![KeyWeight { key: pubkey, weight: 1 }], accounts: vec![] };

    let (mempool, _rx) = Mempool::new();
    let mempool = Arc::new(mempool);
    let manager = BlockManager::new(state.clone(), mempool.clone()).unwrap();

    // Block 1: create glenn.
    let data = NewAccountData { creator: pulse, name: glenn, owner: authority.clone(), active: authority.clone() }
        .marshal_to_vec()
        .unwrap();
    let tx1 = signed_tx(&secret, pulse, pulse, Name::from_str_lossy("newaccount"), data, 21);
    mempool.add(tx1).unwrap();
    let genesis = StandardBlock::new(pulsevm_types::EMPTY_DIGEST, 0, 0, vec![]);
    let (block1, _) = build_block(state.as_ref(), &genesis, manager.last_accepted(), &mempool, &NoAncestorConflicts, 1).unwrap();
    let block1_id = manager.verify(block1, 0).unwrap();
    manager.accept(&block1_id).unwrap();

    // Block 2: glenn's active authority installs code on its own account.
    let code = b"(module)".to_vec();
    let setcode_data = SetCodeData { account: glenn, code }.marshal_to_vec().unwrap();
    let tx2 = signed_tx(&secret, glenn, glenn, Name::from_str_lossy("setcode"), setcode_data, 22);
    mempool.add(tx2).unwrap();
    let parent = state.get_block(&block1_id).unwrap().unwrap();
    let (block2, _) = build_block(state.as_ref(), &parent, block1_id, &mempool, &NoAncestorConflicts, 2).unwrap();
    let block2_id = manager.verify(block2, 0).unwrap();
    manager.accept(&block2_id).unwrap();

    let account = state.get_account(glenn).unwrap().unwrap();
    assert!(account.has_code());
}
