use std::cell::RefCell;
use std::collections::HashSet;

use ripemd::Ripemd160;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, SECP256K1};
use sha2::{Digest, Sha256};

use pulsevm_state::ReadOnlyChain;
use pulsevm_types::{PermissionLevel, Tx};

use crate::error::AuthError;

/// Maximum depth of the weighted-threshold walk over `Authority.accounts`
/// delegation edges, bounding both pathological permission graphs and
/// accidental cycles in malformed state.
pub const MAX_PERMISSION_DEPTH: u32 = 10;

/// A 20-byte address derived from a recovered public key:
/// `RIPEMD160(SHA256(compressed_pubkey))`.
pub type Address = [u8; 20];

fn address_of(pubkey_compressed: &[u8; 33]) -> Address {
    let sha = Sha256::digest(pubkey_compressed);
    let ripemd = Ripemd160::digest(sha);
    let mut out = [0u8; 20];
    out.copy_from_slice(&ripemd);
    out
}

/// Parses the trailing recovery-id byte of a 65-byte recoverable signature.
/// Accepts both the raw `0..=3` convention and the Ethereum-style `27/28`
/// offset so signatures produced by either tooling recover correctly.
fn parse_recovery_id(v: u8) -> Result<RecoveryId, String> {
    let id = match v {
        0..=3 => v as i32,
        27..=30 => (v - 27) as i32,
        other => return Err(format!("invalid recovery id byte {other}")),
    };
    RecoveryId::from_i32(id).map_err(|e| e.to_string())
}

fn recover_address(message_hash: &[u8; 32], signature: &[u8; 65]) -> Result<Address, String> {
    let recid = parse_recovery_id(signature[64])?;
    let mut compact = [0u8; 64];
    compact.copy_from_slice(&signature[..64]);
    let sig = RecoverableSignature::from_compact(&compact, recid).map_err(|e| e.to_string())?;
    let message = Message::from_digest(*message_hash);
    let pubkey = SECP256K1
        .recover_ecdsa(&message, &sig)
        .map_err(|e| e.to_string())?;
    Ok(address_of(&pubkey.serialize()))
}

/// Recovers every signing address once at construction, then answers
/// `satisfies_permission_level` queries against a chain view by walking the
/// weighted-threshold permission graph rooted at each declared level.
///
/// Satisfaction is memoized per permission level within the lifetime of one
/// checker, so a permission delegated to from two different actions in the
/// same transaction is only walked once.
pub struct AuthorityChecker<'c, C: ReadOnlyChain + ?Sized> {
    chain: &'c C,
    provided_keys: HashSet<Address>,
    used_keys: RefCell<HashSet<Address>>,
    satisfied: RefCell<HashSet<PermissionLevel>>,
}

impl<'c, C: ReadOnlyChain + ?Sized> AuthorityChecker<'c, C> {
    pub fn new(unsigned_tx_bytes: &[u8], signatures: &[[u8; 65]], chain: &'c C) -> Result<Self, AuthError> {
        let message_hash: [u8; 32] = Sha256::digest(unsigned_tx_bytes).into();
        let mut provided_keys = HashSet::with_capacity(signatures.len());
        for (index, sig) in signatures.iter().enumerate() {
            let address = recover_address(&message_hash, sig)
                .map_err(|reason| AuthError::InvalidSignature { index, reason })?;
            provided_keys.insert(address);
        }
        Ok(AuthorityChecker {
            chain,
            provided_keys,
            used_keys: RefCell::new(HashSet::new()),
            satisfied: RefCell::new(HashSet::new()),
        })
    }

    pub fn for_tx(tx: &Tx, chain: &'c C) -> Result<Self, AuthError> {
        let unsigned = tx.unsigned_bytes()?;
        Self::new(&unsigned, &tx.signatures, chain)
    }

    /// The set of recovered addresses actually used to satisfy some
    /// permission level checked so far.
    pub fn used_keys(&self) -> HashSet<Address> {
        self.used_keys.borrow().clone()
    }

    pub fn satisfies_permission_level(&self, level: PermissionLevel) -> Result<(), AuthError> {
        self.walk(level, 0)
    }

    fn walk(&self, level: PermissionLevel, depth: u32) -> Result<(), AuthError> {
        if depth > MAX_PERMISSION_DEPTH {
            return Err(AuthError::RecursionDepthExceeded {
                owner: level.actor.to_string(),
                permission: level.permission.to_string(),
            });
        }
        if self.satisfied.borrow().contains(&level) {
            return Ok(());
        }

        let perm = self
            .chain
            .get_permission(level.actor, level.permission)?
            .ok_or_else(|| AuthError::PermissionNotFound {
                owner: level.actor.to_string(),
                permission: level.permission.to_string(),
            })?;

        let mut weight: u64 = 0;
        for kw in &perm.authority.keys {
            let key_addr = address_of(&kw.key);
            if self.provided_keys.contains(&key_addr) {
                self.used_keys.borrow_mut().insert(key_addr);
                weight += kw.weight as u64;
            }
        }
        if weight >= perm.authority.threshold as u64 {
            self.satisfied.borrow_mut().insert(level);
            return Ok(());
        }

        for plw in &perm.authority.accounts {
            if self.walk(plw.permission, depth + 1).is_ok() {
                weight += plw.weight as u64;
            }
        }
        if weight >= perm.authority.threshold as u64 {
            self.satisfied.borrow_mut().insert(level);
            return Ok(());
        }

        Err(AuthError::NotSatisfied {
            owner: level.actor.to_string(),
            permission: level.permission.to_string(),
        })
    }
}
