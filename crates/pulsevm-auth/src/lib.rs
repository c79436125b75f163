//! Signature recovery and the weighted-threshold permission graph walk that
//! decides whether a transaction's signatures satisfy a declared authorizer.
//!
//! [`checker::AuthorityChecker`] recovers every signer's address once at
//! construction time, then answers `satisfies_permission_level` queries by
//! walking `Authority.keys`/`Authority.accounts` against a [`pulsevm_state::ReadOnlyChain`],
//! bounding recursion so a cyclic or excessively deep permission graph fails
//! closed instead of looping.

mod checker;
mod error;

pub use checker::{Address, AuthorityChecker, MAX_PERMISSION_DEPTH};
pub use error::AuthError;

#[cfg(test)]
mod tests {
    use super::*;
    use pulsevm_state::{CacheSizes, Chain, MemoryStore, State};
    use pulsevm_types::{Authority, KeyWeight, Name, Permission, PermissionLevel, PermissionLevelWeight};
    use secp256k1::{Message, PublicKey, SecretKey, SECP256K1};
    use sha2::{Digest, Sha256};
    use std::sync::Arc;

    struct Signer {
        secret: SecretKey,
        compressed_pubkey: [u8; 33],
    }

    impl Signer {
        fn new(byte: u8) -> Self {
            let mut buf = [0u8; 32];
            buf[31] = byte;
            buf[0] = 1; // keep it nonzero/in-range across every `byte` value used in tests
            let secret = SecretKey::from_slice(&buf).unwrap();
            let pubkey = PublicKey::from_secret_key(SECP256K1, &secret);
            Signer {
                secret,
                compressed_pubkey: pubkey.serialize(),
            }
        }

        fn sign(&self, unsigned_bytes: &[u8]) -> [u8; 65] {
            let hash: [u8; 32] = Sha256::digest(unsigned_bytes).into();
            let message = Message::from_digest(hash);
            let recoverable = SECP256K1.sign_ecdsa_recoverable(&message, &self.secret);
            let (recid, compact) = recoverable.serialize_compact();
            let mut out = [0u8; 65];
            out[..64].copy_from_slice(&compact);
            out[64] = recid.to_i32() as u8;
            out
        }
    }

    fn new_state() -> State {
        State::new(Arc::new(MemoryStore::new()), CacheSizes::default())
    }

    fn install_permission(state: &State, owner: Name, name: Name, authority: Authority) {
        let perm = Permission::new(owner, name, pulsevm_types::EMPTY_DIGEST, authority, 0);
        state.add_permission(perm).unwrap();
        state.commit_batch().unwrap();
    }

    #[test]
    fn key_level_satisfaction() {
        let state = new_state();
        let k = Signer::new(1);
        let pulse = Name::from_str_lossy("pulse");
        let active = Name::from_str_lossy("active");
        install_permission(
            &state,
            pulse,
            active,
            Authority {
                threshold: 1,
                keys: vec![KeyWeight { key: k.compressed_pubkey, weight: 1 }],
                accounts: vec![],
            },
        );

        let unsigned = b"unsigned-tx-bytes".to_vec();
        let sig = k.sign(&unsigned);
        let checker = AuthorityChecker::new(&unsigned, &[sig], &state).unwrap();
        checker
            .satisfies_permission_level(PermissionLevel { actor: pulse, permission: active })
            .unwrap();
    }

    #[test]
    fn key_level_rejects_wrong_signer() {
        let state = new_state();
        let k = Signer::new(1);
        let other = Signer::new(2);
        let pulse = Name::from_str_lossy("pulse");
        let active = Name::from_str_lossy("active");
        install_permission(
            &state,
            pulse,
            active,
            Authority {
                threshold: 1,
                keys: vec![KeyWeight { key: k.compressed_pubkey, weight: 1 }],
                accounts: vec![],
            },
        );

        let unsigned = b"unsigned-tx-bytes".to_vec();
        let sig = other.sign(&unsigned);
        let checker = AuthorityChecker::new(&unsigned, &[sig], &state).unwrap();
        assert!(checker
            .satisfies_permission_level(PermissionLevel { actor: pulse, permission: active })
            .is_err());
    }

    #[test]
    fn account_level_satisfaction_two_hop() {
        let state = new_state();
        let k = Signer::new(1);
        let pulse = Name::from_str_lossy("pulse");
        let active = Name::from_str_lossy("active");
        let secondary = Name::from_str_lossy("secondary");

        install_permission(
            &state,
            pulse,
            active,
            Authority {
                threshold: 1,
                keys: vec![KeyWeight { key: k.compressed_pubkey, weight: 1 }],
                accounts: vec![],
            },
        );
        install_permission(
            &state,
            pulse,
            secondary,
            Authority {
                threshold: 1,
                keys: vec![],
                accounts: vec![PermissionLevelWeight {
                    permission: PermissionLevel { actor: pulse, permission: active },
                    weight: 1,
                }],
            },
        );

        let unsigned = b"unsigned-tx-bytes".to_vec();
        let sig = k.sign(&unsigned);
        let checker = AuthorityChecker::new(&unsigned, &[sig], &state).unwrap();
        checker
            .satisfies_permission_level(PermissionLevel { actor: pulse, permission: secondary })
            .unwrap();
    }

    #[test]
    fn missing_permission_fails() {
        let state = new_state();
        let unsigned = b"x".to_vec();
        let checker = AuthorityChecker::new(&unsigned, &[], &state).unwrap();
        let err = checker
            .satisfies_permission_level(PermissionLevel {
                actor: Name::from_str_lossy("nobody"),
                permission: Name::from_str_lossy("active"),
            })
            .unwrap_err();
        assert!(matches!(err, AuthError::PermissionNotFound { .. }));
    }

    #[test]
    fn self_referential_accounts_link_fails_by_depth_bound() {
        let state = new_state();
        let pulse = Name::from_str_lossy("pulse");
        let a = Name::from_str_lossy("a");
        let b = Name::from_str_lossy("b");
        // a delegates to b, b delegates to a: a cycle with no keys anywhere.
        install_permission(
            &state,
            pulse,
            a,
            Authority {
                threshold: 1,
                keys: vec![],
                accounts: vec![PermissionLevelWeight {
                    permission: PermissionLevel { actor: pulse, permission: b },
                    weight: 1,
                }],
            },
        );
        install_permission(
            &state,
            pulse,
            b,
            Authority {
                threshold: 1,
                keys: vec![],
                accounts: vec![PermissionLevelWeight {
                    permission: PermissionLevel { actor: pulse, permission: a },
                    weight: 1,
                }],
            },
        );

        let unsigned = b"x".to_vec();
        let checker = AuthorityChecker::new(&unsigned, &[], &state).unwrap();
        let err = checker
            .satisfies_permission_level(PermissionLevel { actor: pulse, permission: a })
            .unwrap_err();
        assert!(matches!(
            err,
            AuthError::RecursionDepthExceeded { .. } | AuthError::NotSatisfied { .. }
        ));
    }
}
