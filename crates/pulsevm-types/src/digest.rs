use sha2::{Digest, Sha256};

/// A 32-byte SHA-256 digest, used for tx ids, block ids, permission ids, and
/// code hashes.
pub type Digest32 = [u8; 32];

/// The all-zero digest, used as the parent id of a root permission and the
/// `parent_id` of the genesis block.
pub const EMPTY_DIGEST: Digest32 = [0u8; 32];

pub fn sha256(data: &[u8]) -> Digest32 {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}
