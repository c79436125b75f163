use pulsevm_codec::{CodecError, Marshal, Packer, Unmarshal, Unpacker};
use serde::{Deserialize, Serialize};

use crate::authority::Authority;
use crate::digest::{sha256, Digest32, EMPTY_DIGEST};
use crate::name::Name;

/// A named authority attached to an account, optionally delegating from a
/// parent permission.
///
/// `id` is derived deterministically from `owner` and `name` rather than
/// stored as free-standing state, so two permissions with the same owner and
/// name always collide on the same id regardless of when they were created.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Permission {
    pub owner: Name,
    pub name: Name,
    pub parent_id: Digest32,
    pub last_updated: u32,
    pub last_used: u32,
    pub authority: Authority,
}

impl Permission {
    /// Builds a freshly created permission with `last_updated` set to the
    /// creation time and `last_used` at zero (never yet exercised by an
    /// authority check).
    pub fn new(owner: Name, name: Name, parent_id: Digest32, authority: Authority, now: u32) -> Self {
        Permission {
            owner,
            name,
            parent_id,
            last_updated: now,
            last_used: 0,
            authority,
        }
    }

    pub fn id(owner: Name, name: Name) -> Digest32 {
        let mut buf = Vec::with_capacity(16);
        buf.extend_from_slice(&owner.bytes());
        buf.extend_from_slice(&name.bytes());
        sha256(&buf)
    }

    pub fn is_root(&self) -> bool {
        self.parent_id == EMPTY_DIGEST
    }
}

impl Marshal for Permission {
    fn marshal(&self, packer: &mut Packer) -> Result<(), CodecError> {
        self.owner.marshal(packer)?;
        self.name.marshal(packer)?;
        packer.pack_fixed(&self.parent_id)?;
        packer.pack_u32(self.last_updated)?;
        packer.pack_u32(self.last_used)?;
        self.authority.marshal(packer)
    }
}

impl Unmarshal for Permission {
    fn unmarshal(unpacker: &mut Unpacker) -> Result<Self, CodecError> {
        Ok(Permission {
            owner: Name::unmarshal(unpacker)?,
            name: Name::unmarshal(unpacker)?,
            parent_id: unpacker.unpack_fixed()?,
            last_updated: unpacker.unpack_u32()?,
            last_used: unpacker.unpack_u32()?,
            authority: Authority::unmarshal(unpacker)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::KeyWeight;

    #[test]
    fn id_depends_on_owner_and_name_only() {
        let owner = Name::from_str_lossy("pulse");
        let a = Permission::id(owner, Name::from_str_lossy("active"));
        let b = Permission::id(owner, Name::from_str_lossy("owner"));
        assert_ne!(a, b);
        assert_eq!(a, Permission::id(owner, Name::from_str_lossy("active")));
    }

    #[test]
    fn root_permission_has_empty_parent() {
        let p = Permission::new(
            Name::from_str_lossy("pulse"),
            Name::from_str_lossy("owner"),
            EMPTY_DIGEST,
            Authority {
                threshold: 1,
                keys: vec![KeyWeight { key: [0u8; 33], weight: 1 }],
                accounts: vec![],
            },
            0,
        );
        assert!(p.is_root());
    }
}
