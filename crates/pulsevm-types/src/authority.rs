use pulsevm_codec::{CodecError, Marshal, Packer, Unmarshal, Unpacker};
use serde::{Deserialize, Serialize};

use crate::error::TypesError;
use crate::name::Name;

/// A 33-byte compressed secp256k1 public key with a relative signing weight.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct KeyWeight {
    pub key: [u8; 33],
    pub weight: u16,
}

impl Marshal for KeyWeight {
    fn marshal(&self, packer: &mut Packer) -> Result<(), CodecError> {
        packer.pack_fixed(&self.key)?;
        packer.pack_u16(self.weight)
    }
}

impl Unmarshal for KeyWeight {
    fn unmarshal(unpacker: &mut Unpacker) -> Result<Self, CodecError> {
        Ok(KeyWeight {
            key: unpacker.unpack_fixed()?,
            weight: unpacker.unpack_u16()?,
        })
    }
}

/// A node in the permission graph: a specific permission owned by an actor.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct PermissionLevel {
    pub actor: Name,
    pub permission: Name,
}

impl Marshal for PermissionLevel {
    fn marshal(&self, packer: &mut Packer) -> Result<(), CodecError> {
        self.actor.marshal(packer)?;
        self.permission.marshal(packer)
    }
}

impl Unmarshal for PermissionLevel {
    fn unmarshal(unpacker: &mut Unpacker) -> Result<Self, CodecError> {
        Ok(PermissionLevel {
            actor: Name::unmarshal(unpacker)?,
            permission: Name::unmarshal(unpacker)?,
        })
    }
}

/// A delegated permission level with a relative signing weight.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct PermissionLevelWeight {
    pub permission: PermissionLevel,
    pub weight: u16,
}

impl Marshal for PermissionLevelWeight {
    fn marshal(&self, packer: &mut Packer) -> Result<(), CodecError> {
        self.permission.marshal(packer)?;
        packer.pack_u16(self.weight)
    }
}

impl Unmarshal for PermissionLevelWeight {
    fn unmarshal(unpacker: &mut Unpacker) -> Result<Self, CodecError> {
        Ok(PermissionLevelWeight {
            permission: PermissionLevel::unmarshal(unpacker)?,
            weight: unpacker.unpack_u16()?,
        })
    }
}

/// A weighted threshold policy over public keys and delegated permission
/// levels.
///
/// `validate()` enforces the three invariants every `Authority` must satisfy
/// before it can be attached to a permission: a positive threshold, at least
/// one key or account, and enough total weight to ever be satisfiable.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Authority {
    pub threshold: u32,
    pub keys: Vec<KeyWeight>,
    pub accounts: Vec<PermissionLevelWeight>,
}

impl Authority {
    pub fn validate(&self) -> Result<(), TypesError> {
        if self.threshold == 0 {
            return Err(TypesError::ZeroThreshold);
        }
        if self.keys.is_empty() && self.accounts.is_empty() {
            return Err(TypesError::EmptyAuthority);
        }
        let sum: u64 = self.keys.iter().map(|k| k.weight as u64).sum::<u64>()
            + self
                .accounts
                .iter()
                .map(|a| a.weight as u64)
                .sum::<u64>();
        if sum < self.threshold as u64 {
            return Err(TypesError::InsufficientWeight {
                sum,
                threshold: self.threshold as u64,
            });
        }
        Ok(())
    }
}

impl Marshal for Authority {
    fn marshal(&self, packer: &mut Packer) -> Result<(), CodecError> {
        packer.pack_u32(self.threshold)?;
        packer.pack_u32(self.keys.len() as u32)?;
        for k in &self.keys {
            k.marshal(packer)?;
        }
        packer.pack_u32(self.accounts.len() as u32)?;
        for a in &self.accounts {
            a.marshal(packer)?;
        }
        Ok(())
    }
}

impl Unmarshal for Authority {
    fn unmarshal(unpacker: &mut Unpacker) -> Result<Self, CodecError> {
        let threshold = unpacker.unpack_u32()?;
        let num_keys = unpacker.unpack_u32()?;
        let mut keys = Vec::with_capacity(num_keys as usize);
        for _ in 0..num_keys {
            keys.push(KeyWeight::unmarshal(unpacker)?);
        }
        let num_accounts = unpacker.unpack_u32()?;
        let mut accounts = Vec::with_capacity(num_accounts as usize);
        for _ in 0..num_accounts {
            accounts.push(PermissionLevelWeight::unmarshal(unpacker)?);
        }
        Ok(Authority {
            threshold,
            keys,
            accounts,
        })
    }
}
