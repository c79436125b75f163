use pulsevm_codec::{CodecError, Marshal, Packer, Unmarshal, Unpacker};
use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::digest::{sha256, Digest32};

/// A recoverable secp256k1 signature: 64 bytes of `(r, s)` plus a one-byte
/// recovery id, stored together so the signer's public key can be recovered
/// without a separate lookup.
pub type Signature = [u8; 65];

/// The only transaction body this chain defines today: a network/chain
/// binding and an ordered list of actions to execute.
///
/// `UnsignedTx` exists as a tagged union of one variant so new transaction
/// kinds can be added by extending the match in `marshal`/`unmarshal`
/// without breaking the wire format of existing ones.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct BaseTx {
    pub network_id: u32,
    pub blockchain_id: Digest32,
    pub actions: Vec<Action>,
}

impl Marshal for BaseTx {
    fn marshal(&self, packer: &mut Packer) -> Result<(), CodecError> {
        packer.pack_u32(self.network_id)?;
        packer.pack_fixed(&self.blockchain_id)?;
        packer.pack_u32(self.actions.len() as u32)?;
        for action in &self.actions {
            action.marshal(packer)?;
        }
        Ok(())
    }
}

impl Unmarshal for BaseTx {
    fn unmarshal(unpacker: &mut Unpacker) -> Result<Self, CodecError> {
        let network_id = unpacker.unpack_u32()?;
        let blockchain_id = unpacker.unpack_fixed()?;
        let num_actions = unpacker.unpack_u32()?;
        let mut actions = Vec::with_capacity(num_actions as usize);
        for _ in 0..num_actions {
            actions.push(Action::unmarshal(unpacker)?);
        }
        Ok(BaseTx {
            network_id,
            blockchain_id,
            actions,
        })
    }
}

pub const BASE_TX_TYPE_ID: u16 = 0;

/// The tagged union of transaction bodies. Today this has exactly one
/// variant; unknown type ids round-trip as [`pulsevm_codec::CodecError::UnknownTxType`]
/// rather than panicking, so a future type id introduced by a newer binary
/// fails closed on an older one.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum UnsignedTx {
    Base(BaseTx),
}

impl UnsignedTx {
    pub fn type_id(&self) -> u16 {
        match self {
            UnsignedTx::Base(_) => BASE_TX_TYPE_ID,
        }
    }

    pub fn actions(&self) -> &[Action] {
        match self {
            UnsignedTx::Base(tx) => &tx.actions,
        }
    }

    pub fn network_id(&self) -> u32 {
        match self {
            UnsignedTx::Base(tx) => tx.network_id,
        }
    }

    pub fn blockchain_id(&self) -> Digest32 {
        match self {
            UnsignedTx::Base(tx) => tx.blockchain_id,
        }
    }

    fn marshal_body(&self, packer: &mut Packer) -> Result<(), CodecError> {
        match self {
            UnsignedTx::Base(tx) => tx.marshal(packer),
        }
    }

    fn unmarshal_body(type_id: u16, unpacker: &mut Unpacker) -> Result<Self, CodecError> {
        match type_id {
            BASE_TX_TYPE_ID => Ok(UnsignedTx::Base(BaseTx::unmarshal(unpacker)?)),
            other => Err(CodecError::UnknownTxType(other)),
        }
    }

    /// `type_id ++ body`, the exact bytes that are signed and later
    /// recovered against in the authority checker.
    pub fn marshal_unsigned(&self) -> Result<Vec<u8>, CodecError> {
        let mut packer = Packer::new();
        packer.pack_u16(self.type_id())?;
        self.marshal_body(&mut packer)?;
        Ok(packer.into_bytes())
    }
}

/// A transaction together with the signatures authorizing it.
///
/// `id` is computed from the full signed-tx wire bytes: `type_id ++ body ++
/// num_signatures ++ signatures`, matching the bytes actually placed on the
/// wire and signed over by every participant.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Tx {
    pub unsigned: UnsignedTx,
    pub signatures: Vec<Signature>,
}

impl Tx {
    pub fn new(unsigned: UnsignedTx, signatures: Vec<Signature>) -> Self {
        Tx { unsigned, signatures }
    }

    /// The bytes an [`crate::authority`] checker recovers signer public keys
    /// against: `type_id ++ body`, without the signatures themselves.
    pub fn unsigned_bytes(&self) -> Result<Vec<u8>, CodecError> {
        self.unsigned.marshal_unsigned()
    }

    pub fn id(&self) -> Result<Digest32, CodecError> {
        Ok(sha256(&self.marshal_to_vec()?))
    }
}

impl Marshal for Tx {
    fn marshal(&self, packer: &mut Packer) -> Result<(), CodecError> {
        packer.pack_u16(self.unsigned.type_id())?;
        self.unsigned.marshal_body(packer)?;
        packer.pack_u32(self.signatures.len() as u32)?;
        for sig in &self.signatures {
            packer.pack_fixed(sig)?;
        }
        Ok(())
    }
}

impl Unmarshal for Tx {
    fn unmarshal(unpacker: &mut Unpacker) -> Result<Self, CodecError> {
        let type_id = unpacker.unpack_u16()?;
        let unsigned = UnsignedTx::unmarshal_body(type_id, unpacker)?;
        let num_sigs = unpacker.unpack_u32()?;
        let mut signatures = Vec::with_capacity(num_sigs as usize);
        for _ in 0..num_sigs {
            signatures.push(unpacker.unpack_fixed()?);
        }
        Ok(Tx { unsigned, signatures })
    }
}
