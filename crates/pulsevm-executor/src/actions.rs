use pulsevm_codec::{CodecError, Marshal, Packer, Unmarshal, Unpacker};
use pulsevm_types::{Authority, Name};

/// Payload of a `newaccount` action. The external wire format (§6 of the
/// spec) only pins down the tx/block envelope; each native action's `data`
/// bytes are this core's own concern, so they're packed with the same
/// `Marshal`/`Unmarshal` machinery as every other domain type rather than
/// inventing a second encoding.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct NewAccountData {
    pub creator: Name,
    pub name: Name,
    pub owner: Authority,
    pub active: Authority,
}

impl Marshal for NewAccountData {
    fn marshal(&self, packer: &mut Packer) -> Result<(), CodecError> {
        self.creator.marshal(packer)?;
        self.name.marshal(packer)?;
        self.owner.marshal(packer)?;
        self.active.marshal(packer)
    }
}

impl Unmarshal for NewAccountData {
    fn unmarshal(unpacker: &mut Unpacker) -> Result<Self, CodecError> {
        Ok(NewAccountData {
            creator: Name::unmarshal(unpacker)?,
            name: Name::unmarshal(unpacker)?,
            owner: Authority::unmarshal(unpacker)?,
            active: Authority::unmarshal(unpacker)?,
        })
    }
}

/// Payload of a `setcode` action. Empty `code` clears the account's
/// installed code.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SetCodeData {
    pub account: Name,
    pub code: Vec<u8>,
}

impl Marshal for SetCodeData {
    fn marshal(&self, packer: &mut Packer) -> Result<(), CodecError> {
        self.account.marshal(packer)?;
        packer.pack_bytes(&self.code)
    }
}

impl Unmarshal for SetCodeData {
    fn unmarshal(unpacker: &mut Unpacker) -> Result<Self, CodecError> {
        Ok(SetCodeData {
            account: Name::unmarshal(unpacker)?,
            code: unpacker.unpack_bytes()?,
        })
    }
}

/// Payload of a `setabi` action.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SetAbiData {
    pub account: Name,
    pub abi: Vec<u8>,
}

impl Marshal for SetAbiData {
    fn marshal(&self, packer: &mut Packer) -> Result<(), CodecError> {
        self.account.marshal(packer)?;
        packer.pack_bytes(&self.abi)
    }
}

impl Unmarshal for SetAbiData {
    fn unmarshal(unpacker: &mut Unpacker) -> Result<Self, CodecError> {
        Ok(SetAbiData {
            account: Name::unmarshal(unpacker)?,
            abi: unpacker.unpack_bytes()?,
        })
    }
}
