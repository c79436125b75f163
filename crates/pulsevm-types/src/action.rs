use pulsevm_codec::{CodecError, Marshal, Packer, Unmarshal, Unpacker};
use serde::{Deserialize, Serialize};

use crate::authority::PermissionLevel;
use crate::name::Name;

/// A single contract invocation: the target account/action name, the
/// permission levels authorizing it, and opaque action data.
///
/// `data` is left as raw bytes rather than decoded against an ABI — action
/// handlers parse the layout they expect themselves, the same way
/// `newaccount`/`setcode`/`setabi` do for the native system contract.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Action {
    pub account: Name,
    pub name: Name,
    pub data: Vec<u8>,
    pub authorization: Vec<PermissionLevel>,
}

impl Marshal for Action {
    fn marshal(&self, packer: &mut Packer) -> Result<(), CodecError> {
        self.account.marshal(packer)?;
        self.name.marshal(packer)?;
        packer.pack_bytes(&self.data)?;
        packer.pack_u32(self.authorization.len() as u32)?;
        for level in &self.authorization {
            level.marshal(packer)?;
        }
        Ok(())
    }
}

impl Unmarshal for Action {
    fn unmarshal(unpacker: &mut Unpacker) -> Result<Self, CodecError> {
        let account = Name::unmarshal(unpacker)?;
        let name = Name::unmarshal(unpacker)?;
        let data = unpacker.unpack_bytes()?;
        let num_levels = unpacker.unpack_u32()?;
        let mut authorization = Vec::with_capacity(num_levels as usize);
        for _ in 0..num_levels {
            authorization.push(PermissionLevel::unmarshal(unpacker)?);
        }
        Ok(Action {
            account,
            name,
            data,
            authorization,
        })
    }
}
