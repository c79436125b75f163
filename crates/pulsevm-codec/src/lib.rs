//! Deterministic binary packing for pulsevm's wire types.
//!
//! Scalars pack big-endian, variable-length byte strings pack as a `u32`
//! length prefix followed by the bytes, and fixed-length byte arrays pack
//! with no prefix at all. Every pack/unpack call enforces a `max_size` cap
//! (256 KiB by default) so a malformed or hostile payload can't force an
//! unbounded allocation.
//!
//! Domain types implement [`Marshal`]/[`Unmarshal`] in terms of [`Packer`]/
//! [`Unpacker`] rather than deriving from a generic serialization crate,
//! because the wire layout is fixed byte-for-byte by the spec this core
//! interops with.

mod error;
mod packer;
mod unpacker;

pub use error::CodecError;
pub use packer::{Packer, DEFAULT_MAX_SIZE};
pub use unpacker::Unpacker;

/// Implemented by every domain type that has a canonical byte encoding.
pub trait Marshal {
    fn marshal(&self, packer: &mut Packer) -> Result<(), CodecError>;

    /// Convenience: marshal into a fresh buffer using the default cap.
    fn marshal_to_vec(&self) -> Result<Vec<u8>, CodecError> {
        let mut packer = Packer::new();
        self.marshal(&mut packer)?;
        Ok(packer.into_bytes())
    }
}

/// Implemented by every domain type that can be reconstructed from bytes.
pub trait Unmarshal: Sized {
    fn unmarshal(unpacker: &mut Unpacker) -> Result<Self, CodecError>;

    /// Convenience: unmarshal an entire buffer, requiring every byte be consumed.
    fn unmarshal_exact(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut unpacker = Unpacker::new(bytes);
        let value = Self::unmarshal(&mut unpacker)?;
        Ok(value)
    }
}
