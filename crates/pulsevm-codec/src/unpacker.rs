use crate::error::CodecError;
use crate::packer::DEFAULT_MAX_SIZE;

/// Reads big-endian scalars, length-prefixed byte strings, and fixed-size
/// byte arrays from a borrowed buffer, mirroring [`crate::Packer`].
pub struct Unpacker<'a> {
    bytes: &'a [u8],
    pos: usize,
    max_size: usize,
}

impl<'a> Unpacker<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self::with_max_size(bytes, DEFAULT_MAX_SIZE)
    }

    pub fn with_max_size(bytes: &'a [u8], max_size: usize) -> Self {
        Self {
            bytes,
            pos: 0,
            max_size,
        }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        if n > self.max_size {
            return Err(CodecError::Overflow {
                attempted: n,
                max: self.max_size,
            });
        }
        let end = self.pos + n;
        if end > self.bytes.len() {
            return Err(CodecError::UnexpectedEof {
                needed: n,
                available: self.bytes.len() - self.pos,
            });
        }
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub fn unpack_u16(&mut self) -> Result<u16, CodecError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn unpack_u32(&mut self) -> Result<u32, CodecError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn unpack_u64(&mut self) -> Result<u64, CodecError> {
        let b = self.take(8)?;
        Ok(u64::from_be_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    pub fn unpack_bool(&mut self) -> Result<bool, CodecError> {
        let b = self.take(1)?;
        Ok(b[0] != 0)
    }

    /// Unpacks a `u32 length ++ bytes` value.
    pub fn unpack_bytes(&mut self) -> Result<Vec<u8>, CodecError> {
        let len = self.unpack_u32()? as usize;
        Ok(self.take(len)?.to_vec())
    }

    /// Unpacks a fixed-length byte array with no length prefix.
    pub fn unpack_fixed<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let slice = self.take(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    /// Remaining unread bytes.
    pub fn remaining(&self) -> &'a [u8] {
        &self.bytes[self.pos..]
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// True once every input byte has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.pos == self.bytes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packer::Packer;

    #[test]
    fn round_trips_scalars() {
        let mut p = Packer::new();
        p.pack_u16(7).unwrap();
        p.pack_u32(99).unwrap();
        p.pack_u64(12345).unwrap();
        let bytes = p.into_bytes();

        let mut u = Unpacker::new(&bytes);
        assert_eq!(u.unpack_u16().unwrap(), 7);
        assert_eq!(u.unpack_u32().unwrap(), 99);
        assert_eq!(u.unpack_u64().unwrap(), 12345);
        assert!(u.is_exhausted());
    }

    #[test]
    fn errors_on_truncated_input() {
        let mut u = Unpacker::new(&[0x00]);
        assert!(matches!(
            u.unpack_u32(),
            Err(CodecError::UnexpectedEof { .. })
        ));
    }
}
