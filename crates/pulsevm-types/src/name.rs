use std::fmt;
use std::str::FromStr;

use pulsevm_codec::{CodecError, Marshal, Packer, Unmarshal, Unpacker};
use serde::{Deserialize, Serialize};

/// 32-symbol alphabet a [`Name`] is packed from: `.` then `1`-`5` then `a`-`z`.
const ALPHABET: &[u8; 32] = b".12345abcdefghijklmnopqrstuvwxyz";

/// A 64-bit packed account/action/permission identifier.
///
/// Up to 13 characters from [`ALPHABET`] are packed into a `u64`: the first
/// twelve occupy 5 bits each, most-significant-first, and the optional
/// thirteenth occupies the low 4 bits. Characters outside the alphabet map
/// to `0` (the same slot as `.`), so the encoding is total: every string
/// produces *some* `Name`, though only the first 16 alphabet symbols are
/// representable in the 13th position.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Name(pub u64);

fn char_to_symbol(c: u8) -> u8 {
    match ALPHABET.iter().position(|&a| a == c) {
        Some(idx) => idx as u8,
        None => 0,
    }
}

impl Name {
    pub const EMPTY: Name = Name(0);

    pub fn from_str_lossy(s: &str) -> Self {
        let bytes = s.as_bytes();
        let mut value: u64 = 0;
        let mut i = 0usize;
        while i < 12 && i < bytes.len() {
            let sym = char_to_symbol(bytes[i]) as u64 & 0x1f;
            value |= sym << (64 - 5 * (i + 1));
            i += 1;
        }
        if i == 12 && bytes.len() > 12 {
            let sym = char_to_symbol(bytes[12]) as u64 & 0x0f;
            value |= sym;
        }
        Name(value)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }

    /// Big-endian bytes of the underlying `u64`, used as a map key and as
    /// input to permission-id hashing.
    pub fn bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut chars = ['.'; 13];
        let mut tmp = self.0;
        for i in 0..13 {
            let idx = if i == 0 { tmp & 0x0f } else { tmp & 0x1f };
            chars[12 - i] = ALPHABET[idx as usize] as char;
            tmp >>= if i == 0 { 4 } else { 5 };
        }
        let s: String = chars.iter().collect();
        write!(f, "{}", s.trim_end_matches('.'))
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({} / {:#018x})", self, self.0)
    }
}

impl FromStr for Name {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Name::from_str_lossy(s))
    }
}

impl From<u64> for Name {
    fn from(v: u64) -> Self {
        Name(v)
    }
}

impl Serialize for Name {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Name {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Name::from_str_lossy(&s))
    }
}

impl Marshal for Name {
    fn marshal(&self, packer: &mut Packer) -> Result<(), CodecError> {
        packer.pack_u64(self.0)
    }
}

impl Unmarshal for Name {
    fn unmarshal(unpacker: &mut Unpacker) -> Result<Self, CodecError> {
        Ok(Name(unpacker.unpack_u64()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn eosio_packs_to_documented_hex() {
        let n = Name::from_str_lossy("eosio");
        assert_eq!(n.as_u64(), 0x5530_ea00_0000_0000);
    }

    #[test]
    fn trims_trailing_dots_on_display() {
        assert_eq!(Name::from_str_lossy("pulse").to_string(), "pulse");
        assert_eq!(Name::from_str_lossy("a").to_string(), "a");
    }

    #[test]
    fn marshal_round_trips() {
        let n = Name::from_str_lossy("glenn");
        let bytes = n.marshal_to_vec().unwrap();
        let back = Name::unmarshal_exact(&bytes).unwrap();
        assert_eq!(n, back);
    }

    proptest! {
        #[test]
        fn round_trips_for_valid_alphabet_strings(
            s in "[.12345a-z]{1,12}"
        ) {
            let n = Name::from_str_lossy(&s);
            let back = n.to_string();
            let trimmed = s.trim_end_matches('.');
            prop_assert_eq!(back, trimmed);
        }
    }
}
