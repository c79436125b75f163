use thiserror::Error;

/// Errors raised while packing or unpacking the wire format.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// A pack or unpack operation would exceed the configured `max_size` cap.
    #[error("codec overflow: {attempted} bytes exceeds cap of {max}")]
    Overflow { attempted: usize, max: usize },

    /// The unpacker ran out of bytes before the value was fully read.
    #[error("unexpected end of input: needed {needed} bytes, {available} available")]
    UnexpectedEof { needed: usize, available: usize },

    /// A `Tx`'s leading type id did not match any known variant.
    #[error("unknown transaction type id {0}")]
    UnknownTxType(u16),

    /// A length-prefixed value's length did not match its expected fixed size.
    #[error("invalid length {got} for fixed-size field, expected {expected}")]
    InvalidLength { got: usize, expected: usize },
}
