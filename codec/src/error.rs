use thiserror::Error;

/// Failure while reading or writing a byte layout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("unexpected end of buffer at offset {offset}: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    #[error("invalid UTF-8 in string at offset {offset}")]
    InvalidUtf8 { offset: usize },

    #[error("length {len} does not fit in a u32 prefix")]
    LengthOverflow { len: usize },

    #[error("compact-u16 value at offset {offset} is malformed or exceeds u16::MAX")]
    CompactU16Overflow { offset: usize },
}
