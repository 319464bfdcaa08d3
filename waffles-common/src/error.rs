//! Errors raised while encoding or decoding format records

/// Format-level encode/decode failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// String does not fit its fixed-length field (one byte is kept for the NUL)
    #[error("'{value}' is {len} bytes, field holds at most {max}")]
    StringTooLong {
        value: String,
        len: usize,
        max: usize,
    },

    /// Ran out of bytes in the middle of a record
    #[error("unexpected end of data at offset {offset}: needed {needed} bytes, {available} left")]
    UnexpectedEof {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// File does not start with the expected magic
    #[error("file magic mismatch: found {found:#010x}, expected {expected:#010x}")]
    BadMagic { found: u32, expected: u32 },

    /// Tag check sentinel missing, the stream is out of sync
    #[error("tag check mismatch at offset {offset}: found {found:#010x}")]
    TagMismatch { offset: usize, found: u32 },

    #[error("unknown texture type {0}")]
    UnknownTextureType(i8),

    /// Data continues past the last section
    #[error("{0} trailing bytes after the last section")]
    TrailingBytes(usize),
}
