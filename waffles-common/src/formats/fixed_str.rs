//! Fixed-length, NUL-padded string fields (`char[N]` in the engine headers)

use crate::FormatError;

/// Encode `value` into an `N`-byte NUL-padded field.
///
/// At most `N - 1` bytes of text are accepted so the engine can read the field
/// as a C string.
pub fn encode_fixed_str<const N: usize>(value: &str) -> Result<[u8; N], FormatError> {
    let bytes = value.as_bytes();
    if bytes.len() >= N {
        return Err(FormatError::StringTooLong {
            value: value.to_string(),
            len: bytes.len(),
            max: N - 1,
        });
    }
    let mut field = [0u8; N];
    field[..bytes.len()].copy_from_slice(bytes);
    Ok(field)
}

/// Decode a NUL-padded field, stopping at the first NUL.
pub fn decode_fixed_str(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}
