//! Base64 text encoding.
//!
//! Public keys, wrapped symmetric keys and layer ciphertexts all travel as
//! standard padded base64 so that an onion message stays a plain ASCII string.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::{CryptoError, Result};

/// Encode bytes as standard padded base64.
pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode standard padded base64.
pub fn decode(text: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(text)
        .map_err(|e| CryptoError::Encoding(e.to_string()))
}

/// Decode standard padded base64 into a fixed-size array.
pub fn decode_array<const N: usize>(text: &str) -> Result<[u8; N]> {
    let bytes = decode(text)?;
    <[u8; N]>::try_from(bytes.as_slice()).map_err(|_| CryptoError::InvalidKeyLength {
        expected: N,
        actual: bytes.len(),
    })
}

/// Length in characters of the padded base64 encoding of `raw_len` bytes.
pub const fn encoded_len(raw_len: usize) -> usize {
    raw_len.div_ceil(3) * 4
}
