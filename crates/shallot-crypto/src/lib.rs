//! # shallot-crypto
//!
//! Cryptographic primitives for the Shallot onion overlay.
//!
//! The suite is fixed; there is no algorithm negotiation between hops.
//!
//! ## Modules
//!
//! - [`blake3`] — Domain-separated BLAKE3 key derivation
//! - [`x25519`] — X25519 key agreement (RFC 7748) for relay keypairs
//! - [`chacha20`] — ChaCha20-Poly1305 encryption (RFC 8439) for layer payloads
//! - [`ecies`] — ECIES used to wrap per-hop symmetric keys
//! - [`encoding`] — Base64 text encoding for keys and ciphertexts on the wire

pub mod blake3;
pub mod chacha20;
pub mod ecies;
pub mod encoding;
pub mod x25519;

/// Error types for cryptographic operations.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// AEAD decryption failed (authentication tag mismatch).
    #[error("AEAD decryption failed")]
    AeadDecryption,

    /// AEAD encryption failed.
    #[error("AEAD encryption failed")]
    AeadEncryption,

    /// Invalid key length.
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// ECIES encryption/decryption failed.
    #[error("ECIES error: {0}")]
    Ecies(String),

    /// Text was not valid base64.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Invalid input data.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;
