//! # shallot-onion
//!
//! Onion encryption and per-hop peeling for the Shallot overlay.
//!
//! - [`directory`] - Key directory of registered relays
//! - [`circuit`] - 3-hop circuit selection by rejection sampling
//! - [`layer`] - Onion message wire format, encoder and layer peeling
//! - [`relay`] - Relay keypair and the peel step of the forwarding loop
//!
//! ## Wire Format
//!
//! One layer is `K || C`, both base64 text:
//!
//! | Part | Content | Width |
//! |---|---|---|
//! | `K` | ECIES-wrapped 32-byte hop key | 108 chars |
//! | `C` | `nonce || ChaCha20-Poly1305(hop key, address || remainder)` | variable |
//!
//! `address` is the next destination port, zero-padded to 10 digits.

pub mod circuit;
pub mod directory;
pub mod layer;
pub mod relay;

use shallot_crypto::{ecies, encoding};
use shallot_types::NodeId;

/// Number of relays in a circuit.
pub const CIRCUIT_HOPS: usize = 3;

/// Width of the zero-padded destination address in a decrypted layer.
pub const ADDRESS_WIDTH: usize = 10;

/// Size of a per-hop symmetric key in bytes.
pub const SYMMETRIC_KEY_SIZE: usize = 32;

/// Width in characters of the encrypted-key prefix of every layer.
pub const ENCRYPTED_KEY_LEN: usize = encoding::encoded_len(SYMMETRIC_KEY_SIZE + ecies::OVERHEAD);

/// Error types for onion routing operations.
#[derive(Debug, thiserror::Error)]
pub enum OnionError {
    /// A node with this id is already registered.
    #[error("node {node_id} already registered")]
    DuplicateNode { node_id: NodeId },

    /// Not enough distinct relays to build a circuit.
    #[error("insufficient nodes: need {need}, have {have}")]
    InsufficientNodes { need: usize, have: usize },

    /// The message was absent or empty.
    #[error("message is required")]
    MissingMessage,

    /// A layer could not be peeled.
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// A registered public key is not usable for encryption.
    #[error("invalid public key for node {node_id}")]
    InvalidPublicKey { node_id: NodeId },

    /// A destination cannot be expressed as a port.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The downstream hop could not be reached or refused the message.
    #[error("forward failed: {0}")]
    Forward(String),

    /// Cryptographic error from shallot-crypto.
    #[error("crypto error: {0}")]
    Crypto(#[from] shallot_crypto::CryptoError),
}

/// Convenience result type for onion routing operations.
pub type Result<T> = std::result::Result<T, OnionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(CIRCUIT_HOPS, 3);
        assert_eq!(ADDRESS_WIDTH, 10);
        assert_eq!(ENCRYPTED_KEY_LEN, 108);
    }

    #[test]
    fn test_error_display() {
        let err = OnionError::InsufficientNodes { need: 3, have: 2 };
        assert!(err.to_string().contains("need 3"));
        assert!(err.to_string().contains("have 2"));

        let err = OnionError::DuplicateNode { node_id: 7 };
        assert_eq!(err.to_string(), "node 7 already registered");
    }
}
