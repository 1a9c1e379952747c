//! Domain-separated BLAKE3 key derivation.
//!
//! The ECIES encryption key and nonce are derived from the same shared
//! secret under distinct context strings, so they never collide.

/// BLAKE3 context strings.
pub mod contexts {
    pub const ECIES_ENCRYPTION_KEY: &str = "Shallot v1 ecies-encryption-key";
    pub const ECIES_NONCE: &str = "Shallot v1 ecies-nonce";
}

/// Derive a key using BLAKE3's built-in key derivation mode.
///
/// # Arguments
///
/// * `context` - One of the [`contexts`] strings
/// * `key_material` - The input key material
pub fn derive_key(context: &str, key_material: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    let mut hasher = ::blake3::Hasher::new_derive_key(context);
    hasher.update(key_material);
    let hash = hasher.finalize();
    out.copy_from_slice(hash.as_bytes());
    out
}
