//! ChaCha20-Poly1305 encryption (RFC 8439).
//!
//! Used for onion layer payloads and inside ECIES key wrapping.

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    ChaCha20Poly1305, Key, Nonce,
};

use crate::{CryptoError, Result};

/// Nonce size for ChaCha20-Poly1305 (96 bits = 12 bytes).
pub const NONCE_SIZE: usize = 12;

/// Key size for ChaCha20-Poly1305 (256 bits = 32 bytes).
pub const KEY_SIZE: usize = 32;

/// Authentication tag size (128 bits = 16 bytes).
pub const TAG_SIZE: usize = 16;

/// Encrypt data with ChaCha20-Poly1305.
///
/// # Arguments
///
/// * `key` - 32-byte encryption key
/// * `nonce` - 12-byte nonce (must never be reused with the same key)
/// * `plaintext` - Data to encrypt
/// * `aad` - Additional authenticated data
///
/// # Returns
///
/// Ciphertext with appended 16-byte tag.
pub fn encrypt(
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
    plaintext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    let nonce = Nonce::from_slice(nonce);

    cipher
        .encrypt(
            nonce,
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|_| CryptoError::AeadEncryption)
}

/// Decrypt data with ChaCha20-Poly1305.
pub fn decrypt(
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
    ciphertext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    let nonce = Nonce::from_slice(nonce);

    cipher
        .decrypt(
            nonce,
            Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map_err(|_| CryptoError::AeadDecryption)
}

/// Encrypt under a fresh random nonce.
///
/// The output format is `nonce (12 bytes) || ciphertext || tag`.
pub fn seal(key: &[u8; KEY_SIZE], plaintext: &[u8]) -> Result<Vec<u8>> {
    let mut nonce = [0u8; NONCE_SIZE];
    rand::RngCore::fill_bytes(&mut rand::rngs::OsRng, &mut nonce);

    let ciphertext = encrypt(key, &nonce, plaintext, &[])?;
    let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Decrypt the output of [`seal`].
pub fn open(key: &[u8; KEY_SIZE], sealed: &[u8]) -> Result<Vec<u8>> {
    if sealed.len() < NONCE_SIZE + TAG_SIZE {
        return Err(CryptoError::InvalidInput(format!(
            "sealed payload too short: {} bytes",
            sealed.len()
        )));
    }
    let (nonce, ciphertext) = sealed.split_at(NONCE_SIZE);
    let mut nonce_bytes = [0u8; NONCE_SIZE];
    nonce_bytes.copy_from_slice(nonce);
    decrypt(key, &nonce_bytes, ciphertext, &[])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let key = [0x42u8; KEY_SIZE];
        let nonce = [0x01u8; NONCE_SIZE];
        let plaintext = b"Hello, Shallot!";
        let aad = b"associated data";

        let ciphertext = encrypt(&key, &nonce, plaintext, aad).expect("encrypt");
        let decrypted = decrypt(&key, &nonce, &ciphertext, aad).expect("decrypt");

        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_ciphertext_has_tag() {
        let key = [0x42u8; KEY_SIZE];
        let nonce = [0x01u8; NONCE_SIZE];

        let ciphertext = encrypt(&key, &nonce, b"test", &[]).expect("encrypt");
        assert_eq!(ciphertext.len(), 4 + TAG_SIZE);
    }

    #[test]
    fn test_seal_open() {
        let key = [0x07u8; KEY_SIZE];
        let sealed = seal(&key, b"layer payload").expect("seal");
        assert_eq!(sealed.len(), NONCE_SIZE + 13 + TAG_SIZE);
        assert_eq!(open(&key, &sealed).expect("open"), b"layer payload");
    }

    #[test]
    fn test_open_is_deterministic() {
        let key = [0x07u8; KEY_SIZE];
        let sealed = seal(&key, b"same").expect("seal");
        assert_eq!(
            open(&key, &sealed).expect("first"),
            open(&key, &sealed).expect("second")
        );
    }

    #[test]
    fn test_wrong_key_fails() {
        let sealed = seal(&[0x01u8; KEY_SIZE], b"test").expect("seal");
        assert!(matches!(
            open(&[0x02u8; KEY_SIZE], &sealed),
            Err(CryptoError::AeadDecryption)
        ));
    }

    #[test]
    fn test_open_too_short() {
        assert!(matches!(
            open(&[0u8; KEY_SIZE], &[0u8; 10]),
            Err(CryptoError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_empty_plaintext() {
        let key = [0x42u8; KEY_SIZE];
        let sealed = seal(&key, b"").expect("seal");
        assert_eq!(sealed.len(), NONCE_SIZE + TAG_SIZE);
        assert!(open(&key, &sealed).expect("open").is_empty());
    }
}
