//! ECIES-X25519-ChaCha20-BLAKE3 encryption.
//!
//! Wraps each hop's symmetric key to that relay's static public key. The
//! output has a fixed size for a fixed-size plaintext, which is what lets a
//! relay slice the wrapped key off the front of an onion message by position.
//!
//! ## Algorithm
//!
//! ```text
//! ECIES.Encrypt(recipient_pk, plaintext; randomness):
//!   1. eph_sk = randomness
//!   2. eph_pk = X25519_basepoint_mult(eph_sk)
//!   3. shared_secret = X25519(eph_sk, recipient_pk)
//!   4. enc_key = BLAKE3::derive_key("Shallot v1 ecies-encryption-key",
//!               shared_secret || eph_pk || recipient_pk)
//!   5. nonce = BLAKE3::derive_key("Shallot v1 ecies-nonce",
//!             shared_secret || eph_pk)[:12]
//!   6. ciphertext = ChaCha20-Poly1305.Encrypt(enc_key, nonce, plaintext, aad=eph_pk)
//!   7. return (eph_pk || ciphertext || tag)
//! ```

use crate::blake3::{self, contexts};
use crate::chacha20;
use crate::x25519::{self, X25519PublicKey, X25519StaticSecret};
use crate::{CryptoError, Result};

/// Bytes added to the plaintext: ephemeral public key plus tag.
pub const OVERHEAD: usize = 32 + chacha20::TAG_SIZE;

/// ECIES ciphertext: ephemeral public key + ciphertext + tag.
pub struct EciesCiphertext {
    /// The ephemeral public key (32 bytes).
    pub eph_pk: [u8; 32],
    /// The ciphertext with appended Poly1305 tag.
    pub ciphertext_and_tag: Vec<u8>,
}

impl EciesCiphertext {
    /// Serialize to bytes: eph_pk || ciphertext || tag.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(32 + self.ciphertext_and_tag.len());
        out.extend_from_slice(&self.eph_pk);
        out.extend_from_slice(&self.ciphertext_and_tag);
        out
    }

    /// Deserialize from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < OVERHEAD {
            return Err(CryptoError::Ecies("ciphertext too short".into()));
        }
        let mut eph_pk = [0u8; 32];
        eph_pk.copy_from_slice(&data[..32]);
        Ok(Self {
            eph_pk,
            ciphertext_and_tag: data[32..].to_vec(),
        })
    }
}

/// Derive the encryption key and nonce shared by both directions.
fn derive_key_and_nonce(
    shared_secret: &[u8; 32],
    eph_pk: &[u8; 32],
    recipient_pk: &[u8; 32],
) -> ([u8; 32], [u8; 12]) {
    let mut key_material = Vec::with_capacity(32 + 32 + 32);
    key_material.extend_from_slice(shared_secret);
    key_material.extend_from_slice(eph_pk);
    key_material.extend_from_slice(recipient_pk);
    let enc_key = blake3::derive_key(contexts::ECIES_ENCRYPTION_KEY, &key_material);

    let mut nonce_material = Vec::with_capacity(32 + 32);
    nonce_material.extend_from_slice(shared_secret);
    nonce_material.extend_from_slice(eph_pk);
    let nonce_full = blake3::derive_key(contexts::ECIES_NONCE, &nonce_material);
    let mut nonce = [0u8; 12];
    nonce.copy_from_slice(&nonce_full[..12]);

    (enc_key, nonce)
}

/// Encrypt using ECIES with explicit randomness.
///
/// # Arguments
///
/// * `recipient_pk` - Recipient's X25519 public key
/// * `plaintext` - Data to encrypt
/// * `randomness` - 32 bytes of randomness for ephemeral key generation
pub fn encrypt_deterministic(
    recipient_pk: &X25519PublicKey,
    plaintext: &[u8],
    randomness: &[u8; 32],
) -> Result<EciesCiphertext> {
    let eph_pk_bytes = x25519::basepoint_mult(randomness);

    let eph_secret = X25519StaticSecret::from_bytes(*randomness);
    let shared_secret = eph_secret.diffie_hellman(recipient_pk);

    let (enc_key, nonce) =
        derive_key_and_nonce(shared_secret.as_bytes(), &eph_pk_bytes, recipient_pk.as_bytes());

    let ciphertext_and_tag = chacha20::encrypt(&enc_key, &nonce, plaintext, &eph_pk_bytes)?;

    Ok(EciesCiphertext {
        eph_pk: eph_pk_bytes,
        ciphertext_and_tag,
    })
}

/// Encrypt using ECIES with random ephemeral key.
pub fn encrypt(recipient_pk: &X25519PublicKey, plaintext: &[u8]) -> Result<EciesCiphertext> {
    let mut randomness = [0u8; 32];
    rand::RngCore::fill_bytes(&mut rand::rngs::OsRng, &mut randomness);
    encrypt_deterministic(recipient_pk, plaintext, &randomness)
}

/// Decrypt an ECIES ciphertext.
///
/// # Arguments
///
/// * `recipient_sk` - Recipient's X25519 static secret
/// * `ciphertext` - The ECIES ciphertext (eph_pk || ciphertext || tag)
pub fn decrypt(recipient_sk: &X25519StaticSecret, ciphertext: &EciesCiphertext) -> Result<Vec<u8>> {
    let eph_pk = X25519PublicKey::from_bytes(ciphertext.eph_pk);
    let recipient_pk = recipient_sk.public_key();

    let shared_secret = recipient_sk.diffie_hellman(&eph_pk);
    let (enc_key, nonce) =
        derive_key_and_nonce(shared_secret.as_bytes(), &ciphertext.eph_pk, recipient_pk.as_bytes());

    chacha20::decrypt(
        &enc_key,
        &nonce,
        &ciphertext.ciphertext_and_tag,
        &ciphertext.eph_pk,
    )
}
