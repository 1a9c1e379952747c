//! Onion message construction and single-layer peeling.
//!
//! Layers are built from the exit hop outward. Each hop's payload is the
//! zero-padded port it must forward to followed by everything it must
//! forward, so a peeled payload splits at a fixed offset and never needs a
//! delimiter:
//!
//! ```text
//! layer(i) = b64(ECIES(pk_i, key_i)) || b64(seal(key_i, addr(i+1) || layer(i+1)))
//! layer(2) = b64(ECIES(pk_2, key_2)) || b64(seal(key_2, addr(dest) || plaintext))
//! ```

use shallot_crypto::ecies::{self, EciesCiphertext};
use shallot_crypto::x25519::{X25519PublicKey, X25519StaticSecret};
use shallot_crypto::{chacha20, encoding};
use shallot_types::network::PortLayout;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::circuit::Circuit;
use crate::{
    OnionError, Result, ADDRESS_WIDTH, CIRCUIT_HOPS, ENCRYPTED_KEY_LEN, SYMMETRIC_KEY_SIZE,
};

/// A single-use per-hop key.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; SYMMETRIC_KEY_SIZE]);

impl SymmetricKey {
    /// Generate a fresh random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; SYMMETRIC_KEY_SIZE];
        rand::RngCore::fill_bytes(&mut rand::rngs::OsRng, &mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub fn from_bytes(bytes: [u8; SYMMETRIC_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; SYMMETRIC_KEY_SIZE] {
        &self.0
    }
}

/// Result of removing one layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeeledLayer {
    /// Port the remainder must be delivered to.
    pub destination_port: u16,
    /// Next onion message, or the plaintext at the exit hop.
    pub remainder: String,
}

/// Format a port as a fixed-width destination address.
pub fn encode_address(port: u16) -> String {
    format!("{port:0width$}", width = ADDRESS_WIDTH)
}

/// Split a decrypted payload into its destination port and remainder.
pub fn parse_address(payload: &str) -> Result<(u16, &str)> {
    let digits = payload
        .as_bytes()
        .get(..ADDRESS_WIDTH)
        .ok_or_else(|| OnionError::Decryption("payload shorter than address".into()))?;
    if !digits.iter().all(u8::is_ascii_digit) {
        return Err(OnionError::Decryption(
            "destination address is not decimal".into(),
        ));
    }

    // All ten leading bytes are ASCII, so the split is on a char boundary.
    let (address, remainder) = payload.split_at(ADDRESS_WIDTH);
    let value: u64 = address
        .parse()
        .map_err(|_| OnionError::Decryption(format!("unparsable address {address}")))?;
    let port = u16::try_from(value)
        .map_err(|_| OnionError::Decryption(format!("address {value} is not a port")))?;
    Ok((port, remainder))
}

/// Wrap `inner` in one layer addressed to the holder of `hop_pk`.
pub fn wrap_layer(
    hop_pk: &X25519PublicKey,
    key: &SymmetricKey,
    next_port: u16,
    inner: &str,
) -> Result<String> {
    let mut payload = String::with_capacity(ADDRESS_WIDTH + inner.len());
    payload.push_str(&encode_address(next_port));
    payload.push_str(inner);

    let sealed = chacha20::seal(key.as_bytes(), payload.as_bytes())?;
    let wrapped_key = ecies::encrypt(hop_pk, key.as_bytes())?;

    let mut layer = encoding::encode(&wrapped_key.to_bytes());
    debug_assert_eq!(layer.len(), ENCRYPTED_KEY_LEN);
    layer.push_str(&encoding::encode(&sealed));
    Ok(layer)
}

/// Remove exactly one layer with the relay's private key.
pub fn peel_layer(secret: &X25519StaticSecret, message: &str) -> Result<PeeledLayer> {
    if message.is_empty() {
        return Err(OnionError::MissingMessage);
    }

    let Some((key_part, body_part)) = message
        .get(..ENCRYPTED_KEY_LEN)
        .zip(message.get(ENCRYPTED_KEY_LEN..))
    else {
        return Err(OnionError::Decryption(format!(
            "message shorter than {ENCRYPTED_KEY_LEN}-character key prefix"
        )));
    };

    let key = unwrap_key(secret, key_part)?;

    let sealed = encoding::decode(body_part).map_err(|e| OnionError::Decryption(e.to_string()))?;
    let payload =
        chacha20::open(key.as_bytes(), &sealed).map_err(|e| OnionError::Decryption(e.to_string()))?;
    let payload = String::from_utf8(payload)
        .map_err(|_| OnionError::Decryption("payload is not UTF-8".into()))?;

    let (destination_port, remainder) = parse_address(&payload)?;
    Ok(PeeledLayer {
        destination_port,
        remainder: remainder.to_string(),
    })
}

fn unwrap_key(secret: &X25519StaticSecret, key_part: &str) -> Result<SymmetricKey> {
    let blob = encoding::decode(key_part).map_err(|e| OnionError::Decryption(e.to_string()))?;
    let ciphertext =
        EciesCiphertext::from_bytes(&blob).map_err(|e| OnionError::Decryption(e.to_string()))?;
    let mut raw =
        ecies::decrypt(secret, &ciphertext).map_err(|e| OnionError::Decryption(e.to_string()))?;

    let key = <[u8; SYMMETRIC_KEY_SIZE]>::try_from(raw.as_slice())
        .map(SymmetricKey::from_bytes)
        .map_err(|_| {
            OnionError::Decryption(format!("unwrapped key has {} bytes", raw.len()))
        });
    raw.zeroize();
    key
}

/// Builds onion messages for a fixed port layout.
#[derive(Clone, Copy, Debug)]
pub struct OnionEncoder {
    layout: PortLayout,
}

impl OnionEncoder {
    /// Create an encoder that derives relay ports from `layout`.
    pub fn new(layout: PortLayout) -> Self {
        Self { layout }
    }

    /// Wrap `message` for delivery to `destination_port` through `circuit`,
    /// using a fresh key per hop.
    pub fn encode(&self, message: &str, destination_port: u16, circuit: &Circuit) -> Result<String> {
        let keys: [SymmetricKey; CIRCUIT_HOPS] = std::array::from_fn(|_| SymmetricKey::generate());
        self.encode_with_keys(message, destination_port, circuit, &keys)
    }

    /// Wrap `message` using caller-supplied hop keys (`keys[i]` for hop `i`).
    pub fn encode_with_keys(
        &self,
        message: &str,
        destination_port: u16,
        circuit: &Circuit,
        keys: &[SymmetricKey; CIRCUIT_HOPS],
    ) -> Result<String> {
        let hops = circuit.hops();
        let mut onion = message.to_string();

        for ((i, hop), key) in hops.iter().enumerate().zip(keys).rev() {
            let next_port = match hops.get(i + 1) {
                None => destination_port,
                Some(next) => self.layout.node_port(next.node_id).ok_or_else(|| {
                    OnionError::InvalidAddress(format!("node {} has no port", next.node_id))
                })?,
            };
            let hop_pk = X25519PublicKey::from_base64(&hop.pub_key)
                .map_err(|_| OnionError::InvalidPublicKey { node_id: hop.node_id })?;

            onion = wrap_layer(&hop_pk, key, next_port, &onion)?;
        }

        Ok(onion)
    }
}
