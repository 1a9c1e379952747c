//! Relay identity and the peel step of the forwarding loop.
//!
//! A relay holds one static X25519 keypair for its whole lifetime. Peeling
//! is stateless: every call recovers its own hop key from the message and
//! drops it when done, so concurrent messages never share key material.

use shallot_crypto::x25519::{X25519PublicKey, X25519StaticSecret};
use shallot_types::network::NodeIdentity;
use shallot_types::NodeId;
use tracing::debug;

use crate::layer::{self, PeeledLayer};
use crate::Result;

/// A relay's static keypair.
pub struct RelayKeys {
    node_id: NodeId,
    secret: X25519StaticSecret,
}

impl RelayKeys {
    /// Generate a fresh keypair for relay `node_id`.
    pub fn generate(node_id: NodeId) -> Self {
        Self::from_secret(node_id, X25519StaticSecret::random())
    }

    /// Wrap an existing secret.
    pub fn from_secret(node_id: NodeId, secret: X25519StaticSecret) -> Self {
        Self { node_id, secret }
    }

    /// Return the relay's node id.
    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    /// Return the relay's public key.
    pub fn public_key(&self) -> X25519PublicKey {
        self.secret.public_key()
    }

    /// The directory entry this relay registers.
    pub fn identity(&self) -> NodeIdentity {
        NodeIdentity {
            node_id: self.node_id,
            pub_key: self.public_key().to_base64(),
        }
    }

    /// Base64 export of the private key, served for diagnostics.
    pub fn export_private_key(&self) -> String {
        self.secret.to_base64()
    }

    /// Remove this relay's layer from `message`.
    pub fn peel(&self, message: &str) -> Result<PeeledLayer> {
        let peeled = layer::peel_layer(&self.secret, message)?;
        debug!(
            "Node {} peeled layer, next hop port {}",
            self.node_id, peeled.destination_port
        );
        Ok(peeled)
    }
}
