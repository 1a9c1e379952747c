//! Registry entries, message bodies and the port layout.

use serde::{Deserialize, Serialize};

use crate::{
    NodeId, UserId, DEFAULT_NODE_BASE_PORT, DEFAULT_REGISTRY_PORT, DEFAULT_USER_BASE_PORT,
};

/// A relay's public identity as stored in the key directory.
///
/// `pub_key` is the base64 encoding of the relay's X25519 public key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeIdentity {
    pub node_id: NodeId,
    pub pub_key: String,
}

/// `POST /registerNode` request body.
pub type RegisterNodeBody = NodeIdentity;

/// `GET /getNodeRegistry` response body.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NodeRegistryBody {
    pub nodes: Vec<NodeIdentity>,
}

/// `POST /message` request body, for relays and users alike.
///
/// The field is optional so that a missing message is reported as such
/// rather than as a malformed body.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MessageBody {
    #[serde(default)]
    pub message: Option<String>,
}

impl MessageBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }

    /// The message, if present and non-empty.
    pub fn non_empty(&self) -> Option<&str> {
        self.message.as_deref().filter(|m| !m.is_empty())
    }
}

/// `POST /sendMessage` request body.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub destination_user_id: Option<UserId>,
}

impl SendMessageBody {
    pub fn new(message: impl Into<String>, destination_user_id: UserId) -> Self {
        Self {
            message: Some(message.into()),
            destination_user_id: Some(destination_user_id),
        }
    }
}

/// The three non-overlapping port ranges of a deployment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortLayout {
    pub registry_port: u16,
    pub node_base_port: u16,
    pub user_base_port: u16,
}

impl PortLayout {
    /// Listening port of relay `node_id`, if it fits in a TCP port.
    pub fn node_port(&self, node_id: NodeId) -> Option<u16> {
        offset_port(self.node_base_port, node_id)
    }

    /// Listening port of user `user_id`, if it fits in a TCP port.
    pub fn user_port(&self, user_id: UserId) -> Option<u16> {
        offset_port(self.user_base_port, user_id)
    }
}

impl Default for PortLayout {
    fn default() -> Self {
        Self {
            registry_port: DEFAULT_REGISTRY_PORT,
            node_base_port: DEFAULT_NODE_BASE_PORT,
            user_base_port: DEFAULT_USER_BASE_PORT,
        }
    }
}

fn offset_port(base: u16, offset: u32) -> Option<u16> {
    u32::from(base)
        .checked_add(offset)
        .and_then(|port| u16::try_from(port).ok())
}
