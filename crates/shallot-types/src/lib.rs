//! # shallot-types
//!
//! Shared domain and wire types used across the Shallot workspace.
//! JSON field names match the HTTP interface exactly (`nodeId`, `pubKey`,
//! `destinationUserId`).

pub mod diagnostics;
pub mod network;

/// Identifier of a relay node.
pub type NodeId = u32;

/// Identifier of a user.
pub type UserId = u32;

/// Default registry port.
pub const DEFAULT_REGISTRY_PORT: u16 = 8080;

/// Default base port for relays (relay port = base + node id).
pub const DEFAULT_NODE_BASE_PORT: u16 = 4000;

/// Default base port for users (user port = base + user id).
pub const DEFAULT_USER_BASE_PORT: u16 = 3000;

/// Default host every role binds to and dials.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Body served by every role's `/status` endpoint.
pub const STATUS_LIVE: &str = "live";

/// Plain-text acknowledgement for accepted messages.
pub const ACK_SUCCESS: &str = "success";

/// Plain-text body of a successful `/sendMessage`.
pub const ACK_SENT: &str = "Message sent successfully";
