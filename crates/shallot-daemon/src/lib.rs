//! shallot-daemon: HTTP roles of the onion network.
//!
//! - [`registry`]: the public-key directory
//! - [`router`]: relays that peel one layer and forward
//! - [`user`]: endpoints that build circuits, send and receive
//! - [`launch`]: start all of them in one process

pub mod client;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod http;
pub mod launch;
pub mod registry;
pub mod router;
pub mod user;

pub use client::PeerClient;
pub use config::DaemonConfig;
pub use error::NodeError;
pub use launch::{launch_network, Network};
