//! Key directory of registered relays.
//!
//! The registry owns one directory for its lifetime. Entries are append-only:
//! there is no removal, no update and nothing survives a restart.

use std::sync::{PoisonError, RwLock};

use shallot_types::network::NodeIdentity;
use tracing::debug;

use crate::{OnionError, Result};

/// Register/list interface of the relay key directory.
pub trait KeyDirectory: Send + Sync {
    /// Add a relay. Fails with [`OnionError::DuplicateNode`] if the id is taken.
    fn register(&self, node: NodeIdentity) -> Result<()>;

    /// Snapshot of all registered relays in insertion order.
    fn list(&self) -> Vec<NodeIdentity>;
}

/// In-memory directory guarded by a read-write lock.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    nodes: RwLock<Vec<NodeIdentity>>,
}

impl InMemoryDirectory {
    /// Create a new empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the number of registered relays.
    pub fn len(&self) -> usize {
        self.nodes.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Return whether no relay is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyDirectory for InMemoryDirectory {
    fn register(&self, node: NodeIdentity) -> Result<()> {
        let mut nodes = self.nodes.write().unwrap_or_else(PoisonError::into_inner);
        if nodes.iter().any(|n| n.node_id == node.node_id) {
            return Err(OnionError::DuplicateNode {
                node_id: node.node_id,
            });
        }
        debug!("Registering node {}", node.node_id);
        nodes.push(node);
        Ok(())
    }

    fn list(&self) -> Vec<NodeIdentity> {
        self.nodes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
