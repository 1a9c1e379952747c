//! Starting a whole network in one process.

use std::sync::Arc;

use shallot_onion::directory::InMemoryDirectory;
use tracing::info;

use crate::config::DaemonConfig;
use crate::http::ServerHandle;
use crate::registry::launch_registry;
use crate::router::launch_router;
use crate::user::launch_user;

/// Handles for every role started by [`launch_network`].
pub struct Network {
    pub registry: ServerHandle,
    pub routers: Vec<ServerHandle>,
    pub users: Vec<ServerHandle>,
}

impl Network {
    /// Stop users first, then relays, then the registry.
    pub async fn shutdown(self) {
        for user in self.users {
            user.shutdown().await;
        }
        for router in self.routers {
            router.shutdown().await;
        }
        self.registry.shutdown().await;
        info!("Network stopped");
    }
}

/// Start the registry, `launch.nodes` relays and `launch.users` users.
///
/// Relays start one at a time and each has registered (or logged its
/// failure to) by the time the next starts, so the directory is complete
/// when this returns.
pub async fn launch_network(config: &DaemonConfig) -> anyhow::Result<Network> {
    let network = &config.network;
    let registry = launch_registry(network, Arc::new(InMemoryDirectory::new())).await?;

    let mut routers = Vec::with_capacity(config.launch.nodes as usize);
    for node_id in 0..config.launch.nodes {
        routers.push(launch_router(node_id, network).await?);
    }

    let mut users = Vec::with_capacity(config.launch.users as usize);
    for user_id in 0..config.launch.users {
        users.push(launch_user(user_id, network).await?);
    }

    info!(
        "Network up: registry on {}, {} relays, {} users",
        registry.addr(),
        routers.len(),
        users.len()
    );
    Ok(Network {
        registry,
        routers,
        users,
    })
}
