//! Relay role: peel one layer and forward the rest.

use std::convert::Infallible;
use std::sync::Arc;

use shallot_onion::relay::RelayKeys;
use shallot_onion::OnionError;
use shallot_types::network::MessageBody;
use shallot_types::{NodeId, STATUS_LIVE};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

use crate::client::PeerClient;
use crate::config::NetworkConfig;
use crate::diagnostics::Slot;
use crate::error::NodeError;
use crate::http::{self, handle_rejection, json_body, shutdown_signal, with_state, ServerHandle};

/// Everything one relay keeps between requests.
pub struct RouterState {
    keys: RelayKeys,
    client: PeerClient,
    last_encrypted: Slot<String>,
    last_decrypted: Slot<String>,
    last_destination: Slot<u16>,
}

impl RouterState {
    pub fn new(keys: RelayKeys, client: PeerClient) -> Self {
        Self {
            keys,
            client,
            last_encrypted: Slot::new(),
            last_decrypted: Slot::new(),
            last_destination: Slot::new(),
        }
    }

    pub fn keys(&self) -> &RelayKeys {
        &self.keys
    }

    /// Peel this relay's layer from `message` and hand the remainder on.
    ///
    /// Returns once the next hop has acknowledged, so a failure anywhere
    /// downstream surfaces here.
    pub async fn relay(&self, message: &str) -> Result<(), NodeError> {
        if message.is_empty() {
            return Err(OnionError::MissingMessage.into());
        }
        self.last_encrypted.set(message.to_string()).await;

        let peeled = self.keys.peel(message)?;
        self.last_decrypted.set(peeled.remainder.clone()).await;
        self.last_destination.set(peeled.destination_port).await;

        debug!(
            "Node {} forwarding to port {}",
            self.keys.node_id(),
            peeled.destination_port
        );
        self.client
            .deliver(peeled.destination_port, &peeled.remainder)
            .await?;
        Ok(())
    }
}

type SharedRouter = Arc<RouterState>;

/// All relay routes.
pub fn routes(state: SharedRouter) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let status = warp::path!("status")
        .and(warp::get())
        .map(|| STATUS_LIVE);

    let message = warp::path!("message")
        .and(warp::post())
        .and(json_body::<MessageBody>())
        .and(with_state(state.clone()))
        .and_then(handle_message);

    let encrypted = warp::path!("getLastReceivedEncryptedMessage")
        .and(warp::get())
        .and(with_state(state.clone()))
        .then(|s: SharedRouter| async move { http::result(s.last_encrypted.get().await) });

    let decrypted = warp::path!("getLastReceivedDecryptedMessage")
        .and(warp::get())
        .and(with_state(state.clone()))
        .then(|s: SharedRouter| async move { http::result(s.last_decrypted.get().await) });

    let destination = warp::path!("getLastMessageDestination")
        .and(warp::get())
        .and(with_state(state.clone()))
        .then(|s: SharedRouter| async move { http::result(s.last_destination.get().await) });

    let private_key = warp::path!("getPrivateKey")
        .and(warp::get())
        .and(with_state(state))
        .map(|s: SharedRouter| http::result(Some(s.keys.export_private_key())));

    status
        .or(message)
        .or(encrypted)
        .or(decrypted)
        .or(destination)
        .or(private_key)
}

async fn handle_message(body: MessageBody, state: SharedRouter) -> Result<Response, Infallible> {
    let outcome = match body.non_empty() {
        Some(message) => state.relay(message).await.map(|()| http::ack()),
        None => Err(OnionError::MissingMessage.into()),
    };
    http::respond(outcome)
}

/// Start relay `node_id` with a fresh keypair and register it.
///
/// The relay is listening before it registers, so it can accept traffic
/// as soon as any user sees it in the directory. A failed registration is
/// logged and the relay keeps running.
pub async fn launch_router(node_id: NodeId, network: &NetworkConfig) -> anyhow::Result<ServerHandle> {
    let layout = network.layout();
    let port = layout
        .node_port(node_id)
        .ok_or_else(|| anyhow::anyhow!("node {node_id} has no port in range"))?;
    let addr = network.bind_addr(port)?;

    let client = PeerClient::new(network.host.clone());
    let state = Arc::new(RouterState::new(RelayKeys::generate(node_id), client.clone()));
    let identity = state.keys().identity();

    let (tx, rx) = oneshot::channel();
    let (bound, server) = warp::serve(routes(state).recover(handle_rejection))
        .try_bind_with_graceful_shutdown(addr, shutdown_signal(rx))?;
    let handle = ServerHandle::spawn(format!("node {node_id}"), bound, server, tx);
    info!("Onion router {} listening on {}", node_id, bound);

    match client.register_node(layout.registry_port, &identity).await {
        Ok(()) => info!("Node {} registered with the registry", node_id),
        Err(e) => warn!("Failed to register node {}: {}", node_id, e),
    }
    Ok(handle)
}
