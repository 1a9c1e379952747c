//! User role: build circuits, send onions and receive plaintext.

use std::convert::Infallible;
use std::sync::Arc;

use shallot_onion::circuit::build_circuit;
use shallot_onion::layer::OnionEncoder;
use shallot_onion::OnionError;
use shallot_types::network::{MessageBody, PortLayout, SendMessageBody};
use shallot_types::{NodeId, UserId, ACK_SENT, STATUS_LIVE};
use tokio::sync::oneshot;
use tracing::{debug, info};
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

use crate::client::PeerClient;
use crate::config::NetworkConfig;
use crate::diagnostics::Slot;
use crate::error::NodeError;
use crate::http::{self, handle_rejection, json_body, shutdown_signal, with_state, ServerHandle};

/// Everything one user keeps between requests.
pub struct UserState {
    user_id: UserId,
    layout: PortLayout,
    client: PeerClient,
    last_received: Slot<String>,
    last_sent: Slot<String>,
    last_circuit: Slot<Vec<NodeId>>,
}

impl UserState {
    pub fn new(user_id: UserId, layout: PortLayout, client: PeerClient) -> Self {
        Self {
            user_id,
            layout,
            client,
            last_received: Slot::new(),
            last_sent: Slot::new(),
            last_circuit: Slot::with_value(Vec::new()),
        }
    }

    /// Accept a plaintext delivered by an exit relay.
    pub async fn receive(&self, message: &str) {
        info!("User {} received message: {}", self.user_id, message);
        self.last_received.set(message.to_string()).await;
    }

    /// Route `message` to user `destination` through a fresh circuit.
    ///
    /// The circuit is recorded as soon as it is chosen; the message is
    /// recorded as sent only once the entry relay has acknowledged.
    pub async fn send(&self, message: &str, destination: UserId) -> Result<(), NodeError> {
        let destination_port = self.layout.user_port(destination).ok_or_else(|| {
            NodeError::InvalidRequest(format!("user {destination} has no port in range"))
        })?;

        let nodes = self
            .client
            .get_node_registry(self.layout.registry_port)
            .await?;
        let circuit = build_circuit(&nodes)?;
        self.last_circuit.set(circuit.node_ids()).await;
        debug!(
            "User {} built circuit {:?} to user {}",
            self.user_id,
            circuit.node_ids(),
            destination
        );

        let onion = OnionEncoder::new(self.layout).encode(message, destination_port, &circuit)?;
        let entry = circuit.entry_hop().node_id;
        let entry_port = self.layout.node_port(entry).ok_or_else(|| {
            OnionError::InvalidAddress(format!("node {entry} has no port in range"))
        })?;
        self.client.deliver(entry_port, &onion).await?;

        self.last_sent.set(message.to_string()).await;
        info!("User {} sent message to user {}", self.user_id, destination);
        Ok(())
    }
}

type SharedUser = Arc<UserState>;

/// All user routes.
pub fn routes(state: SharedUser) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let status = warp::path!("status")
        .and(warp::get())
        .map(|| STATUS_LIVE);

    let message = warp::path!("message")
        .and(warp::post())
        .and(json_body::<MessageBody>())
        .and(with_state(state.clone()))
        .and_then(handle_message);

    let send = warp::path!("sendMessage")
        .and(warp::post())
        .and(json_body::<SendMessageBody>())
        .and(with_state(state.clone()))
        .and_then(handle_send_message);

    let received = warp::path!("getLastReceivedMessage")
        .and(warp::get())
        .and(with_state(state.clone()))
        .then(|s: SharedUser| async move { http::result(s.last_received.get().await) });

    let sent = warp::path!("getLastSentMessage")
        .and(warp::get())
        .and(with_state(state.clone()))
        .then(|s: SharedUser| async move { http::result(s.last_sent.get().await) });

    let circuit = warp::path!("getLastCircuit")
        .and(warp::get())
        .and(with_state(state))
        .then(|s: SharedUser| async move { http::result(s.last_circuit.get().await) });

    status
        .or(message)
        .or(send)
        .or(received)
        .or(sent)
        .or(circuit)
}

async fn handle_message(body: MessageBody, state: SharedUser) -> Result<Response, Infallible> {
    let outcome = match body.non_empty() {
        Some(message) => {
            state.receive(message).await;
            Ok(http::ack())
        }
        None => Err(OnionError::MissingMessage.into()),
    };
    http::respond(outcome)
}

async fn handle_send_message(
    body: SendMessageBody,
    state: SharedUser,
) -> Result<Response, Infallible> {
    let message = body.message.as_deref().filter(|m| !m.is_empty());
    let outcome = match (message, body.destination_user_id) {
        (Some(message), Some(destination)) => {
            state.send(message, destination).await.map(|()| http::ack_with(ACK_SENT))
        }
        _ => Err(NodeError::InvalidRequest(
            "message and destinationUserId are required".to_string(),
        )),
    };
    http::respond(outcome)
}

/// Start user `user_id` on its configured port.
pub async fn launch_user(user_id: UserId, network: &NetworkConfig) -> anyhow::Result<ServerHandle> {
    let layout = network.layout();
    let port = layout
        .user_port(user_id)
        .ok_or_else(|| anyhow::anyhow!("user {user_id} has no port in range"))?;
    let addr = network.bind_addr(port)?;

    let state = Arc::new(UserState::new(
        user_id,
        layout,
        PeerClient::new(network.host.clone()),
    ));

    let (tx, rx) = oneshot::channel();
    let (bound, server) = warp::serve(routes(state).recover(handle_rejection))
        .try_bind_with_graceful_shutdown(addr, shutdown_signal(rx))?;
    info!("User {} listening on {}", user_id, bound);
    Ok(ServerHandle::spawn(format!("user {user_id}"), bound, server, tx))
}

#[cfg(test)]
mod tests {
    use shallot_types::diagnostics::{ErrorBody, ResultBody};
    use warp::http::StatusCode;

    use super::*;

    fn user_state() -> SharedUser {
        // Registry port 1 is never bound, so sends fail at the directory.
        let layout = PortLayout {
            registry_port: 1,
            ..PortLayout::default()
        };
        Arc::new(UserState::new(0, layout, PeerClient::new("127.0.0.1")))
    }

    #[tokio::test]
    async fn test_receive_records_message() {
        let filter = routes(user_state()).recover(handle_rejection);

        let res = warp::test::request()
            .method("POST")
            .path("/message")
            .json(&MessageBody::new("hello"))
            .reply(&filter)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.body().as_ref(), b"success");

        let res = warp::test::request()
            .path("/getLastReceivedMessage")
            .reply(&filter)
            .await;
        let body: ResultBody<String> = serde_json::from_slice(res.body()).expect("body");
        assert_eq!(body.result.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn test_receive_requires_message() {
        let filter = routes(user_state()).recover(handle_rejection);
        let res = warp::test::request()
            .method("POST")
            .path("/message")
            .json(&serde_json::json!({}))
            .reply(&filter)
            .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_send_requires_both_fields() {
        let filter = routes(user_state()).recover(handle_rejection);
        for body in [
            serde_json::json!({ "message": "hi" }),
            serde_json::json!({ "destinationUserId": 1 }),
            serde_json::json!({ "message": "", "destinationUserId": 1 }),
        ] {
            let res = warp::test::request()
                .method("POST")
                .path("/sendMessage")
                .json(&body)
                .reply(&filter)
                .await;
            assert_eq!(res.status(), StatusCode::BAD_REQUEST);
            let err: ErrorBody = serde_json::from_slice(res.body()).expect("error");
            assert_eq!(err.error, "message and destinationUserId are required");
        }
    }

    #[tokio::test]
    async fn test_failed_send_leaves_history_untouched() {
        let state = user_state();
        let filter = routes(state.clone()).recover(handle_rejection);
        let res = warp::test::request()
            .method("POST")
            .path("/sendMessage")
            .json(&SendMessageBody::new("hi", 1))
            .reply(&filter)
            .await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(state.last_sent.get().await, None);
        assert_eq!(state.last_circuit.get().await, Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_diagnostics_start_empty() {
        let filter = routes(user_state()).recover(handle_rejection);
        for path in ["/getLastReceivedMessage", "/getLastSentMessage"] {
            let res = warp::test::request().path(path).reply(&filter).await;
            assert_eq!(res.status(), StatusCode::OK);
            assert_eq!(res.body().as_ref(), br#"{"result":null}"#);
        }

        let res = warp::test::request()
            .path("/getLastCircuit")
            .reply(&filter)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.body().as_ref(), br#"{"result":[]}"#);
    }
}
