//! Outbound HTTP calls between roles.

use serde::de::DeserializeOwned;
use shallot_onion::OnionError;
use shallot_types::diagnostics::ResultBody;
use shallot_types::network::{MessageBody, NodeIdentity, NodeRegistryBody, SendMessageBody};
use shallot_types::UserId;

use crate::error::NodeError;

/// HTTP client addressing every role on one host by port.
#[derive(Clone, Debug)]
pub struct PeerClient {
    host: String,
    client: reqwest::Client,
}

impl PeerClient {
    /// Create a client for roles listening on `host`.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, port: u16, path: &str) -> String {
        format!("http://{}:{}/{}", self.host, port, path)
    }

    /// Publish a relay identity to the registry.
    pub async fn register_node(
        &self,
        registry_port: u16,
        identity: &NodeIdentity,
    ) -> Result<(), NodeError> {
        self.client
            .post(self.url(registry_port, "registerNode"))
            .json(identity)
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(|e| NodeError::Registry(e.to_string()))?;
        Ok(())
    }

    /// Fetch the registry snapshot.
    pub async fn get_node_registry(
        &self,
        registry_port: u16,
    ) -> Result<Vec<NodeIdentity>, NodeError> {
        let body: NodeRegistryBody = self
            .client
            .get(self.url(registry_port, "getNodeRegistry"))
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(|e| NodeError::Registry(e.to_string()))?
            .json()
            .await
            .map_err(|e| NodeError::Registry(e.to_string()))?;
        Ok(body.nodes)
    }

    /// POST `message` to the `/message` endpoint on `port`.
    ///
    /// Any transport failure or non-2xx reply is a forwarding failure.
    pub async fn deliver(&self, port: u16, message: &str) -> Result<(), OnionError> {
        self.client
            .post(self.url(port, "message"))
            .json(&MessageBody::new(message))
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(|e| OnionError::Forward(format!("port {port}: {e}")))?;
        Ok(())
    }

    /// Ask the user on `port` to send `message` to `destination`.
    pub async fn send_message(
        &self,
        port: u16,
        message: &str,
        destination: UserId,
    ) -> reqwest::Result<reqwest::Response> {
        self.client
            .post(self.url(port, "sendMessage"))
            .json(&SendMessageBody::new(message, destination))
            .send()
            .await
    }

    /// Liveness probe.
    pub async fn status(&self, port: u16) -> reqwest::Result<String> {
        self.client
            .get(self.url(port, "status"))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }

    /// Read a `{ "result": ... }` diagnostic getter.
    pub async fn get_result<T: DeserializeOwned>(
        &self,
        port: u16,
        path: &str,
    ) -> reqwest::Result<Option<T>> {
        let body: ResultBody<T> = self
            .client
            .get(self.url(port, path))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(body.result)
    }
}
