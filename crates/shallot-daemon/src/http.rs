//! Shared HTTP plumbing for every role.
//!
//! Replies, error mapping, rejection recovery and the handle that owns a
//! running server task.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;

use serde::de::DeserializeOwned;
use shallot_types::diagnostics::{ErrorBody, ResultBody};
use shallot_types::ACK_SUCCESS;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

use crate::error::NodeError;

/// Largest request body accepted by any role.
pub const MAX_BODY_BYTES: u64 = 1024 * 1024;

/// An error reply: status code plus `{ "error": ... }` body.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    /// 400.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    /// 500.
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }

    pub fn into_response(self) -> Response {
        warp::reply::with_status(
            warp::reply::json(&ErrorBody {
                error: self.message,
            }),
            self.status,
        )
        .into_response()
    }
}

impl From<NodeError> for ApiError {
    fn from(err: NodeError) -> Self {
        if err.is_client_error() {
            Self::bad_request(err.to_string())
        } else {
            Self::internal_error(err.to_string())
        }
    }
}

/// 200 with the plain-text `success` body.
pub fn ack() -> Response {
    ack_with(ACK_SUCCESS)
}

/// 200 with a plain-text acknowledgement.
pub fn ack_with(text: &'static str) -> Response {
    warp::reply::with_status(text, StatusCode::OK).into_response()
}

/// 200 with `{ "result": value-or-null }`.
pub fn result<T: serde::Serialize>(value: Option<T>) -> Response {
    warp::reply::json(&ResultBody::new(value)).into_response()
}

/// Turn a handler outcome into a reply.
pub fn respond(outcome: Result<Response, NodeError>) -> Result<Response, Infallible> {
    Ok(match outcome {
        Ok(reply) => reply,
        Err(err) => {
            warn!("Request failed: {}", err);
            ApiError::from(err).into_response()
        }
    })
}

/// Inject shared state into a handler.
pub fn with_state<S: Clone + Send + Sync>(state: S) -> impl Filter<Extract = (S,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

/// Bounded JSON request body.
pub fn json_body<T: DeserializeOwned + Send>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone {
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

/// Map rejections that escaped every route to JSON errors.
pub async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    let error = if err.is_not_found() {
        ApiError {
            status: StatusCode::NOT_FOUND,
            message: "not found".to_string(),
        }
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        ApiError::bad_request(format!("invalid body: {e}"))
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        ApiError {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            message: "body too large".to_string(),
        }
    } else if err.find::<warp::reject::LengthRequired>().is_some() {
        ApiError {
            status: StatusCode::LENGTH_REQUIRED,
            message: "content-length required".to_string(),
        }
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        ApiError {
            status: StatusCode::METHOD_NOT_ALLOWED,
            message: "method not allowed".to_string(),
        }
    } else {
        debug!("Unhandled rejection: {:?}", err);
        ApiError::internal_error("unhandled rejection")
    };
    Ok(error.into_response())
}

/// A running server task and the means to stop it.
pub struct ServerHandle {
    name: String,
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl ServerHandle {
    /// Spawn a bound server future onto the runtime.
    pub fn spawn<F>(name: impl Into<String>, addr: SocketAddr, server: F, shutdown: oneshot::Sender<()>) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            name: name.into(),
            addr,
            shutdown: Some(shutdown),
            task: tokio::spawn(server),
        }
    }

    /// Bound address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting connections and wait for in-flight requests.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Err(e) = self.task.await {
            warn!("{} stopped abnormally: {}", self.name, e);
        }
    }
}

/// Future resolving when the paired sender fires or is dropped.
pub async fn shutdown_signal(rx: oneshot::Receiver<()>) {
    let _ = rx.await;
}

#[cfg(test)]
mod tests {
    use shallot_onion::OnionError;

    use super::*;

    #[test]
    fn test_status_mapping() {
        let err = ApiError::from(NodeError::from(OnionError::MissingMessage));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err = ApiError::from(NodeError::from(OnionError::Decryption("x".into())));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);

        let err = ApiError::from(NodeError::from(OnionError::InsufficientNodes {
            need: 3,
            have: 1,
        }));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.message.contains("insufficient nodes"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let filter = warp::post()
            .and(json_body::<serde_json::Value>())
            .map(|_| ack())
            .recover(handle_rejection);

        let res = warp::test::request()
            .method("POST")
            .path("/")
            .header("content-type", "application/json")
            .body("{not json")
            .reply(&filter)
            .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: ErrorBody = serde_json::from_slice(res.body()).expect("error body");
        assert!(body.error.starts_with("invalid body"));
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let filter = warp::path!("status")
            .map(|| "live")
            .recover(handle_rejection);
        let res = warp::test::request().path("/nope").reply(&filter).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
