//! Registry role: the public-key directory over HTTP.

use std::convert::Infallible;
use std::sync::Arc;

use shallot_onion::directory::KeyDirectory;
use shallot_types::diagnostics::AckBody;
use shallot_types::network::{NodeRegistryBody, RegisterNodeBody};
use shallot_types::STATUS_LIVE;
use tokio::sync::oneshot;
use tracing::info;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

use crate::config::NetworkConfig;
use crate::error::NodeError;
use crate::http::{self, handle_rejection, json_body, shutdown_signal, with_state, ServerHandle};

/// Shared handle to the directory behind the registry.
pub type SharedDirectory = Arc<dyn KeyDirectory>;

/// All registry routes.
pub fn routes(
    directory: SharedDirectory,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let status = warp::path!("status")
        .and(warp::get())
        .map(|| STATUS_LIVE);

    let register = warp::path!("registerNode")
        .and(warp::post())
        .and(json_body::<RegisterNodeBody>())
        .and(with_state(directory.clone()))
        .and_then(register_node);

    let list = warp::path!("getNodeRegistry")
        .and(warp::get())
        .and(with_state(directory))
        .and_then(get_node_registry);

    status.or(register).or(list)
}

async fn register_node(
    body: RegisterNodeBody,
    directory: SharedDirectory,
) -> Result<Response, Infallible> {
    let node_id = body.node_id;
    http::respond(
        directory
            .register(body)
            .map(|()| {
                info!("Node {} registered", node_id);
                warp::reply::with_status(
                    warp::reply::json(&AckBody {
                        message: "Node registered successfully".to_string(),
                    }),
                    StatusCode::CREATED,
                )
                .into_response()
            })
            .map_err(NodeError::from),
    )
}

async fn get_node_registry(directory: SharedDirectory) -> Result<Response, Infallible> {
    let body = NodeRegistryBody {
        nodes: directory.list(),
    };
    Ok(warp::reply::json(&body).into_response())
}

/// Bind the registry on its configured port and start serving.
pub async fn launch_registry(
    network: &NetworkConfig,
    directory: SharedDirectory,
) -> anyhow::Result<ServerHandle> {
    let addr = network.bind_addr(network.registry_port)?;
    let (tx, rx) = oneshot::channel();
    let (bound, server) = warp::serve(routes(directory).recover(handle_rejection))
        .try_bind_with_graceful_shutdown(addr, shutdown_signal(rx))?;
    info!("Registry listening on {}", bound);
    Ok(ServerHandle::spawn("registry", bound, server, tx))
}
