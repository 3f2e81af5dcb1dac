//! Standalone HTTP server for running the gateway outside Lambda.
//!
//! Every request is collected and handed to the same [`router::handler`]
//! the Lambda runtime uses, so both deployments share one routing table.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lambda_http::Body;
use shared::http::error_response;
use shared::Gateway;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::router;

/// Largest request body accepted by the standalone server.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Router that forwards every request to the gateway handler.
pub fn app(state: Arc<Gateway>) -> axum::Router {
    axum::Router::new().fallback(move |request: axum::extract::Request| {
        let state = Arc::clone(&state);
        async move { forward(state, request).await }
    })
}

async fn forward(state: Arc<Gateway>, request: axum::extract::Request) -> Response {
    let (parts, body) = request.into_parts();

    let bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Failed to read request body: {}", e);
            return local_error(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large");
        }
    };

    let event = lambda_http::Request::from_parts(parts, Body::from(bytes.to_vec()));

    match router::handler(state, event).await {
        Ok(response) => into_axum(response),
        Err(e) => {
            error!("Failed to build response: {}", e);
            local_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
        }
    }
}

fn into_axum(response: lambda_http::Response<Body>) -> Response {
    let (parts, body) = response.into_parts();
    let bytes: &[u8] = body.as_ref();
    Response::from_parts(parts, axum::body::Body::from(bytes.to_vec()))
}

/// Error raised before the router runs, carrying the router's headers.
fn local_error(status: StatusCode, message: &str) -> Response {
    match error_response(status.as_u16(), message)
        .and_then(|response| router::stamp(response, Uuid::new_v4()))
    {
        Ok(response) => into_axum(response),
        Err(e) => {
            error!("Failed to build error response: {}", e);
            status.into_response()
        }
    }
}

/// Serve on `listener` until ctrl-c.
pub async fn serve(listener: TcpListener, state: Arc<Gateway>) -> std::io::Result<()> {
    info!("Gateway listening on {}", listener.local_addr()?);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Shutting down");
        })
        .await
}
