//! AI Gateway - Serves /api/process-text, /api/youtube-recommendations and
//! /api/combined-response.
//!
//! Runs under the Lambda runtime when `AWS_LAMBDA_RUNTIME_API` is set,
//! otherwise binds `0.0.0.0:$PORT`.

use ai_gateway::{handler, server};
use lambda_http::{run, service_fn, Error};
use shared::{Config, Gateway};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .json()
        .init();

    let config = Config::from_env()?;
    let port = config.port;
    let state = Arc::new(Gateway::from_config(config)?);

    if std::env::var_os("AWS_LAMBDA_RUNTIME_API").is_some() {
        info!("Starting under the Lambda runtime");
        return run(service_fn(move |event| {
            let state = Arc::clone(&state);
            async move { handler(state, event).await }
        }))
        .await;
    }

    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    server::serve(listener, state).await?;
    Ok(())
}
