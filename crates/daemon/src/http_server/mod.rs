use std::net::SocketAddr;

use axum::Router;
use http::header::{ACCEPT, CONTENT_TYPE, ORIGIN};
use http::Method;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_http::trace::{DefaultOnFailure, DefaultOnResponse};
use tower_http::LatencyUnit;

pub mod api;
pub mod auth;
mod handlers;

use crate::State;

const API_PREFIX: &str = "/api";

/// Run the API HTTP server until the shutdown channel fires.
pub async fn run(
    state: State,
    listen_addr: SocketAddr,
    log_level: tracing::Level,
    mut shutdown_rx: watch::Receiver<()>,
) -> Result<(), HttpServerError> {
    let trace_layer = TraceLayer::new_for_http()
        .on_response(
            DefaultOnResponse::new()
                .include_headers(false)
                .level(log_level)
                .latency_unit(LatencyUnit::Micros),
        )
        .on_failure(DefaultOnFailure::new().latency_unit(LatencyUnit::Micros));

    let cors_layer = CorsLayer::new()
        .allow_methods(vec![Method::GET, Method::POST, Method::PUT])
        .allow_headers(vec![
            ACCEPT,
            CONTENT_TYPE,
            ORIGIN,
            http::HeaderName::from_static(auth::SESSION_HEADER),
        ])
        .allow_origin(Any)
        .allow_credentials(false);

    let router = Router::new()
        .nest(API_PREFIX, api::router(state.clone()))
        .fallback(handlers::not_found_handler)
        .with_state(state)
        .layer(cors_layer)
        .layer(trace_layer);

    tracing::info!(addr = ?listen_addr, "API server listening");
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
        })
        .await?;

    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum HttpServerError {
    #[error("an error occurred running the HTTP server: {0}")]
    ServingFailed(#[from] std::io::Error),
}
