//! Bridge Gateway: peer-support matching API for the mobile and web clients.
//! Binds BRIDGE_BIND_ADDR (default 0.0.0.0:8000). Loads `.env` if present.

mod error;
mod routes;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use bridge_core::{Bridge, BridgeConfig, LocalMatcher};
use routes::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = BridgeConfig::from_env();
    let bridge = Bridge::from_config(&config, Arc::new(LocalMatcher::new()));
    let stt = bridge_voice::create_best_stt();
    let state = Arc::new(AppState::new(bridge, Arc::from(stt)));

    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Bridge gateway listening on {}", config.bind_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
}

/// Logs every request/response pair and disables the ngrok interstitial for API clients.
async fn log_requests(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    tracing::info!("<- {} {} from {}", method, path, peer);

    let mut response = next.run(request).await;

    tracing::info!(
        "-> {} {} {} ({}ms)",
        method,
        path,
        response.status().as_u16(),
        start.elapsed().as_millis()
    );
    response.headers_mut().insert(
        "ngrok-skip-browser-warning",
        HeaderValue::from_static("true"),
    );
    response
}
