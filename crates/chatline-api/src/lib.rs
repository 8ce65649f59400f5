//! Streaming HTTP proxy for the chat client.
//!
//! Keeps the server API key off the client: session issuance, message sends
//! and raw API calls all pass through here with the credential injected, and
//! the client library's own bundle is served with its upstream origins
//! rewritten to point back at this server.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod proxy;
pub mod routes;
pub mod state;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use handlers::{assets, chat, openai, session};
use routes::health;
use state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health
        .route("/health", get(health::health_check))
        // Chat
        .route("/api/chat", post(chat::send_message))
        .route("/api/create-session", post(session::create_session))
        // Pass-through proxies
        .route(
            "/api/proxy/openai/*path",
            get(openai::proxy_api)
                .post(openai::proxy_api)
                .options(openai::preflight),
        )
        .route(
            "/api/proxy/chatkit/*path",
            get(assets::proxy_asset).options(assets::preflight),
        )
        .layer(axum_middleware::from_fn(middleware::logging::log_request))
        // text/event-stream is excluded by the default predicate
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
