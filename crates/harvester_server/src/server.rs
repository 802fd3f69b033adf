//! Router construction and startup.

use std::io;
use std::net::SocketAddr;

use axum::routing::{get, post};
use axum::Router;
use engine_logging::engine_error;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use crate::api::{self, AppState};

/// Routes: `POST /api/summarize` and `GET /health`. Anything else, including
/// another method on a known path, is a 404.
pub fn build_router(state: AppState) -> Router {
    // The agent may post from any origin, browser extensions included.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/summarize", post(api::summarize))
        .route("/health", get(api::health))
        .fallback(api::not_found)
        .method_not_allowed_fallback(api::not_found)
        .with_state(state)
        .layer(cors)
}

/// Bind `bind_addr`, serve `router` in the background and return the bound address.
pub async fn start_server(router: Router, bind_addr: SocketAddr) -> io::Result<SocketAddr> {
    let listener = TcpListener::bind(bind_addr).await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, router).await {
            engine_error!("server stopped: {}", err);
        }
    });

    Ok(addr)
}
