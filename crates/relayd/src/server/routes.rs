//! HTTP routes: the landing page and the WebSocket endpoint.

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use relay_core::PeerConfig;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::hub::HubHandle;
use crate::peer::Peer;
use crate::transport::websocket;

/// Landing page served when no `home_page` is configured.
pub const BUNDLED_HOME_PAGE: &str = include_str!("../../resources/home.html");

/// Shared state passed to axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub hub: HubHandle,
    pub peer: PeerConfig,
    pub home_page: Option<Arc<PathBuf>>,
}

impl AppState {
    pub fn new(hub: HubHandle, peer: PeerConfig, home_page: Option<PathBuf>) -> Self {
        Self {
            hub,
            peer,
            home_page: home_page.map(Arc::new),
        }
    }
}

/// Builds the router: `/` and `/ws` on GET, 404 for everything else.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home_handler))
        .route("/ws", get(ws_handler))
        .fallback(not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not found")
}

/// Serves the configured landing page, or the bundled one.
async fn home_handler(State(state): State<AppState>) -> Response {
    let Some(path) = state.home_page.as_deref() else {
        return Html(BUNDLED_HOME_PAGE).into_response();
    };

    match tokio::fs::read_to_string(path).await {
        Ok(body) => Html(body).into_response(),
        Err(e) => {
            error!(path = %path.display(), error = %e, "Failed to read home page");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to load home page").into_response()
        }
    }
}

/// WebSocket upgrade handler.
///
/// A failed handshake never creates a peer; the client gets axum's
/// rejection response.
async fn ws_handler(
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    State(state): State<AppState>,
) -> Response {
    let upgrade = match upgrade {
        Ok(upgrade) => upgrade,
        Err(rejection) => {
            warn!(error = %rejection, "Rejected WebSocket upgrade");
            return rejection.into_response();
        }
    };

    let max_size = state.peer.max_message_size;
    upgrade
        .max_message_size(max_size)
        .max_frame_size(max_size)
        .on_failed_upgrade(|e: axum::Error| warn!(error = %e, "WebSocket upgrade failed"))
        .on_upgrade(move |socket| handle_socket(socket, state))
}

/// Registers the upgraded connection and runs it until teardown.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let registration = match state.hub.register().await {
        Ok(registration) => registration,
        Err(e) => {
            warn!(error = %e, "Refusing connection");
            // Dropping the socket closes the connection
            return;
        }
    };

    let peer = Peer::new(registration, state.hub.clone(), state.peer);
    info!(peer_id = %peer.id(), "WebSocket client connected");

    let (reader, writer) = websocket::split(socket);
    let peer_id = peer.id().clone();
    let reason = peer.run(reader, writer).await;

    debug!(peer_id = %peer_id, reason = %reason, "WebSocket client finished");
}
