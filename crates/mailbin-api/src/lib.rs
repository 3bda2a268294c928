//! # mailbin-api
//!
//! HTTP API layer for the `mailbin` mail-testing server.
//!
//! Maps each inbound operation onto message store calls, applies
//! pagination/search rules and inline-content rewriting, and shapes the
//! outbound payloads. The layer is stateless between requests: every
//! request re-reads from the store.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
mod messages;
mod parts;
mod render;
mod ws;

pub use error::{ApiError, ApiResult};
pub use messages::MessagesPage;
pub use render::rewrite_inline_links;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use mailbin_core::{EventBroker, MessageStore};

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    /// The message store owning all persistent state.
    pub store: Arc<MessageStore>,
    /// Change notifier for connected clients.
    pub broker: EventBroker,
    /// Base URL prefix the API is served under, normalized to `/.../`.
    pub webroot: String,
}

impl AppState {
    /// Create the state, normalizing the webroot to a `/`-wrapped prefix.
    #[must_use]
    pub fn new(store: Arc<MessageStore>, broker: EventBroker, webroot: &str) -> Self {
        Self {
            store,
            broker,
            webroot: normalize_webroot(webroot),
        }
    }
}

fn normalize_webroot(webroot: &str) -> String {
    let trimmed = webroot.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}/")
    }
}

/// Build the API router over the given state.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/mailboxes", get(messages::mailbox_stats))
        .route(
            "/api/v1/messages",
            get(messages::list_messages)
                .delete(messages::delete_messages)
                .put(messages::set_read_status),
        )
        .route(
            "/api/v1/messages/:id",
            axum::routing::delete(messages::delete_message).put(messages::unread_message),
        )
        .route("/api/v1/search", get(messages::search_messages))
        .route("/api/v1/message/:id", get(messages::get_message))
        .route("/api/v1/message/:id/part/:part_id", get(parts::download_part))
        .route("/api/v1/message/:id/raw", get(parts::download_raw))
        .route("/view/:name", get(render::view_message))
        .route("/api/v1/events", get(ws::websocket_handler))
        .with_state(state)
}
