//! `mailbin` - mail-testing server with an HTTP API
//!
//! Serves the captured-message API: listing, search, read-state,
//! deletion, attachment/raw retrieval, rendering, and a WebSocket
//! change feed.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

use std::sync::Arc;

use clap::Parser;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mailbin_api::AppState;
use mailbin_core::{EventBroker, MessageStore};

/// Command-line options.
#[derive(Debug, Parser)]
#[command(name = "mailbin", version, about)]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:8025")]
    listen: String,

    /// SQLite database path.
    #[arg(long, default_value = "mailbin.db")]
    database: String,

    /// Base URL path the API is served under.
    #[arg(long, default_value = "/")]
    webroot: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "mailbin=debug,mailbin_api=debug,mailbin_core=debug,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let store = Arc::new(MessageStore::new(&args.database).await?);
    let broker = EventBroker::default();
    let state = AppState::new(store, broker, &args.webroot);

    let app = mailbin_api::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&args.listen).await?;
    info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
