//! cartlog -- status-change history for a fleet of named carts.
//!
//! This crate provides the JSON-file history store, the in-memory cart board,
//! configuration, and the axum HTTP service that ties them together.

pub mod api;
pub mod board;
pub mod config;
pub mod history;

use anyhow::{Context, Result};

use crate::config::CartlogConfig;

/// Open the history store, build the board, and serve HTTP until shutdown.
pub async fn serve(config: CartlogConfig) -> Result<()> {
    let history_path = config.storage.history_path();
    tracing::info!(path = %history_path.display(), "Opening history store");
    let store = history::HistoryStore::open(&history_path).await?;

    let board = board::CartBoard::from_config(&config.board);
    let state = api::state::AppState::new(store, board, config.time_format()?);
    let app = api::router(state, &config.server.static_dir);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(%addr, static_dir = %config.server.static_dir.display(), "cartlog listening on http://{addr}");
    axum::serve(listener, app).await?;

    Ok(())
}
