//! History API route definitions.

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Local;
use serde_json::{json, Value};
use tracing::info;

use super::error::ApiError;
use super::state::AppState;
use crate::history::{HistoryQuery, HistoryRecord, Submission};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/save", post(save))
        .route("/history", get(history))
        .route("/get_history", post(get_history))
        .route("/health", get(health))
}

/// `POST /save`: stamp and append one status change.
async fn save(
    State(state): State<AppState>,
    Json(submission): Json<Submission>,
) -> Result<Json<Value>, ApiError> {
    let entry = submission.validate()?;

    // Board lock first, then the store's: board order follows log order, and
    // stamping under the lock keeps log order chronological.
    let mut update = state.board.begin().await;
    let record = HistoryRecord::stamped(entry, Local::now(), &state.time_format);
    state.store.append(record.clone()).await?;
    let on_board = update.record(&record.cart, &record.status, &record.comment);
    drop(update);

    info!(cart = %record.cart, status = %record.status, on_board, "status change recorded");
    Ok(Json(json!({ "ok": true, "record": record })))
}

/// `GET /history?cart=..&date=..`
async fn history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<HistoryRecord>>, ApiError> {
    lookup(&state, query).await
}

/// `POST /get_history` with a `{cart, date}` body; same lookup as `/history`.
async fn get_history(
    State(state): State<AppState>,
    Json(query): Json<HistoryQuery>,
) -> Result<Json<Vec<HistoryRecord>>, ApiError> {
    lookup(&state, query).await
}

async fn lookup(state: &AppState, query: HistoryQuery) -> Result<Json<Vec<HistoryRecord>>, ApiError> {
    let (cart, date) = query.validate()?;
    Ok(Json(state.store.query(&cart, &date).await?))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
