//! Server-rendered cart board.

use std::collections::HashMap;

use askama::Template;
use axum::extract::State;
use axum::response::Html;
use axum::routing::get;
use axum::{Form, Router};
use chrono::Local;
use tracing::info;

use super::error::ApiError;
use super::state::AppState;
use crate::board::StatusCount;
use crate::history::record::DATE_FORMAT;
use crate::history::{HistoryRecord, ValidSubmission};

struct StatusChoice {
    label: String,
    selected: bool,
}

struct CartRowView {
    name: String,
    comment: String,
    choices: Vec<StatusChoice>,
}

#[derive(Template)]
#[template(path = "index.html")]
struct BoardPage {
    rows: Vec<CartRowView>,
    counts: Vec<StatusCount>,
    carts: Vec<String>,
    today: String,
}

pub fn page_routes() -> Router<AppState> {
    Router::new().route("/", get(show_board).post(update_board))
}

async fn show_board(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    render_board(&state).await
}

/// Apply the board form, log every cart that changed, and re-render.
///
/// The board stays locked while the log is written and only takes the new
/// state once every change is in the log.
async fn update_board(
    State(state): State<AppState>,
    Form(form): Form<HashMap<String, String>>,
) -> Result<Html<String>, ApiError> {
    {
        let mut update = state.board.begin().await;
        let changes = update.plan_form(&form)?;

        let now = Local::now();
        let records: Vec<HistoryRecord> = changes
            .iter()
            .map(|change| {
                let entry = ValidSubmission {
                    cart: change.cart.clone(),
                    status: change.status.clone(),
                    comment: change.comment.clone(),
                };
                HistoryRecord::stamped(entry, now, &state.time_format)
            })
            .collect();

        state.store.append_all(&records).await?;
        update.commit(&changes);
        info!(changed = changes.len(), "board updated");
    }

    render_board(&state).await
}

async fn render_board(state: &AppState) -> Result<Html<String>, ApiError> {
    let snapshot = state.board.snapshot().await;
    let options = state.board.status_options();

    let rows = snapshot
        .rows
        .into_iter()
        .map(|row| CartRowView {
            choices: options
                .iter()
                .map(|option| StatusChoice {
                    label: option.clone(),
                    selected: *option == row.status,
                })
                .collect(),
            name: row.name,
            comment: row.comment,
        })
        .collect();

    let page = BoardPage {
        rows,
        counts: snapshot.counts,
        carts: state.board.carts().to_vec(),
        today: Local::now().format(DATE_FORMAT).to_string(),
    };
    Ok(Html(page.render()?))
}
