//! Mapping of handler failures onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::board::BoardError;
use crate::history::{HistoryError, MissingFields};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] MissingFields),

    #[error(transparent)]
    Board(#[from] BoardError),

    #[error(transparent)]
    Storage(#[from] HistoryError),

    #[error("failed to render page: {0}")]
    Render(#[from] askama::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(_) | Self::Board(_) => {
                (StatusCode::BAD_REQUEST, self.to_string()).into_response()
            }
            Self::Storage(_) | Self::Render(_) => {
                tracing::error!(error = %self, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
        }
    }
}
