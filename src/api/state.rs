use std::sync::Arc;

use crate::board::CartBoard;
use crate::history::{HistoryStore, TimeFormat};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<HistoryStore>,
    pub board: Arc<CartBoard>,
    pub time_format: TimeFormat,
}

impl AppState {
    pub fn new(store: HistoryStore, board: CartBoard, time_format: TimeFormat) -> Self {
        Self {
            store: Arc::new(store),
            board: Arc::new(board),
            time_format,
        }
    }
}
