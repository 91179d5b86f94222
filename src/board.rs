//! In-memory cart board: the current status and comment of every cart.
//!
//! The board is what the index page renders. It lives in process memory only
//! and starts over from the configured default status on restart; the
//! durable record of changes is the history log.
//!
//! Mutations go through a [`BoardUpdate`], which holds the board's write lock
//! while the caller persists the change. State is only committed after the
//! history log accepted it, so a failed write leaves the board untouched.

use std::collections::HashMap;

use thiserror::Error;
use tokio::sync::{RwLock, RwLockWriteGuard};

use crate::config::BoardConfig;

/// Form field prefix carrying a cart's status, e.g. `status_Cart 4`.
pub const STATUS_FIELD_PREFIX: &str = "status_";
/// Form field prefix carrying a cart's comment, e.g. `comment_Cart 4`.
pub const COMMENT_FIELD_PREFIX: &str = "comment_";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("unknown status {status:?} for {cart}")]
    UnknownStatus { cart: String, status: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartState {
    pub status: String,
    pub comment: String,
}

/// A cart whose state is changed by a board update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartChange {
    pub cart: String,
    pub status: String,
    pub comment: String,
}

/// One row of the board as rendered.
#[derive(Debug, Clone)]
pub struct CartRow {
    pub name: String,
    pub status: String,
    pub comment: String,
}

/// Number of carts currently in one status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCount {
    pub status: String,
    pub count: usize,
}

/// Point-in-time copy of the board.
#[derive(Debug, Clone)]
pub struct BoardSnapshot {
    pub rows: Vec<CartRow>,
    pub counts: Vec<StatusCount>,
}

pub struct CartBoard {
    carts: Vec<String>,
    status_options: Vec<String>,
    states: RwLock<HashMap<String, CartState>>,
}

impl CartBoard {
    pub fn from_config(config: &BoardConfig) -> Self {
        let carts = config.cart_names();
        let states = carts
            .iter()
            .map(|cart| {
                (
                    cart.clone(),
                    CartState {
                        status: config.default_status.clone(),
                        comment: String::new(),
                    },
                )
            })
            .collect();

        Self {
            carts,
            status_options: config.status_options.clone(),
            states: RwLock::new(states),
        }
    }

    pub fn carts(&self) -> &[String] {
        &self.carts
    }

    pub fn status_options(&self) -> &[String] {
        &self.status_options
    }

    fn is_known_status(&self, status: &str) -> bool {
        self.status_options.iter().any(|s| s == status)
    }

    pub async fn state(&self, cart: &str) -> Option<CartState> {
        self.states.read().await.get(cart).cloned()
    }

    /// Rows in board order plus per-status counts.
    pub async fn snapshot(&self) -> BoardSnapshot {
        let states = self.states.read().await;

        let rows: Vec<CartRow> = self
            .carts
            .iter()
            .filter_map(|cart| {
                states.get(cart).map(|s| CartRow {
                    name: cart.clone(),
                    status: s.status.clone(),
                    comment: s.comment.clone(),
                })
            })
            .collect();

        let counts = self
            .status_options
            .iter()
            .map(|option| StatusCount {
                status: option.clone(),
                count: rows.iter().filter(|r| &r.status == option).count(),
            })
            .collect();

        BoardSnapshot { rows, counts }
    }

    /// Take exclusive access to the board until the returned update is dropped.
    pub async fn begin(&self) -> BoardUpdate<'_> {
        BoardUpdate {
            board: self,
            states: self.states.write().await,
        }
    }
}

// ---------------------------------------------------------------------------
// BoardUpdate
// ---------------------------------------------------------------------------

/// Exclusive, two-phase access to the board: plan, persist, then commit.
pub struct BoardUpdate<'a> {
    board: &'a CartBoard,
    states: RwLockWriteGuard<'a, HashMap<String, CartState>>,
}

impl BoardUpdate<'_> {
    /// Work out which carts a submitted board form changes, without applying it.
    ///
    /// Fields are `status_<cart>` and `comment_<cart>`. Carts missing from the
    /// form keep their state. The whole form is rejected if any status is not
    /// one of the configured options.
    pub fn plan_form(&self, form: &HashMap<String, String>) -> Result<Vec<CartChange>, BoardError> {
        let mut changes = Vec::new();

        for cart in &self.board.carts {
            let status = form.get(&format!("{STATUS_FIELD_PREFIX}{cart}"));
            if let Some(status) = status {
                if !self.board.is_known_status(status) {
                    return Err(BoardError::UnknownStatus {
                        cart: cart.clone(),
                        status: status.clone(),
                    });
                }
            }

            let Some(current) = self.states.get(cart) else {
                continue;
            };
            let comment = form.get(&format!("{COMMENT_FIELD_PREFIX}{cart}"));
            let status = status.unwrap_or(&current.status);
            let comment = comment.unwrap_or(&current.comment);

            if *status != current.status || *comment != current.comment {
                changes.push(CartChange {
                    cart: cart.clone(),
                    status: status.clone(),
                    comment: comment.clone(),
                });
            }
        }

        Ok(changes)
    }

    /// Apply planned changes. Carts not on the board are skipped.
    pub fn commit(&mut self, changes: &[CartChange]) {
        for change in changes {
            if let Some(state) = self.states.get_mut(&change.cart) {
                state.status = change.status.clone();
                state.comment = change.comment.clone();
            }
        }
    }

    /// Mirror a history submission onto the board.
    ///
    /// Only carts on the board with a configured status are tracked; returns
    /// whether the board was updated.
    pub fn record(&mut self, cart: &str, status: &str, comment: &str) -> bool {
        if !self.board.is_known_status(status) {
            return false;
        }
        match self.states.get_mut(cart) {
            Some(state) => {
                state.status = status.to_string();
                state.comment = comment.to_string();
                true
            }
            None => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
