//! History record model, client submissions, and server-side timestamping.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Calendar date format stored in every record (ISO 8601).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Default time-of-day format stored in every record.
pub const DEFAULT_TIME_FORMAT: &str = "%H:%M:%S";

// ---------------------------------------------------------------------------
// HistoryRecord
// ---------------------------------------------------------------------------

/// One immutable entry in the cart history log.
///
/// The legacy field names (`carrito`, `estatus`, `comentario`, `fecha`,
/// `hora`) are accepted when reading so older log files stay readable; records
/// are always written back with the canonical names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    #[serde(alias = "carrito")]
    pub cart: String,
    #[serde(alias = "estatus")]
    pub status: String,
    #[serde(default, alias = "comentario")]
    pub comment: String,
    /// Calendar date of the submission, `YYYY-MM-DD`.
    #[serde(alias = "fecha")]
    pub date: String,
    /// Local time-of-day of the submission.
    #[serde(alias = "hora")]
    pub time: String,
}

impl HistoryRecord {
    /// Build a record from a validated submission, stamped with `at`.
    pub fn stamped(entry: ValidSubmission, at: DateTime<Local>, time_format: &TimeFormat) -> Self {
        Self {
            cart: entry.cart,
            status: entry.status,
            comment: entry.comment,
            date: at.format(DATE_FORMAT).to_string(),
            time: time_format.format(&at),
        }
    }

    /// Whether this record belongs to `cart` on `date` (exact match on both).
    pub fn matches(&self, cart: &str, date: &str) -> bool {
        self.cart == cart && self.date == date
    }

    /// One-line rendering used by the CLI and the browser client.
    pub fn display_line(&self) -> String {
        format!("[{}] {} - {}", self.time, self.status, self.comment)
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Required request fields that were absent or blank.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing required fields: {}", .0.join(", "))]
pub struct MissingFields(pub Vec<&'static str>);

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// A status change as sent by a client, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Submission {
    #[serde(default, alias = "carrito")]
    pub cart: Option<String>,
    #[serde(default, alias = "estatus")]
    pub status: Option<String>,
    #[serde(default, alias = "comentario")]
    pub comment: Option<String>,
}

/// A submission whose required fields are known to be present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSubmission {
    pub cart: String,
    pub status: String,
    pub comment: String,
}

impl Submission {
    pub fn validate(self) -> Result<ValidSubmission, MissingFields> {
        match (present(self.cart), present(self.status)) {
            (Some(cart), Some(status)) => Ok(ValidSubmission {
                cart,
                status,
                comment: self.comment.unwrap_or_default(),
            }),
            (cart, status) => {
                let mut missing = Vec::new();
                if cart.is_none() {
                    missing.push("cart");
                }
                if status.is_none() {
                    missing.push("status");
                }
                Err(MissingFields(missing))
            }
        }
    }
}

/// Filter for a history lookup, from a query string or a JSON body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    #[serde(default, alias = "carrito")]
    pub cart: Option<String>,
    #[serde(default, alias = "fecha")]
    pub date: Option<String>,
}

impl HistoryQuery {
    /// Returns `(cart, date)` or the names of the missing parameters.
    pub fn validate(self) -> Result<(String, String), MissingFields> {
        match (present(self.cart), present(self.date)) {
            (Some(cart), Some(date)) => Ok((cart, date)),
            (cart, date) => {
                let mut missing = Vec::new();
                if cart.is_none() {
                    missing.push("cart");
                }
                if date.is_none() {
                    missing.push("date");
                }
                Err(MissingFields(missing))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// TimeFormat
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
#[error("invalid time format {0:?}")]
pub struct InvalidTimeFormat(pub String);

/// A strftime pattern checked up front, so formatting never fails later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeFormat(String);

impl TimeFormat {
    pub fn new(pattern: impl Into<String>) -> Result<Self, InvalidTimeFormat> {
        let pattern = pattern.into();
        if pattern.is_empty() || StrftimeItems::new(&pattern).any(|item| matches!(item, Item::Error)) {
            return Err(InvalidTimeFormat(pattern));
        }
        Ok(Self(pattern))
    }

    pub fn format(&self, at: &DateTime<Local>) -> String {
        at.format(&self.0).to_string()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TimeFormat {
    fn default() -> Self {
        Self(DEFAULT_TIME_FORMAT.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 14, h, m, s).single().unwrap()
    }

    #[test]
    fn test_stamped_record_uses_server_clock() {
        let entry = Submission {
            cart: Some("Cart 3".into()),
            status: Some("Charging".into()),
            comment: None,
        }
        .validate()
        .unwrap();

        let record = HistoryRecord::stamped(entry, at(9, 5, 7), &TimeFormat::default());

        assert_eq!(record.cart, "Cart 3");
        assert_eq!(record.status, "Charging");
        assert_eq!(record.comment, "");
        assert_eq!(record.date, "2026-03-14");
        assert_eq!(record.time, "09:05:07");
    }

    #[test]
    fn test_submission_reports_every_missing_field() {
        let err = Submission::default().validate().unwrap_err();
        assert_eq!(err, MissingFields(vec!["cart", "status"]));
        assert_eq!(err.to_string(), "missing required fields: cart, status");

        let err = Submission {
            cart: Some("Cart 1".into()),
            status: Some("   ".into()),
            comment: Some("note".into()),
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, MissingFields(vec!["status"]));
    }

    #[test]
    fn test_query_requires_cart_and_date() {
        let q = HistoryQuery {
            cart: Some("Cart 1".into()),
            date: None,
        };
        assert_eq!(q.validate().unwrap_err(), MissingFields(vec!["date"]));

        let q = HistoryQuery {
            cart: Some("Cart 1".into()),
            date: Some("2026-03-14".into()),
        };
        assert_eq!(
            q.validate().unwrap(),
            ("Cart 1".to_string(), "2026-03-14".to_string())
        );
    }

    #[test]
    fn test_legacy_field_names_are_accepted() {
        let json = r#"{"carrito":"Cart 9","estatus":"Other","comentario":"flat tire","fecha":"2025-07-01","hora":"4:12:00 PM"}"#;
        let record: HistoryRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.cart, "Cart 9");
        assert_eq!(record.comment, "flat tire");
        assert_eq!(record.time, "4:12:00 PM");

        // Written back under the canonical names.
        let out = serde_json::to_value(&record).unwrap();
        assert_eq!(out["cart"], "Cart 9");
        assert!(out.get("carrito").is_none());

        let sub: Submission = serde_json::from_str(r#"{"carrito":"Cart 2","estatus":"Charging"}"#).unwrap();
        assert_eq!(sub.cart.as_deref(), Some("Cart 2"));
        assert!(sub.comment.is_none());
    }

    #[test]
    fn test_display_line() {
        let record = HistoryRecord {
            cart: "Cart 1".into(),
            status: "Out of Service".into(),
            comment: "battery".into(),
            date: "2026-03-14".into(),
            time: "10:00:00".into(),
        };
        assert_eq!(record.display_line(), "[10:00:00] Out of Service - battery");
        assert!(record.matches("Cart 1", "2026-03-14"));
        assert!(!record.matches("Cart 1", "2026-03-15"));
        assert!(!record.matches("Cart 10", "2026-03-14"));
    }

    #[test]
    fn test_time_format_validation() {
        assert!(TimeFormat::new("%I:%M:%S %p").is_ok());
        assert!(TimeFormat::new("%Q").is_err());
        assert!(TimeFormat::new("").is_err());
        assert_eq!(
            TimeFormat::new("%I:%M %p").unwrap().format(&at(16, 30, 0)),
            "04:30 PM"
        );
    }
}
