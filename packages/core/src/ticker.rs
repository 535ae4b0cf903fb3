//! Ticker symbols and the messages that carry them.
//!
//! Upstream publishers send either a bare symbol (`"aapl"`) or a small JSON
//! envelope (`{"ticker": "AAPL", "action": "add", "user_id": 7}`).
//! [`parse_ticker_message`] accepts both and always yields a normalised
//! symbol, so everything downstream can assume uppercase, trimmed input.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Longest symbol accepted (covers suffixed listings like `BRK-B` or `7203.T`).
pub const MAX_TICKER_LEN: usize = 16;

pub const DEFAULT_ACTION: &str = "add";

/// A ticker event as published on the pub/sub channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerEvent {
    pub ticker: String,
    #[serde(default = "default_action")]
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
}

fn default_action() -> String {
    DEFAULT_ACTION.to_string()
}

impl TickerEvent {
    /// Build an outgoing event stamped with the current time.
    pub fn new(ticker: String, action: String, user_id: Option<i64>) -> Self {
        Self {
            ticker,
            action,
            user_id,
            timestamp: Some(Utc::now().timestamp_millis() as f64 / 1000.0),
        }
    }
}

/// Trim and uppercase a raw symbol. Returns `None` when the result is empty,
/// too long, or contains characters no exchange symbol uses.
pub fn normalize_ticker(raw: &str) -> Option<String> {
    let ticker = raw.trim().to_ascii_uppercase();

    let valid = !ticker.is_empty()
        && ticker.len() <= MAX_TICKER_LEN
        && ticker
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='));

    valid.then_some(ticker)
}

/// Decode a pub/sub payload into a [`TickerEvent`] with a normalised symbol.
///
/// JSON objects are read as envelopes, JSON strings as the symbol itself, and
/// anything else falls back to the raw text. `None` means there is no usable
/// symbol in the payload.
pub fn parse_ticker_message(payload: &str) -> Option<TickerEvent> {
    let event = match serde_json::from_str::<Value>(payload) {
        Ok(Value::Object(map)) => TickerEvent {
            ticker: map
                .get("ticker")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            action: map
                .get("action")
                .and_then(Value::as_str)
                .unwrap_or(DEFAULT_ACTION)
                .to_string(),
            user_id: map.get("user_id").and_then(Value::as_i64),
            timestamp: map.get("timestamp").and_then(Value::as_f64),
        },
        Ok(Value::String(symbol)) => simple_event(&symbol),
        _ => simple_event(payload),
    };

    let ticker = normalize_ticker(&event.ticker)?;
    Some(TickerEvent { ticker, ..event })
}

fn simple_event(symbol: &str) -> TickerEvent {
    TickerEvent {
        ticker: symbol.to_string(),
        action: default_action(),
        user_id: None,
        timestamp: None,
    }
}
