//! Domain values returned by the rideem API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::http::{opt_int, opt_string};

/// A redeemed promo code.
///
/// `delay` is the number of seconds until the next code becomes available.
/// An empty `code` means nothing was redeemed; the default value also carries
/// a delay of one second.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Code {
    pub code: String,
    pub delay: i64,
}

impl Default for Code {
    fn default() -> Self {
        Self {
            code: String::new(),
            delay: 1,
        }
    }
}

impl Code {
    /// True when no code was redeemed.
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Build a code from a response payload. Absent fields keep their defaults.
    pub fn from_payload(payload: &Map<String, Value>) -> Self {
        let mut code = Self::default();
        if let Some(value) = opt_string(payload, "code") {
            code.code = value;
        }
        if let Some(delay) = opt_int(payload, "delay") {
            code.delay = delay;
        }
        code
    }
}

/// Read the request counter from a `request` response payload; 0 when absent.
pub fn parse_count(payload: &Map<String, Value>) -> i64 {
    opt_int(payload, "count").unwrap_or(0)
}
