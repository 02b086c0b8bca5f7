//! HTTP request/response types and the response decoder.
//!
//! # Design
//! `HttpRequest` and `HttpResponse` describe one round trip as plain data, so
//! the transport can be swapped for a stub in tests. `Response` is the decoded
//! form every task consumes: a status and a JSON object payload. Decoding
//! never fails; a body that cannot be read as a JSON object degrades to an
//! empty payload with status 500.

use serde_json::{Map, Value};

use crate::error::Error;

/// Status used when the round trip or the body parse failed.
pub const FAILURE_STATUS: u16 = 500;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// An HTTP request described as plain data.
///
/// Built by `Rideem::build_*`. Neither remote operation sends a body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
}

/// A raw HTTP response as read off the wire.
///
/// `body` is `None` when the server sent no entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// A decoded response: status plus JSON object payload.
///
/// When the round trip or the parse failed, `status` is 500, `payload` is
/// empty, and the cause is kept for the propagating call path.
#[derive(Debug)]
pub struct Response {
    pub payload: Map<String, Value>,
    pub status: u16,
    failure: Option<Error>,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            payload: Map::new(),
            status: FAILURE_STATUS,
            failure: None,
        }
    }
}

impl Response {
    /// The sentinel response for a failed round trip.
    pub fn failed(error: Error) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    /// Decode a raw response.
    ///
    /// An absent or blank body keeps the server's status with an empty
    /// payload. A body that is not a JSON object yields the failure sentinel.
    pub fn decode(raw: HttpResponse) -> Self {
        let body = match raw.body {
            Some(body) if !body.trim().is_empty() => body,
            _ => {
                return Self {
                    status: raw.status,
                    ..Self::default()
                }
            }
        };

        match serde_json::from_str::<Value>(&body) {
            Ok(Value::Object(payload)) => Self {
                payload,
                status: raw.status,
                failure: None,
            },
            Ok(other) => Self::failed(Error::Decode(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
            Err(e) => Self::failed(Error::Decode(e.to_string())),
        }
    }

    /// Whether this response is the failure sentinel rather than a server reply.
    pub fn is_failure(&self) -> bool {
        self.failure.is_some()
    }

    /// Hand back the payload, or the failure that replaced it.
    pub fn into_payload(self) -> Result<Map<String, Value>, Error> {
        match self.failure {
            Some(error) => Err(error),
            None => Ok(self.payload),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Read an integer field the way a loosely typed JSON accessor does.
///
/// Numbers are truncated, numeric strings are parsed, anything else is 0.
/// Returns `None` only when the field is absent.
pub(crate) fn opt_int(payload: &Map<String, Value>, field: &str) -> Option<i64> {
    let value = payload.get(field)?;
    let n = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
                .unwrap_or(0)
        }
        _ => 0,
    };
    Some(n)
}

/// Read a string field; non-string values are rendered as JSON text.
pub(crate) fn opt_string(payload: &Map<String, Value>, field: &str) -> Option<String> {
    match payload.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => Some(String::new()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(status: u16, body: Option<&str>) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.map(str::to_string),
        }
    }

    #[test]
    fn default_response_is_failure_status_with_empty_payload() {
        let resp = Response::default();
        assert_eq!(resp.status, 500);
        assert!(resp.payload.is_empty());
        assert!(!resp.is_failure());
    }

    #[test]
    fn decode_object_body() {
        let resp = Response::decode(raw(200, Some(r#"{"code":"ABC","delay":5}"#)));
        assert_eq!(resp.status, 200);
        assert_eq!(resp.payload["code"], "ABC");
        assert_eq!(resp.payload["delay"], 5);
        assert!(!resp.is_failure());
    }

    #[test]
    fn decode_keeps_non_success_status() {
        let resp = Response::decode(raw(404, Some(r#"{"delay":60}"#)));
        assert_eq!(resp.status, 404);
        assert_eq!(resp.payload["delay"], 60);
    }

    #[test]
    fn decode_missing_body_keeps_status() {
        let resp = Response::decode(raw(204, None));
        assert_eq!(resp.status, 204);
        assert!(resp.payload.is_empty());
        assert!(!resp.is_failure());
    }

    #[test]
    fn decode_blank_body_is_treated_as_missing() {
        let resp = Response::decode(raw(200, Some("  \n")));
        assert_eq!(resp.status, 200);
        assert!(resp.payload.is_empty());
    }

    #[test]
    fn decode_malformed_body_is_failure_sentinel() {
        let resp = Response::decode(raw(200, Some("not json")));
        assert_eq!(resp.status, 500);
        assert!(resp.payload.is_empty());
        assert!(matches!(resp.into_payload(), Err(Error::Decode(_))));
    }

    #[test]
    fn decode_non_object_json_is_failure_sentinel() {
        let resp = Response::decode(raw(200, Some("[1,2,3]")));
        assert_eq!(resp.status, 500);
        let err = resp.into_payload().unwrap_err();
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn opt_int_coerces_loosely() {
        let payload: Map<String, Value> =
            serde_json::from_str(r#"{"a":7,"b":"12","c":2.9,"d":true,"e":"x"}"#).unwrap();
        assert_eq!(opt_int(&payload, "a"), Some(7));
        assert_eq!(opt_int(&payload, "b"), Some(12));
        assert_eq!(opt_int(&payload, "c"), Some(2));
        assert_eq!(opt_int(&payload, "d"), Some(0));
        assert_eq!(opt_int(&payload, "e"), Some(0));
        assert_eq!(opt_int(&payload, "missing"), None);
    }

    #[test]
    fn opt_string_renders_non_strings() {
        let payload: Map<String, Value> =
            serde_json::from_str(r#"{"a":"x","b":42,"c":null}"#).unwrap();
        assert_eq!(opt_string(&payload, "a").as_deref(), Some("x"));
        assert_eq!(opt_string(&payload, "b").as_deref(), Some("42"));
        assert_eq!(opt_string(&payload, "c").as_deref(), Some(""));
        assert_eq!(opt_string(&payload, "missing"), None);
    }
}
