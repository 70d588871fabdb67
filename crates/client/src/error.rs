//! Client error model.
//!
//! Every fallible client call returns `Result<T, ApiError>`; nothing in the
//! request pipeline panics or leaks a transport error type.

use serde_json::Value;
use thiserror::Error;

use freightdesk_auth::TokenError;
use freightdesk_core::DomainError;

/// Message shown when the backend gives no usable explanation.
pub const FALLBACK_MESSAGE: &str = "Error! Please contact the administrator.";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApiError {
    /// Network failure, timeout, or connection refused.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response envelope carried a non-200 `resultCode.httpCode`.
    #[error("request rejected ({http_code}): {message}")]
    Envelope {
        http_code: u16,
        code: Option<String>,
        message: String,
        payload: Value,
    },

    /// 401/403 on an authenticated endpoint; the session has been ended.
    #[error("not authorized (HTTP {status}); session ended")]
    Unauthorized { status: u16 },

    /// Non-2xx response without an envelope.
    #[error("HTTP {status}: {message}")]
    Status {
        status: u16,
        message: String,
        body: Value,
    },

    /// The response did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl ApiError {
    /// Text suitable for a user-facing notification.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Envelope { message, .. } | ApiError::Status { message, .. } => message.clone(),
            ApiError::Unauthorized { .. } => "Your session has ended. Please sign in again.".to_string(),
            ApiError::Transport(_) => "The server is unreachable. Check your connection.".to_string(),
            ApiError::Decode(_) => FALLBACK_MESSAGE.to_string(),
            ApiError::Domain(e) => e.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Envelope { http_code, .. } => Some(*http_code),
            ApiError::Unauthorized { status } | ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Pull a human-readable message out of an error payload.
pub(crate) fn extract_message(payload: &Value) -> Option<String> {
    match payload {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Object(map) => ["message", "details", "error"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string),
        _ => None,
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SessionError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("invalid token: {0}")]
    Token(#[from] TokenError),

    /// The backend answered but refused the credentials or token.
    #[error("authentication rejected: {0}")]
    Rejected(String),
}

impl SessionError {
    pub fn user_message(&self) -> String {
        match self {
            SessionError::Api(e) => e.user_message(),
            SessionError::Token(_) => FALLBACK_MESSAGE.to_string(),
            SessionError::Rejected(msg) => msg.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn message_prefers_message_then_details() {
        assert_eq!(
            extract_message(&json!({ "message": "Bad login", "details": "x" })).as_deref(),
            Some("Bad login")
        );
        assert_eq!(extract_message(&json!({ "details": "Locked" })).as_deref(), Some("Locked"));
        assert_eq!(extract_message(&json!("plain")).as_deref(), Some("plain"));
        assert_eq!(extract_message(&json!({ "message": "  " })), None);
        assert_eq!(extract_message(&json!(42)), None);
    }

    #[test]
    fn user_message_hides_transport_details() {
        let err = ApiError::Transport("tcp connect error: 10.0.0.1:8081".to_string());
        assert!(!err.user_message().contains("10.0.0.1"));
        assert_eq!(ApiError::Unauthorized { status: 403 }.status(), Some(403));
    }
}
