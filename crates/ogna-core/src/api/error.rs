use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Method;

/// Every way a public client operation can fail.
///
/// `Display` is the human-readable `msg` shown to users; it is the only part
/// callers should rely on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("No token available")]
    NoToken,

    #[error("User not signed in")]
    NotSignedIn,

    #[error("{msg}")]
    AuthFailure {
        msg: String,
        code: Option<u16>,
        error_code: Option<String>,
    },

    #[error("API {method} {url} failed: {status} {body}")]
    Http {
        method: Method,
        url: String,
        status: u16,
        body: String,
    },

    #[error("{0}")]
    Network(String),

    #[error("{0}")]
    InvalidResponse(String),

    #[error("{0}")]
    InvalidRequest(String),
}

/// Maximum length for response bodies written to logs
const MAX_LOGGED_BODY_LENGTH: usize = 500;

impl ClientError {
    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_LOGGED_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_LOGGED_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    /// Convert a transport failure, keeping its message unless it is empty.
    pub(crate) fn from_transport(err: reqwest::Error, fallback: &str) -> Self {
        let msg = non_empty_or(err.to_string(), fallback);
        if err.is_decode() {
            ClientError::InvalidResponse(msg)
        } else {
            ClientError::Network(msg)
        }
    }

    pub fn msg(&self) -> String {
        self.to_string()
    }

    /// HTTP status associated with the failure, when the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            ClientError::AuthFailure { code, .. } => *code,
            _ => None,
        }
    }
}

pub(crate) fn non_empty_or(msg: String, fallback: &str) -> String {
    if msg.trim().is_empty() {
        fallback.to_string()
    } else {
        msg
    }
}

/// Loosely-structured error descriptor as it appears on the wire and in the
/// serialized `{data, error}` envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct AuthError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

impl AuthError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            msg: Some(msg.into()),
            ..Default::default()
        }
    }

    /// Recognize an error descriptor inside an untyped JSON value.
    ///
    /// Only objects carrying a `msg` field qualify.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        if !is_auth_error(value) {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.msg.as_deref().unwrap_or("Unknown error"))
    }
}

impl From<&ClientError> for AuthError {
    fn from(err: &ClientError) -> Self {
        let (code, error_code) = match err {
            ClientError::AuthFailure {
                code, error_code, ..
            } => (*code, error_code.clone()),
            ClientError::Http { status, .. } => (Some(*status), None),
            _ => (None, None),
        };
        Self {
            code,
            error_code,
            msg: Some(err.to_string()),
        }
    }
}

impl From<ClientError> for AuthError {
    fn from(err: ClientError) -> Self {
        Self::from(&err)
    }
}

impl From<AuthError> for ClientError {
    fn from(err: AuthError) -> Self {
        ClientError::AuthFailure {
            msg: err.msg.unwrap_or_else(|| "Unknown error".to_string()),
            code: err.code,
            error_code: err.error_code,
        }
    }
}

/// Structural check used by collaborators holding an untyped JSON value.
pub fn is_auth_error(value: &serde_json::Value) -> bool {
    value
        .as_object()
        .map(|obj| obj.contains_key("msg"))
        .unwrap_or(false)
}
