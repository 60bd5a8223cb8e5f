//! Result protocol shared by every fallible client operation.
//!
//! Inside Rust the outcome is a tagged [`ApiResult`]. At serialization
//! boundaries (CLI output, handing results to a web frontend) it becomes the
//! `{data, error}` [`ResultEnvelope`], where exactly one side is populated.

use serde::{Deserialize, Serialize};

use super::error::{AuthError, ClientError};

pub type ApiResult<T> = std::result::Result<T, ClientError>;

/// Payload of a successful call that returns nothing. Serializes as `{}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Empty {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope<T> {
    pub data: Option<T>,
    pub error: Option<AuthError>,
}

impl<T> ResultEnvelope<T> {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Convert back into a tagged result.
    ///
    /// A populated `error` always wins. An envelope with neither side set is
    /// reported as an invalid response.
    pub fn into_result(self) -> ApiResult<T> {
        match (self.data, self.error) {
            (_, Some(err)) => Err(err.into()),
            (Some(data), None) => Ok(data),
            (None, None) => Err(ClientError::InvalidResponse(
                "Result carried neither data nor error".to_string(),
            )),
        }
    }
}

impl<T> From<ApiResult<T>> for ResultEnvelope<T> {
    fn from(result: ApiResult<T>) -> Self {
        match result {
            Ok(data) => Self {
                data: Some(data),
                error: None,
            },
            Err(err) => Self {
                data: None,
                error: Some(AuthError::from(&err)),
            },
        }
    }
}
