//! HTTP side of the client.
//!
//! - `AuthEndpoint`: login, signup and logout against `{base}/auth`
//! - `RequestDispatcher`: bearer-authenticated JSON calls to `{base}/api`
//! - `ClientError` / `ApiResult`: the result protocol every call returns
//!
//! Calls are made once; there is no retry, backoff or cancellation.

pub mod auth;
pub mod error;
pub mod request;
pub mod result;

pub use auth::AuthEndpoint;
pub use error::{is_auth_error, AuthError, ClientError};
pub use request::{Method, RequestDispatcher, RequestOptions};
pub use result::{ApiResult, Empty, ResultEnvelope};

use reqwest::header::HeaderValue;

pub(crate) fn bearer_header(token: &str) -> ApiResult<HeaderValue> {
    HeaderValue::from_str(&format!("Bearer {}", token))
        .map_err(|e| ClientError::InvalidRequest(format!("Invalid token: {}", e)))
}
