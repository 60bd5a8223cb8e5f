//! Sign-in, sign-up and sign-out against the auth service.

use reqwest::{header, Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{bearer_header, ApiResult, ClientError, Empty};
use crate::auth::SessionStore;
use crate::models::Session;

const AUTH_FAILED: &str = "Auth failed";
const AUTH_ERROR: &str = "Auth error";
const LOGOUT_FAILED: &str = "Logout failed";
const LOGOUT_ERROR: &str = "Logout error";

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

/// Client for the `{base}/auth` endpoints.
///
/// A successful login or signup replaces the session held by the
/// `SessionStore`; a failed one leaves it untouched.
#[derive(Clone)]
pub struct AuthEndpoint {
    client: Client,
    auth_url: String,
}

impl AuthEndpoint {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            auth_url: format!("{}/auth", base_url),
        }
    }

    pub async fn login(
        &self,
        store: &mut SessionStore,
        email: &str,
        password: &str,
    ) -> ApiResult<Session> {
        let url = format!("{}/token?grant_type=password", self.auth_url);
        let session = self.credential_request(&url, email, password).await?;
        info!(user_id = %session.user.id, "Login successful");
        store.set(session.clone());
        Ok(session)
    }

    pub async fn signup(
        &self,
        store: &mut SessionStore,
        email: &str,
        password: &str,
    ) -> ApiResult<Session> {
        let url = format!("{}/signup", self.auth_url);
        let session = self.credential_request(&url, email, password).await?;
        info!(user_id = %session.user.id, "Signup successful");
        store.set(session.clone());
        Ok(session)
    }

    /// Sign out the current session.
    ///
    /// Without a session this fails before touching the network. If the
    /// server refuses, the session is kept so the caller can try again.
    pub async fn logout(&self, store: &mut SessionStore) -> ApiResult<Empty> {
        let Some(token) = store.session().map(|s| s.access_token.clone()) else {
            debug!("Logout requested without a session");
            return Err(ClientError::NotSignedIn);
        };

        let url = format!("{}/logout", self.auth_url);
        let response = self
            .client
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, bearer_header(&token)?)
            .send()
            .await
            .map_err(|e| ClientError::from_transport(e, LOGOUT_ERROR))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %ClientError::truncate_body(&body), "Logout failed");
            return Err(Self::failure(status, &body, LOGOUT_FAILED));
        }

        store.clear();
        info!("Logout successful");
        Ok(Empty {})
    }

    async fn credential_request(&self, url: &str, email: &str, password: &str) -> ApiResult<Session> {
        let response = self
            .client
            .post(url)
            .json(&Credentials { email, password })
            .send()
            .await
            .map_err(|e| ClientError::from_transport(e, AUTH_ERROR))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %ClientError::truncate_body(&body), "Auth request rejected");
            return Err(Self::failure(status, &body, AUTH_FAILED));
        }

        response
            .json::<Session>()
            .await
            .map_err(|e| ClientError::from_transport(e, AUTH_ERROR))
    }

    /// Build an `AuthFailure` from an error body such as
    /// `{"code":400,"error_code":"invalid_credentials","msg":"..."}` or
    /// `{"error":"invalid_grant","error_description":"..."}`.
    fn failure(status: StatusCode, body: &str, fallback: &str) -> ClientError {
        let parsed: Option<Value> = serde_json::from_str(body).ok();
        let text_field = |name: &str| {
            parsed
                .as_ref()
                .and_then(|v| v.get(name))
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let msg = text_field("msg")
            .or_else(|| text_field("error_description"))
            .unwrap_or_else(|| fallback.to_string());
        let code = parsed
            .as_ref()
            .and_then(|v| v.get("code"))
            .and_then(Value::as_u64)
            .and_then(|c| u16::try_from(c).ok())
            .or(Some(status.as_u16()));

        ClientError::AuthFailure {
            msg,
            code,
            error_code: text_field("error_code").or_else(|| text_field("error")),
        }
    }
}
