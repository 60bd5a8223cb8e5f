//! The `OgnaClient` facade: one object per signed-in user.

use anyhow::Result;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::api::{ApiResult, AuthEndpoint, Empty, Method, RequestDispatcher, RequestOptions};
use crate::auth::SessionStore;
use crate::config::ClientConfig;
use crate::models::{Session, User};
use crate::persist::Persistence;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated,
}

/// Session-aware client for the auth service and the application API.
///
/// Operations that change the session take `&mut self`, so one instance can
/// never run two of them at once. Separate instances sharing the same
/// persistence still race, and the last write wins.
pub struct OgnaClient {
    config: ClientConfig,
    store: SessionStore,
    auth: AuthEndpoint,
    dispatcher: RequestDispatcher,
}

impl OgnaClient {
    /// Create a client and, when `persistence` is persistent, restore any
    /// saved session.
    pub fn new(config: ClientConfig, persistence: Persistence) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self::with_http_client(config, persistence, builder.build()?))
    }

    /// Like `new`, sharing an existing connection pool.
    pub fn with_http_client(config: ClientConfig, persistence: Persistence, client: Client) -> Self {
        let mut store = SessionStore::new(persistence, config.production);
        if store.persistence().is_persistent() {
            let restored = store.hydrate();
            debug!(restored, "Hydration pass complete");
        }

        Self {
            auth: AuthEndpoint::new(client.clone(), &config.base_url),
            dispatcher: RequestDispatcher::new(client, &config.base_url),
            config,
            store,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn persistence(&self) -> &Persistence {
        self.store.persistence()
    }

    // ===== Session accessors =====

    pub fn user(&self) -> Option<&User> {
        self.store.user()
    }

    pub fn token(&self) -> Option<String> {
        self.store.token()
    }

    /// True when a token is available for API calls.
    pub fn is_logged_in(&self) -> bool {
        self.token().is_some()
    }

    pub fn session(&self) -> Option<&Session> {
        self.store.session()
    }

    pub fn state(&self) -> SessionState {
        if self.store.session().is_some() {
            SessionState::Authenticated
        } else {
            SessionState::Anonymous
        }
    }

    /// Install a session obtained elsewhere, or sign out locally with `None`.
    pub fn set_session(&mut self, session: Option<Session>) {
        self.store.replace(session);
    }

    // ===== Auth =====

    pub async fn login(&mut self, email: &str, password: &str) -> ApiResult<Session> {
        self.auth.login(&mut self.store, email, password).await
    }

    pub async fn signup(&mut self, email: &str, password: &str) -> ApiResult<Session> {
        self.auth.signup(&mut self.store, email, password).await
    }

    pub async fn logout(&mut self) -> ApiResult<Empty> {
        self.auth.logout(&mut self.store).await
    }

    // ===== API requests =====

    pub async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        options: &RequestOptions,
    ) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let token = self.store.token();
        self.dispatcher
            .request(token.as_deref(), method, path, body, options)
            .await
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.request(Method::Get, path, None::<&()>, &RequestOptions::default())
            .await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::Post, path, Some(body), &RequestOptions::default())
            .await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::Put, path, Some(body), &RequestOptions::default())
            .await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.request(Method::Delete, path, None::<&()>, &RequestOptions::default())
            .await
    }
}
