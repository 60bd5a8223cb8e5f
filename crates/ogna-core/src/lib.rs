//! Client-side session and authenticated-request manager for ogna services.
//!
//! An [`OgnaClient`] signs a user in against `{base}/auth`, keeps the session
//! in a cookie pair and a local token store so it survives reloads, and
//! attaches the bearer token to every call made to `{base}/api`. Every
//! fallible operation returns an [`ApiResult`]; nothing panics across the
//! public boundary.
//!
//! ```rust,no_run
//! use ogna_core::{ClientConfig, OgnaClient, Persistence};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let mut client = OgnaClient::new(ClientConfig::new("http://localhost:8080"), Persistence::memory())?;
//! client.login("a@b.com", "secret1").await?;
//! let buckets: serde_json::Value = client.get("/storage/buckets").await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod models;
pub mod persist;

pub use api::{
    is_auth_error, ApiResult, AuthError, ClientError, Empty, Method, RequestOptions,
    ResultEnvelope,
};
pub use auth::{guard_route, token_from_cookie_header, RouteDecision, SessionStore};
pub use client::{OgnaClient, SessionState};
pub use config::{ClientConfig, Config};
pub use models::{Session, User};
pub use persist::{CookieJar, LocalStore, Persistence};
