//! Session state and its persistence.
//!
//! This module provides:
//! - `SessionStore`: the single source of truth for the current session and
//!   token, mirrored into a cookie pair and a local store
//! - `Cookie` and helpers used by server-side route guards
//!
//! Persisted cookies expire after the session's `expires_in` (one hour when
//! the server does not say).

pub mod cookies;
pub mod store;

pub use cookies::{
    get_cookie_value, guard_route, requires_auth, token_from_cookie_header, Cookie,
    RouteDecision, SameSite, LOCAL_TOKEN_KEY, LOGIN_PATH, SESSION_COOKIE, TOKEN_COOKIE,
};
pub use store::SessionStore;
