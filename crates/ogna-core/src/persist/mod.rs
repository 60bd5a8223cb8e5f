//! Persistence substrates for the session.
//!
//! Two stores are kept side by side: a cookie jar (what a server sees on each
//! request) and a local key/value store (what the HTTP layer reads the token
//! from). Which substrates exist is chosen once, when the client is built.

pub mod file;
pub mod memory;

use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::Cookie;

pub use file::{FileCookieJar, FileLocalStore};
pub use memory::{MemoryCookieJar, MemoryLocalStore};

pub trait CookieJar: Send + Sync {
    /// Value of a live cookie. Expired cookies read as absent.
    fn get(&self, name: &str) -> Result<Option<String>>;

    /// Store a cookie, or delete it when `cookie.is_removal()`.
    fn set(&self, cookie: &Cookie) -> Result<()>;

    /// Live cookies rendered as a request `Cookie` header.
    fn cookie_header(&self) -> Result<String>;
}

pub trait LocalStore: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&self, key: &str) -> Result<()>;
}

/// Storage environment of a client.
#[derive(Clone)]
pub enum Persistence {
    /// No cookie jar or local store, e.g. server-side rendering. The session
    /// lives in memory only.
    Ephemeral,
    Persistent {
        cookies: Arc<dyn CookieJar>,
        local: Arc<dyn LocalStore>,
    },
}

impl Persistence {
    pub fn new(cookies: Arc<dyn CookieJar>, local: Arc<dyn LocalStore>) -> Self {
        Persistence::Persistent { cookies, local }
    }

    /// Fresh in-memory substrates.
    pub fn memory() -> Self {
        Self::new(
            Arc::new(MemoryCookieJar::new()),
            Arc::new(MemoryLocalStore::new()),
        )
    }

    /// JSON files under `dir`, so the session survives a process restart.
    pub fn file(dir: impl Into<std::path::PathBuf>) -> Result<Self> {
        let dir = dir.into();
        Ok(Self::new(
            Arc::new(FileCookieJar::new(dir.clone())?),
            Arc::new(FileLocalStore::new(dir)?),
        ))
    }

    pub fn is_persistent(&self) -> bool {
        matches!(self, Persistence::Persistent { .. })
    }
}

impl fmt::Debug for Persistence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Persistence::Ephemeral => write!(f, "Persistence::Ephemeral"),
            Persistence::Persistent { .. } => write!(f, "Persistence::Persistent"),
        }
    }
}

/// A cookie as held by a jar: its value and absolute expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StoredCookie {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl StoredCookie {
    pub fn from_cookie(cookie: &Cookie) -> Self {
        Self {
            value: cookie.value.clone(),
            expires_at: Duration::try_seconds(cookie.max_age)
                .and_then(|age| Utc::now().checked_add_signed(age))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

pub(crate) fn render_cookie_header<'a>(
    cookies: impl Iterator<Item = (&'a String, &'a StoredCookie)>,
) -> String {
    cookies
        .filter(|(_, stored)| !stored.is_expired())
        .map(|(name, stored)| format!("{}={}", name, stored.value))
        .collect::<Vec<_>>()
        .join("; ")
}
