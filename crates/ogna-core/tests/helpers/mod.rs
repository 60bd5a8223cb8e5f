#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use ogna_core::auth::Cookie;
use ogna_core::persist::{CookieJar, MemoryCookieJar, MemoryLocalStore};
use ogna_core::{ClientConfig, OgnaClient, Persistence};
use serde_json::{json, Value};
use wiremock::MockServer;

pub const EMAIL: &str = "a@b.com";
pub const PASSWORD: &str = "secret1";

pub fn user_json(id: &str) -> Value {
    json!({
        "id": id,
        "email": EMAIL,
        "created_at": "2024-01-01",
        "updated_at": "2024-01-01"
    })
}

pub fn session_json(token: &str, user_id: &str) -> Value {
    json!({
        "access_token": token,
        "refresh_token": "R1",
        "expires_in": 3600,
        "token_type": "bearer",
        "user": user_json(user_id)
    })
}

pub struct Substrates {
    pub cookies: Arc<MemoryCookieJar>,
    pub local: Arc<MemoryLocalStore>,
}

impl Substrates {
    pub fn new() -> Self {
        Self {
            cookies: Arc::new(MemoryCookieJar::new()),
            local: Arc::new(MemoryLocalStore::new()),
        }
    }

    pub fn persistence(&self) -> Persistence {
        Persistence::new(self.cookies.clone(), self.local.clone())
    }
}

pub fn client_for(server: &MockServer, persistence: Persistence) -> OgnaClient {
    OgnaClient::new(ClientConfig::new(server.uri()), persistence)
        .expect("Failed to build test client")
}

/// Cookie jar that keeps every `Set-Cookie` value it is handed.
#[derive(Default)]
pub struct RecordingCookieJar {
    inner: MemoryCookieJar,
    pub written: Mutex<Vec<String>>,
}

impl CookieJar for RecordingCookieJar {
    fn get(&self, name: &str) -> anyhow::Result<Option<String>> {
        self.inner.get(name)
    }

    fn set(&self, cookie: &Cookie) -> anyhow::Result<()> {
        self.written.lock().unwrap().push(cookie.to_header_value());
        self.inner.set(cookie)
    }

    fn cookie_header(&self) -> anyhow::Result<String> {
        self.inner.cookie_header()
    }
}
