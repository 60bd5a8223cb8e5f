use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::Result;

use super::{render_cookie_header, CookieJar, LocalStore, StoredCookie};
use crate::auth::Cookie;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Process-local cookie jar. Share one instance (behind an `Arc`) between
/// clients to model several tabs on the same origin.
#[derive(Debug, Default)]
pub struct MemoryCookieJar {
    cookies: Mutex<BTreeMap<String, StoredCookie>>,
}

impl MemoryCookieJar {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CookieJar for MemoryCookieJar {
    fn get(&self, name: &str) -> Result<Option<String>> {
        let mut cookies = lock(&self.cookies);
        match cookies.get(name) {
            Some(stored) if stored.is_expired() => {
                cookies.remove(name);
                Ok(None)
            }
            Some(stored) => Ok(Some(stored.value.clone())),
            None => Ok(None),
        }
    }

    fn set(&self, cookie: &Cookie) -> Result<()> {
        let mut cookies = lock(&self.cookies);
        if cookie.is_removal() {
            cookies.remove(&cookie.name);
        } else {
            cookies.insert(cookie.name.clone(), StoredCookie::from_cookie(cookie));
        }
        Ok(())
    }

    fn cookie_header(&self) -> Result<String> {
        Ok(render_cookie_header(lock(&self.cookies).iter()))
    }
}

#[derive(Debug, Default)]
pub struct MemoryLocalStore {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryLocalStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStore for MemoryLocalStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(lock(&self.items).get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        lock(&self.items).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        lock(&self.items).remove(key);
        Ok(())
    }
}
