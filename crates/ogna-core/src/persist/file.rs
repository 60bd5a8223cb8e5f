//! File-backed substrates for desktop and CLI use.
//!
//! Each store is one JSON file in the cache directory, re-read on every
//! access so that several processes observe each other's writes.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use super::{render_cookie_header, CookieJar, LocalStore, StoredCookie};
use crate::auth::Cookie;

/// Cookie jar file name in cache directory
const COOKIES_FILE: &str = "cookies.json";

/// Local store file name in cache directory
const LOCAL_STORE_FILE: &str = "local_storage.json";

fn load_map<T: DeserializeOwned>(path: &Path) -> Result<BTreeMap<String, T>> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

fn save_map<T: Serialize>(path: &Path, map: &BTreeMap<String, T>) -> Result<()> {
    let contents = serde_json::to_string_pretty(map)?;
    std::fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

pub struct FileCookieJar {
    path: PathBuf,
}

impl FileCookieJar {
    pub fn new(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        Ok(Self {
            path: dir.join(COOKIES_FILE),
        })
    }

    fn load(&self) -> Result<BTreeMap<String, StoredCookie>> {
        load_map(&self.path)
    }
}

impl CookieJar for FileCookieJar {
    fn get(&self, name: &str) -> Result<Option<String>> {
        let mut cookies = self.load()?;
        match cookies.get(name) {
            Some(stored) if stored.is_expired() => {
                debug!(cookie = name, "Dropping expired cookie");
                cookies.remove(name);
                save_map(&self.path, &cookies)?;
                Ok(None)
            }
            Some(stored) => Ok(Some(stored.value.clone())),
            None => Ok(None),
        }
    }

    fn set(&self, cookie: &Cookie) -> Result<()> {
        let mut cookies = self.load()?;
        if cookie.is_removal() {
            if cookies.remove(&cookie.name).is_none() {
                return Ok(());
            }
        } else {
            cookies.insert(cookie.name.clone(), StoredCookie::from_cookie(cookie));
        }
        save_map(&self.path, &cookies)
    }

    fn cookie_header(&self) -> Result<String> {
        Ok(render_cookie_header(self.load()?.iter()))
    }
}

pub struct FileLocalStore {
    path: PathBuf,
}

impl FileLocalStore {
    pub fn new(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        Ok(Self {
            path: dir.join(LOCAL_STORE_FILE),
        })
    }
}

impl LocalStore for FileLocalStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let items: BTreeMap<String, String> = load_map(&self.path)?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut items: BTreeMap<String, String> = load_map(&self.path)?;
        items.insert(key.to_string(), value.to_string());
        save_map(&self.path, &items)
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let mut items: BTreeMap<String, String> = load_map(&self.path)?;
        if items.remove(key).is_some() {
            save_map(&self.path, &items)?;
        }
        Ok(())
    }
}
