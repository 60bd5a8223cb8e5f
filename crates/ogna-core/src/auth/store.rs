use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use super::cookies::{Cookie, LOCAL_TOKEN_KEY, SESSION_COOKIE, TOKEN_COOKIE};
use crate::models::{Session, User};
use crate::persist::Persistence;

/// Holds the live session and keeps the persisted copies in step with it.
///
/// None of the operations fail: storage errors are logged and the store
/// carries on with what it has in memory.
#[derive(Debug)]
pub struct SessionStore {
    persistence: Persistence,
    secure: bool,
    current: Option<Session>,
}

impl SessionStore {
    /// `secure` adds the `Secure` attribute to written cookies.
    pub fn new(persistence: Persistence, secure: bool) -> Self {
        Self {
            persistence,
            secure,
            current: None,
        }
    }

    pub fn persistence(&self) -> &Persistence {
        &self.persistence
    }

    /// Restore the session from the session cookie.
    ///
    /// A cookie that does not decode is wiped along with the token mirror and
    /// the store stays anonymous. Returns whether a session was restored.
    pub fn hydrate(&mut self) -> bool {
        let Persistence::Persistent { cookies, local } = &self.persistence else {
            return false;
        };

        let raw = match cookies.get(SESSION_COOKIE) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("No session cookie found");
                return false;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read session cookie");
                return false;
            }
        };

        let session = match decode_session(&raw) {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Failed to parse session cookie, clearing persisted session");
                self.current = None;
                self.purge();
                return false;
            }
        };

        // Repair the mirror only when it is empty; a present local token wins.
        match local.get_item(LOCAL_TOKEN_KEY) {
            Ok(Some(token)) if !token.is_empty() => {
                if token != session.access_token {
                    debug!("Local token differs from session cookie, keeping local token");
                }
            }
            Ok(_) => {
                if let Err(e) = local.set_item(LOCAL_TOKEN_KEY, &session.access_token) {
                    warn!(error = %e, "Failed to mirror token to local store");
                }
            }
            Err(e) => warn!(error = %e, "Failed to read local token"),
        }

        info!(user_id = %session.user.id, "Session restored");
        self.current = Some(session);
        true
    }

    /// Write the token cookie, the session cookie and the local token mirror.
    pub fn persist(&self, session: &Session) {
        let Persistence::Persistent { cookies, local } = &self.persistence else {
            debug!("No persistent storage, session kept in memory only");
            return;
        };

        let max_age = session.max_age_secs();
        match encode_session(session) {
            Ok(encoded) => {
                let pair = [
                    Cookie::new(TOKEN_COOKIE, session.access_token.as_str(), max_age, self.secure),
                    Cookie::new(SESSION_COOKIE, encoded, max_age, self.secure),
                ];
                for cookie in &pair {
                    if let Err(e) = cookies.set(cookie) {
                        warn!(cookie = %cookie.name, error = %e, "Failed to write cookie");
                    }
                }
            }
            Err(e) => warn!(error = %e, "Failed to encode session cookie"),
        }

        if let Err(e) = local.set_item(LOCAL_TOKEN_KEY, &session.access_token) {
            warn!(error = %e, "Failed to mirror token to local store");
        }
        debug!(max_age, secure = self.secure, "Session persisted");
    }

    /// Expire both cookies and drop the local token. Safe to repeat.
    pub fn purge(&self) {
        let Persistence::Persistent { cookies, local } = &self.persistence else {
            return;
        };

        for name in [TOKEN_COOKIE, SESSION_COOKIE] {
            if let Err(e) = cookies.set(&Cookie::expired(name)) {
                warn!(cookie = name, error = %e, "Failed to expire cookie");
            }
        }
        if let Err(e) = local.remove_item(LOCAL_TOKEN_KEY) {
            warn!(error = %e, "Failed to remove local token");
        }
        debug!("Persisted session purged");
    }

    /// Replace the session wholesale and persist it.
    pub fn set(&mut self, session: Session) {
        self.persist(&session);
        self.current = Some(session);
    }

    /// Forget the session and purge persisted state.
    pub fn clear(&mut self) {
        self.current = None;
        self.purge();
    }

    pub fn replace(&mut self, session: Option<Session>) {
        match session {
            Some(session) => self.set(session),
            None => self.clear(),
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    pub fn user(&self) -> Option<&User> {
        self.current.as_ref().map(|s| &s.user)
    }

    /// The token to attach to API calls.
    ///
    /// Where a local store exists it is authoritative, even if it disagrees
    /// with the in-memory session. Without one, the in-memory session is used.
    pub fn token(&self) -> Option<String> {
        let token = match &self.persistence {
            Persistence::Persistent { local, .. } => match local.get_item(LOCAL_TOKEN_KEY) {
                Ok(token) => token,
                Err(e) => {
                    warn!(error = %e, "Failed to read local token, using in-memory session");
                    self.memory_token()
                }
            },
            Persistence::Ephemeral => self.memory_token(),
        };
        token.filter(|t| !t.is_empty())
    }

    fn memory_token(&self) -> Option<String> {
        self.current.as_ref().map(|s| s.access_token.clone())
    }
}

fn encode_session(session: &Session) -> Result<String> {
    let json = serde_json::to_string(session).context("Failed to serialize session")?;
    Ok(urlencoding::encode(&json).into_owned())
}

fn decode_session(raw: &str) -> Result<Session> {
    let json = urlencoding::decode(raw).context("Session cookie is not valid UTF-8")?;
    serde_json::from_str(&json).context("Session cookie is not a valid session")
}
