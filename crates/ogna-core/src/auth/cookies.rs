//! Cookie model shared by the session store and server-side route guards.

use std::fmt;

/// Cookie holding only the access token; read by server-side route guards.
pub const TOKEN_COOKIE: &str = "ogna_token";

/// Cookie holding the percent-encoded JSON session; read on reload.
pub const SESSION_COOKIE: &str = "ogna_session";

/// Key of the token mirror in the local store.
pub const LOCAL_TOKEN_KEY: &str = "ogna_token";

/// Paths under this prefix require a token.
pub const PROTECTED_PREFIX: &str = "/protected";

/// Where anonymous visitors of a protected path are sent.
pub const LOGIN_PATH: &str = "/auth/login";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SameSite::Strict => write!(f, "Strict"),
            SameSite::Lax => write!(f, "Lax"),
            SameSite::None => write!(f, "None"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub path: String,
    /// Seconds until expiry; zero or less deletes the cookie.
    pub max_age: i64,
    pub same_site: Option<SameSite>,
    pub secure: bool,
}

impl Cookie {
    /// Origin-wide, `SameSite=Lax` cookie.
    pub fn new(name: &str, value: impl Into<String>, max_age: i64, secure: bool) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
            path: "/".to_string(),
            max_age,
            same_site: Some(SameSite::Lax),
            secure,
        }
    }

    /// Deletion record: empty value, `Max-Age=0`.
    pub fn expired(name: &str) -> Self {
        Self {
            name: name.to_string(),
            value: String::new(),
            path: "/".to_string(),
            max_age: 0,
            same_site: None,
            secure: false,
        }
    }

    pub fn is_removal(&self) -> bool {
        self.max_age <= 0
    }

    /// Render as a `Set-Cookie` header value.
    pub fn to_header_value(&self) -> String {
        let mut cookie = format!("{}={}", self.name, self.value);
        cookie.push_str(&format!("; Path={}", self.path));
        cookie.push_str(&format!("; Max-Age={}", self.max_age.max(0)));
        if let Some(same_site) = self.same_site {
            cookie.push_str(&format!("; SameSite={}", same_site));
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

/// Look up one cookie in a request `Cookie` header (`a=1; b=2`).
pub fn get_cookie_value(cookie_header: &str, name: &str) -> Option<String> {
    cookie_header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(cookie_name, _)| cookie_name.trim() == name)
        .map(|(_, value)| value.trim().to_string())
}

/// Token presence check for server-side inspection of a request.
pub fn token_from_cookie_header(cookie_header: &str) -> Option<String> {
    get_cookie_value(cookie_header, TOKEN_COOKIE).filter(|token| !token.is_empty())
}

pub fn requires_auth(path: &str) -> bool {
    path.starts_with(PROTECTED_PREFIX)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    RedirectToLogin,
}

/// Decide whether a request for `path` may proceed, based only on whether the
/// token cookie is present.
pub fn guard_route(path: &str, cookie_header: Option<&str>) -> RouteDecision {
    let has_token = cookie_header
        .and_then(token_from_cookie_header)
        .is_some();
    if !has_token && requires_auth(path) {
        RouteDecision::RedirectToLogin
    } else {
        RouteDecision::Allow
    }
}
