//! Session cookie jar.
//!
//! The session marker lives in an httpOnly cookie the client never reads;
//! the jar only carries it between requests. When backed by storage, every
//! accepted `Set-Cookie` is persisted and replayed on startup so the
//! session outlives the process.

use std::sync::{Arc, Mutex, PoisonError};

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, HeaderValue, SET_COOKIE};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::auth::StorageBackend;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredCookie {
    url: String,
    name: String,
    set_cookie: String,
}

struct Persistence {
    backend: Arc<dyn StorageBackend>,
    key: String,
}

/// Cookie store shared by every request of one client.
pub struct CookieJar {
    jar: Jar,
    stored: Mutex<Vec<StoredCookie>>,
    persistence: Option<Persistence>,
}

impl CookieJar {
    /// An in-memory jar.
    pub fn new() -> Self {
        Self {
            jar: Jar::default(),
            stored: Mutex::new(Vec::new()),
            persistence: None,
        }
    }

    /// A jar persisted under `key` in `backend`, replaying any saved cookies.
    pub fn persistent(backend: Arc<dyn StorageBackend>, key: impl Into<String>) -> Self {
        let key = key.into();
        let stored = match backend.get_item(&key) {
            Ok(Some(json)) => serde_json::from_str::<Vec<StoredCookie>>(&json).unwrap_or_else(|e| {
                warn!(error = %e, "Discarding unreadable session cookies");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read session cookies");
                Vec::new()
            }
        };

        let jar = Jar::default();
        for cookie in &stored {
            match Url::parse(&cookie.url) {
                Ok(url) => jar.add_cookie_str(&cookie.set_cookie, &url),
                Err(e) => warn!(error = %e, name = %cookie.name, "Skipping stored cookie"),
            }
        }
        debug!(count = stored.len(), "Replayed session cookies");

        Self {
            jar,
            stored: Mutex::new(stored),
            persistence: Some(Persistence { backend, key }),
        }
    }

    /// The `Cookie` header value to send to `url`, if any cookie applies.
    pub fn cookie_header(&self, url: &Url) -> Option<HeaderValue> {
        self.jar.cookies(url)
    }

    /// Accept every `Set-Cookie` header of a response from `url`.
    pub fn absorb(&self, url: &Url, headers: &HeaderMap) {
        let mut set_cookies = headers.get_all(SET_COOKIE).iter().peekable();
        if set_cookies.peek().is_none() {
            return;
        }
        let values: Vec<&HeaderValue> = set_cookies.collect();

        self.jar.set_cookies(&mut values.iter().copied(), url);

        let Some(persistence) = &self.persistence else {
            return;
        };

        let snapshot = {
            let mut stored = self.stored.lock().unwrap_or_else(PoisonError::into_inner);
            for value in values {
                let Ok(set_cookie) = value.to_str() else {
                    continue;
                };
                remember(&mut stored, url, set_cookie);
            }
            stored.clone()
        };

        match serde_json::to_string(&snapshot) {
            Ok(json) => {
                if let Err(e) = persistence.backend.set_item(&persistence.key, &json) {
                    warn!(error = %e, "Failed to persist session cookies");
                }
            }
            Err(e) => warn!(error = %e, "Failed to serialize session cookies"),
        }
    }
}

impl Default for CookieJar {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CookieJar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieJar")
            .field("persistent", &self.persistence.is_some())
            .field("cookies", &"[REDACTED]")
            .finish()
    }
}

/// Replace any earlier cookie with the same name and host; drop it when the
/// server expired it with `Max-Age=0`.
fn remember(stored: &mut Vec<StoredCookie>, url: &Url, set_cookie: &str) {
    let Some(name) = cookie_name(set_cookie) else {
        return;
    };
    let host = url.host_str().unwrap_or_default();

    stored.retain(|c| {
        c.name != name
            || Url::parse(&c.url)
                .map(|u| u.host_str().unwrap_or_default() != host)
                .unwrap_or(true)
    });

    if !is_removal(set_cookie) {
        stored.push(StoredCookie {
            url: url.to_string(),
            name: name.to_string(),
            set_cookie: set_cookie.to_string(),
        });
    }
}

fn cookie_name(set_cookie: &str) -> Option<&str> {
    let pair = set_cookie.split(';').next()?;
    let (name, _) = pair.split_once('=')?;
    let name = name.trim();
    (!name.is_empty()).then_some(name)
}

fn is_removal(set_cookie: &str) -> bool {
    set_cookie.split(';').skip(1).any(|attr| {
        let attr = attr.trim().to_ascii_lowercase();
        attr == "max-age=0" || attr.starts_with("max-age=-")
    })
}
