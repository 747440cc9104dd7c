//! Client configuration.

use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::Result;
use crate::types::AppUrl;

/// Default refresh endpoint, cookie-authenticated.
pub const DEFAULT_REFRESH_PATH: &str = "/auth/refresh";

/// Default logout endpoint, cookie-authenticated.
pub const DEFAULT_LOGOUT_PATH: &str = "/auth/logout";

/// Default login endpoint.
pub const DEFAULT_LOGIN_PATH: &str = "/auth/login";

/// Where a terminated session navigates to.
pub const DEFAULT_LANDING_PATH: &str = "/";

/// Storage slot holding the access credential.
pub const DEFAULT_STORAGE_KEY: &str = "access_token";

/// Storage slot holding persisted session cookies.
pub const DEFAULT_COOKIE_STORAGE_KEY: &str = "session_cookies";

/// Configuration shared by every component of an [`AuthClient`](crate::AuthClient).
///
/// Paths are resolved against `base_url`; absolute URLs are used as-is.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub base_url: AppUrl,
    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,
    #[serde(default = "default_logout_path")]
    pub logout_path: String,
    #[serde(default = "default_login_path")]
    pub login_path: String,
    #[serde(default = "default_landing_path")]
    pub landing_path: String,
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
    #[serde(default = "default_cookie_storage_key")]
    pub cookie_storage_key: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Transport timeout for each HTTP exchange. `None` leaves it to reqwest.
    #[serde(default, with = "timeout_secs")]
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(base_url: AppUrl) -> Self {
        Self {
            base_url,
            refresh_path: default_refresh_path(),
            logout_path: default_logout_path(),
            login_path: default_login_path(),
            landing_path: default_landing_path(),
            storage_key: default_storage_key(),
            cookie_storage_key: default_cookie_storage_key(),
            user_agent: default_user_agent(),
            timeout: None,
        }
    }

    pub fn with_refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = path.into();
        self
    }

    pub fn with_logout_path(mut self, path: impl Into<String>) -> Self {
        self.logout_path = path.into();
        self
    }

    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    pub fn with_landing_path(mut self, path: impl Into<String>) -> Self {
        self.landing_path = path.into();
        self
    }

    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    pub fn with_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn refresh_url(&self) -> Result<Url> {
        self.base_url.resolve(&self.refresh_path)
    }

    pub fn logout_url(&self) -> Result<Url> {
        self.base_url.resolve(&self.logout_path)
    }

    pub fn login_url(&self) -> Result<Url> {
        self.base_url.resolve(&self.login_path)
    }

    pub fn landing_url(&self) -> Result<Url> {
        self.base_url.resolve(&self.landing_path)
    }
}

fn default_refresh_path() -> String {
    DEFAULT_REFRESH_PATH.to_string()
}

fn default_logout_path() -> String {
    DEFAULT_LOGOUT_PATH.to_string()
}

fn default_login_path() -> String {
    DEFAULT_LOGIN_PATH.to_string()
}

fn default_landing_path() -> String {
    DEFAULT_LANDING_PATH.to_string()
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

fn default_cookie_storage_key() -> String {
    DEFAULT_COOKIE_STORAGE_KEY.to_string()
}

fn default_user_agent() -> String {
    concat!("tokenward/", env!("CARGO_PKG_VERSION")).to_string()
}

mod timeout_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<f64>::deserialize(deserializer)?
            .filter(|secs| secs.is_finite() && *secs > 0.0)
            .map(Duration::from_secs_f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_server_endpoints() {
        let config = ClientConfig::new(AppUrl::new("https://app.example.com").unwrap());
        assert_eq!(
            config.refresh_url().unwrap().as_str(),
            "https://app.example.com/auth/refresh"
        );
        assert_eq!(
            config.logout_url().unwrap().as_str(),
            "https://app.example.com/auth/logout"
        );
        assert_eq!(config.landing_url().unwrap().as_str(), "https://app.example.com/");
        assert_eq!(config.storage_key, "access_token");
        assert!(config.timeout.is_none());
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: ClientConfig = serde_json::from_str(
            r#"{"base_url": "http://localhost:5000", "landing_path": "/login", "timeout": 2.5}"#,
        )
        .unwrap();
        assert_eq!(config.refresh_path, DEFAULT_REFRESH_PATH);
        assert_eq!(config.landing_url().unwrap().as_str(), "http://localhost:5000/login");
        assert_eq!(config.timeout, Some(Duration::from_millis(2500)));
    }

    #[test]
    fn rejects_insecure_base_url() {
        let result: std::result::Result<ClientConfig, _> =
            serde_json::from_str(r#"{"base_url": "http://app.example.com"}"#);
        assert!(result.is_err());
    }
}
