//! Application URL type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::error::{Error, InvalidInputError};

/// A validated application origin.
///
/// Every endpoint the session layer talks to (the API, the refresh and
/// logout endpoints, the landing location) is resolved against this URL,
/// the way a browser resolves relative `fetch` targets against the page.
///
/// The URL must be absolute and use HTTPS (or HTTP for localhost).
///
/// # Example
///
/// ```
/// use tokenward::AppUrl;
///
/// let app = AppUrl::new("https://app.example.com").unwrap();
/// assert_eq!(
///     app.resolve("/auth/refresh").unwrap().as_str(),
///     "https://app.example.com/auth/refresh"
/// );
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AppUrl(Url);

impl AppUrl {
    /// Create a new application URL from a string, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not valid or doesn't meet requirements.
    pub fn new(s: impl AsRef<str>) -> Result<Self, Error> {
        let s = s.as_ref();
        let mut url = Url::parse(s).map_err(|e| InvalidInputError::AppUrl {
            value: s.to_string(),
            reason: e.to_string(),
        })?;

        Self::validate(&url, s)?;

        // Relative resolution treats the last segment as a file unless the
        // path ends in a slash.
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        url.set_query(None);
        url.set_fragment(None);

        Ok(Self(url))
    }

    /// Resolve an absolute URL or an application-relative path.
    ///
    /// Paths starting with `/` are resolved from the origin root, like a
    /// browser `fetch("/api/...")`.
    pub fn resolve(&self, target: &str) -> Result<Url, Error> {
        self.0.join(target).map_err(|e| {
            InvalidInputError::Url {
                value: target.to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Check whether `url` shares this application's origin.
    pub fn is_same_origin(&self, url: &Url) -> bool {
        self.0.origin() == url.origin()
    }

    /// Returns the base URL as a string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the inner URL.
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// Returns the host string.
    pub fn host(&self) -> Option<&str> {
        self.0.host_str()
    }

    fn validate(url: &Url, original: &str) -> Result<(), Error> {
        if url.cannot_be_a_base() {
            return Err(InvalidInputError::AppUrl {
                value: original.to_string(),
                reason: "must be an absolute URL".to_string(),
            }
            .into());
        }

        let scheme = url.scheme();
        let is_localhost = url
            .host_str()
            .is_some_and(|h| h == "localhost" || h == "127.0.0.1" || h == "[::1]");

        if scheme != "https" && !(scheme == "http" && is_localhost) {
            return Err(InvalidInputError::AppUrl {
                value: original.to_string(),
                reason: "must use HTTPS (HTTP allowed only for localhost)".to_string(),
            }
            .into());
        }

        if url.host_str().is_none() {
            return Err(InvalidInputError::AppUrl {
                value: original.to_string(),
                reason: "must have a host".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

impl fmt::Display for AppUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AppUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for AppUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.0.as_str())
    }
}

impl<'de> Deserialize<'de> for AppUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        AppUrl::new(&s).map_err(serde::de::Error::custom)
    }
}

impl AsRef<str> for AppUrl {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_https_url() {
        let app = AppUrl::new("https://app.example.com").unwrap();
        assert_eq!(app.host(), Some("app.example.com"));
    }

    #[test]
    fn valid_localhost_http() {
        let app = AppUrl::new("http://localhost:5000").unwrap();
        assert_eq!(app.host(), Some("localhost"));
    }

    #[test]
    fn absolute_paths_resolve_from_origin_root() {
        let app = AppUrl::new("https://app.example.com/dashboard").unwrap();
        assert_eq!(
            app.resolve("/auth/refresh").unwrap().as_str(),
            "https://app.example.com/auth/refresh"
        );
    }

    #[test]
    fn relative_paths_resolve_under_base_path() {
        let app = AppUrl::new("https://app.example.com/portal").unwrap();
        assert_eq!(
            app.resolve("api/nearby").unwrap().as_str(),
            "https://app.example.com/portal/api/nearby"
        );
    }

    #[test]
    fn absolute_urls_pass_through() {
        let app = AppUrl::new("https://app.example.com").unwrap();
        let url = app.resolve("https://api.example.com/v1/items").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/items");
        assert!(!app.is_same_origin(&url));
    }

    #[test]
    fn invalid_http_non_localhost() {
        assert!(AppUrl::new("http://app.example.com").is_err());
    }

    #[test]
    fn invalid_relative_url() {
        assert!(AppUrl::new("/auth/refresh").is_err());
    }

    #[test]
    fn serializes_as_normalised_string() {
        let url: AppUrl = serde_json::from_str(r#""https://app.example.com/base""#).unwrap();
        assert_eq!(
            serde_json::to_string(&url).unwrap(),
            r#""https://app.example.com/base/""#
        );
        assert!(serde_json::from_str::<AppUrl>(r#""http://evil.example.com""#).is_err());
    }
}
