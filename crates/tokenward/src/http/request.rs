//! Outbound request description.

use reqwest::Method;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use url::Url;

use crate::auth::AccessToken;
use crate::error::{Error, InvalidInputError};

/// Cross-origin cookie policy, mirroring `fetch`'s `credentials` option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CredentialsMode {
    /// Send and accept cookies for any origin.
    Include,
    /// Send and accept cookies only for the application's own origin.
    #[default]
    SameOrigin,
    /// Never send or accept cookies.
    Omit,
}

/// Caller-supplied request options: method, headers and body.
///
/// The body is kept as bytes so the request can be re-issued verbatim.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    /// Add a header, replacing any existing value for `name`.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self, Error> {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| InvalidInputError::Header {
            reason: format!("{}: {}", name, e),
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| InvalidInputError::Header {
            reason: format!("{}: {}", name, e),
        })?;
        self.headers.insert(name, value);
        Ok(self)
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the JSON body and set `Content-Type`.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self, Error> {
        let body = serde_json::to_vec(value).map_err(|e| InvalidInputError::Body {
            reason: e.to_string(),
        })?;
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.body = Some(body);
        Ok(self)
    }
}

/// A fully resolved request: target, options and cookie policy.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub url: Url,
    pub options: RequestOptions,
    pub credentials: CredentialsMode,
}

impl RequestContext {
    pub fn new(url: Url, options: RequestOptions) -> Self {
        Self {
            url,
            options,
            credentials: CredentialsMode::default(),
        }
    }

    pub fn with_credentials(mut self, credentials: CredentialsMode) -> Self {
        self.credentials = credentials;
        self
    }

    /// Cookie-scoped request with no bearer header, for the session endpoints.
    pub(crate) fn cookie_scoped(url: Url, method: Method) -> Self {
        Self::new(url, RequestOptions::new(method)).with_credentials(CredentialsMode::Include)
    }

    /// Bearer-authorized request with cookies included.
    ///
    /// Caller headers are applied first and `Authorization` last, so a
    /// caller-supplied `Authorization` never survives.
    pub(crate) fn authorized(
        url: &Url,
        options: &RequestOptions,
        token: &AccessToken,
    ) -> Result<Self, Error> {
        let mut options = options.clone();
        options.headers.insert(AUTHORIZATION, token.bearer_header()?);
        Ok(Self::new(url.clone(), options).with_credentials(CredentialsMode::Include))
    }
}
