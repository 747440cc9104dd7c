//! Access credential type.

use std::fmt;

use reqwest::header::HeaderValue;

use crate::error::InvalidInputError;

/// A short-lived bearer credential for authenticated requests.
///
/// The value is a three-segment JWT-style string. Only
/// [`CredentialInspector`](super::CredentialInspector) looks inside it, and
/// only for advisory display and expiry hints.
///
/// # Security
///
/// - Never logged or displayed in Debug output
/// - Forwarded to servers only through [`AccessToken::bearer_header`]
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub(crate) fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token value.
    ///
    /// # Security
    ///
    /// Use only for persistence or inspection. Never log this value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Build the `Authorization` header value, `Bearer <token>`.
    ///
    /// The value is marked sensitive so HTTP-level debug output omits it.
    pub fn bearer_header(&self) -> Result<HeaderValue, InvalidInputError> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", self.0)).map_err(|_| {
            InvalidInputError::Header {
                reason: "access token contains characters not allowed in a header".to_string(),
            }
        })?;
        value.set_sensitive(true);
        Ok(value)
    }
}

// Hide token value in Debug output
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AccessToken").field(&"[REDACTED]").finish()
    }
}
