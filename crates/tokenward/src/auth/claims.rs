//! Unverified credential claims.
//!
//! The payload segment of an access credential is decoded **without any
//! signature check**. Everything here is advisory: use it to show who is
//! signed in or to hint that a credential has probably lapsed, never to
//! decide what a user may do. The server's `401` stays authoritative.

use std::fmt;

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::DecodeError;

use super::store::CredentialStore;

/// Standard alphabet, padding optional, lenient about trailing bits.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// A subject identifier, numeric or textual depending on the issuer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubjectId {
    Number(i64),
    Text(String),
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubjectId::Number(n) => write!(f, "{}", n),
            SubjectId::Text(s) => f.write_str(s),
        }
    }
}

/// Claims carried in a credential payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<SubjectId>,
    /// Registered subject claim, used when `user_id` is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<SubjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
    /// Issued-at, seconds since the epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    /// Expiry, seconds since the epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    /// `access` or `refresh` on tokens minted by the application server.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

impl Claims {
    pub fn subject_id(&self) -> Option<&SubjectId> {
        self.user_id.as_ref().or(self.sub.as_ref())
    }

    /// Fail-closed expiry check against `now`.
    ///
    /// A missing `exp` counts as expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.exp {
            Some(exp) => exp.saturating_mul(1000) < now.timestamp_millis(),
            None => true,
        }
    }
}

/// Identity summary for display collaborators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserInfo {
    pub subject_id: Option<SubjectId>,
    pub is_privileged: bool,
    pub issued_at: Option<i64>,
    pub expires_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

impl UserInfo {
    pub fn issued_at_utc(&self) -> Option<DateTime<Utc>> {
        self.issued_at.and_then(|s| DateTime::from_timestamp(s, 0))
    }

    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        self.expires_at.and_then(|s| DateTime::from_timestamp(s, 0))
    }
}

impl From<&Claims> for UserInfo {
    fn from(claims: &Claims) -> Self {
        Self {
            subject_id: claims.subject_id().cloned(),
            is_privileged: claims.is_admin.unwrap_or(false),
            issued_at: claims.iat,
            expires_at: claims.exp,
            token_type: claims.token_type.clone(),
        }
    }
}

/// Decode the payload segment of `token`.
///
/// Accepts both URL-safe and standard base64, with or without padding.
pub fn decode_payload(token: &str) -> Result<Claims, DecodeError> {
    let segment = token
        .split('.')
        .nth(1)
        .filter(|s| !s.is_empty())
        .ok_or(DecodeError::MissingPayload)?;

    let standard: String = segment
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();

    let bytes = PAYLOAD_ENGINE.decode(standard)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Reads claims from an explicit token or the store's current credential.
///
/// Never mutates the credential and never fails: malformed input is logged
/// and reported as "no claims".
#[derive(Debug, Clone)]
pub struct CredentialInspector {
    store: CredentialStore,
}

impl CredentialInspector {
    pub fn new(store: CredentialStore) -> Self {
        Self { store }
    }

    /// Decode `token`, or the stored credential when `token` is `None` or empty.
    pub fn decode(&self, token: Option<&str>) -> Option<Claims> {
        let stored;
        let token = match token {
            Some(t) if !t.is_empty() => t,
            _ => {
                stored = self.store.get()?;
                stored.as_str()
            }
        };

        match decode_payload(token) {
            Ok(claims) => Some(claims),
            Err(e) => {
                warn!(error = %e, "Failed to decode credential payload");
                None
            }
        }
    }

    /// Advisory expiry check against the wall clock.
    ///
    /// True when decoding fails, when there is no `exp` claim, or when `exp`
    /// lies strictly in the past.
    pub fn is_expired(&self, token: Option<&str>) -> bool {
        self.is_expired_at(token, Utc::now())
    }

    /// Same as [`is_expired`](Self::is_expired) with an explicit clock.
    pub fn is_expired_at(&self, token: Option<&str>, now: DateTime<Utc>) -> bool {
        match self.decode(token) {
            Some(claims) => claims.is_expired_at(now),
            None => {
                debug!("No decodable credential, treating as expired");
                true
            }
        }
    }

    /// Identity summary, or `None` when decoding fails.
    pub fn identity(&self, token: Option<&str>) -> Option<UserInfo> {
        self.decode(token).map(|claims| UserInfo::from(&claims))
    }
}
