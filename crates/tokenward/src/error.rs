//! Error types for the tokenward library.
//!
//! This module provides a unified error type with explicit variants for the
//! failure modes of the authenticated-request protocol: missing credential,
//! transport, refresh, terminal session expiry, login, storage and input
//! validation. Credential decoding has its own [`DecodeError`], which never
//! escapes the inspector's `Option` API.

use thiserror::Error;

/// The unified error type for tokenward operations.
#[derive(Debug, Error)]
pub enum Error {
    /// No access credential was stored when a request was attempted.
    ///
    /// No network call was made. The caller must authenticate first.
    #[error("no access credential available")]
    NoCredential,

    /// Network transport errors (connection, timeout, HTTP plumbing).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The refresh endpoint rejected the exchange or answered with a
    /// malformed body. The session has already been terminated.
    #[error("credential refresh failed: {0}")]
    RefreshFailed(#[from] RefreshError),

    /// Terminal: an authorization failure could not be recovered and the
    /// session has been terminated.
    #[error("session expired, please log in again")]
    SessionExpired,

    /// The login endpoint did not yield a credential.
    #[error("login failed: {0}")]
    Login(#[from] LoginError),

    /// Client-side storage could not be read or written.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Input validation errors (URLs, header values).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

/// Transport-level errors.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::Connection {
                message: err.to_string(),
            }
        } else {
            TransportError::Http {
                message: err.to_string(),
            }
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(TransportError::from(err))
    }
}

/// Reasons a credential refresh failed.
#[derive(Debug, Clone, Error)]
pub enum RefreshError {
    /// The refresh endpoint answered with a non-success status.
    #[error("refresh endpoint returned HTTP {status}")]
    Rejected { status: u16 },

    /// The response body carried no `access_token`.
    #[error("no access token in refresh response")]
    MissingAccessToken,

    /// The response body was not the expected JSON shape.
    #[error("malformed refresh response: {message}")]
    MalformedBody { message: String },

    /// The exchange never reached the server.
    #[error("refresh transport failed: {0}")]
    Transport(TransportError),

    /// A concurrent refresh already failed and ended the session.
    #[error("session already ended")]
    SessionEnded,
}

/// Reasons a login did not produce a stored credential.
#[derive(Debug, Error)]
pub enum LoginError {
    /// The login endpoint answered with a non-success status.
    #[error("login endpoint returned HTTP {status}")]
    Rejected { status: u16 },

    /// The login payload carried no `access_token`.
    #[error("no access token in login response")]
    MissingAccessToken,
}

/// Client-side storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file exists but is not a valid storage document.
    #[error("storage is corrupt: {message}")]
    Corrupt { message: String },
}

/// Errors decoding a credential's payload segment.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The token does not have a payload segment.
    #[error("token has no payload segment")]
    MissingPayload,

    /// The payload segment is not valid base64.
    #[error("payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The decoded payload is not a JSON claims object.
    #[error("payload is not a claims object: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid application URL.
    #[error("invalid application URL '{value}': {reason}")]
    AppUrl { value: String, reason: String },

    /// A request URL could not be resolved against the application URL.
    #[error("invalid request URL '{value}': {reason}")]
    Url { value: String, reason: String },

    /// A header name or value contains forbidden characters.
    #[error("invalid header: {reason}")]
    Header { reason: String },

    /// A request body could not be serialized.
    #[error("invalid request body: {reason}")]
    Body { reason: String },
}

impl Error {
    /// Check if this error ended the session.
    pub fn is_session_terminal(&self) -> bool {
        matches!(self, Error::SessionExpired | Error::RefreshFailed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_failure_is_terminal() {
        let err = Error::from(RefreshError::Rejected { status: 401 });
        assert!(err.is_session_terminal());
        assert!(err.to_string().contains("401"));
    }

    #[test]
    fn transport_error_is_not_terminal() {
        let err = Error::from(TransportError::Timeout);
        assert!(!err.is_session_terminal());
        assert!(!Error::NoCredential.is_session_terminal());
    }
}
