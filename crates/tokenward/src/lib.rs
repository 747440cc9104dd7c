//! tokenward - client-side session and access-token lifecycle.
//!
//! This library manages a short-lived bearer credential on behalf of a web
//! client. Every authenticated call flows through
//! [`AuthClient::authenticated_request`], which attaches the stored
//! credential, and on a `401` exchanges the session cookie for a new
//! credential and retries the call exactly once. When the exchange fails
//! the session is terminated: the server is told, the credential is
//! cleared and the client navigates back to its landing location.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use tokenward::{AppUrl, AuthClient, ClientConfig, FileStorage, LoggingNavigator, RequestOptions};
//!
//! # async fn example() -> Result<(), tokenward::Error> {
//! let config = ClientConfig::new(AppUrl::new("https://app.example.com")?);
//! let storage = Arc::new(FileStorage::new("/tmp/tokenward/storage.json"));
//! let client = AuthClient::new(config, storage, Arc::new(LoggingNavigator))?;
//!
//! if let Some(user) = client.user_info() {
//!     println!("signed in as {:?}", user.subject_id);
//! }
//!
//! let response = client
//!     .authenticated_request("/api/nearby", RequestOptions::get())
//!     .await?;
//! println!("{}", response.text().await?);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod session;
pub mod types;

// Re-export primary types at crate root for convenience
pub use auth::{
    AccessToken, Claims, CredentialInspector, CredentialStore, Credentials, FileStorage,
    MemoryStorage, StorageBackend, SubjectId, UserInfo,
};
pub use client::AuthClient;
pub use config::ClientConfig;
pub use error::Error;
pub use http::{CredentialsMode, RequestOptions};
pub use session::{LoggingNavigator, Navigator};
pub use types::AppUrl;

pub use reqwest::{Method, Response, StatusCode};
pub use url::Url;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
