//! The session-layer façade.

use std::sync::Arc;

use reqwest::{Method, Response};
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::auth::{
    AccessToken, CredentialInspector, CredentialStore, Credentials, MemoryStorage, StorageBackend,
    UserInfo,
};
use crate::config::ClientConfig;
use crate::error::{Error, LoginError};
use crate::http::{CookieJar, CredentialsMode, HttpClient, RequestContext, RequestOptions};
use crate::session::{
    AuthenticatedRequestExecutor, LoggingNavigator, Navigator, RefreshCoordinator,
    SessionTerminator,
};

/// Entry point for display collaborators.
///
/// Wires every component over one injected storage backend. Cheap to clone;
/// clones share the credential slot, the cookie jar and the refresh gate.
///
/// # Example
///
/// ```no_run
/// use tokenward::{AppUrl, AuthClient, ClientConfig, RequestOptions};
///
/// # async fn example() -> Result<(), tokenward::Error> {
/// let config = ClientConfig::new(AppUrl::new("https://app.example.com")?);
/// let client = AuthClient::in_memory(config)?;
///
/// client.handle_login_response(&serde_json::json!({"access_token": "eyJ..."}));
/// let response = client
///     .authenticated_request("/api/nearby", RequestOptions::get())
///     .await?;
/// println!("{}", response.status());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AuthClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: ClientConfig,
    http: HttpClient,
    store: CredentialStore,
    inspector: CredentialInspector,
    refresher: Arc<RefreshCoordinator>,
    terminator: SessionTerminator,
    executor: AuthenticatedRequestExecutor,
}

impl AuthClient {
    /// Build a client over `storage`, navigating with `navigator` when the
    /// session ends.
    pub fn new(
        config: ClientConfig,
        storage: Arc<dyn StorageBackend>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, Error> {
        let cookies = Arc::new(CookieJar::persistent(
            storage.clone(),
            config.cookie_storage_key.clone(),
        ));
        let http = HttpClient::new(&config, cookies)?;
        let store = CredentialStore::new(storage, config.storage_key.clone());
        let inspector = CredentialInspector::new(store.clone());

        let terminator = SessionTerminator::new(
            http.clone(),
            store.clone(),
            config.logout_url()?,
            config.landing_url()?,
            navigator,
        );
        let refresher = Arc::new(RefreshCoordinator::new(
            http.clone(),
            store.clone(),
            terminator.clone(),
            config.refresh_url()?,
        ));
        let executor =
            AuthenticatedRequestExecutor::new(http.clone(), store.clone(), refresher.clone());

        Ok(Self {
            inner: Arc::new(ClientInner {
                config,
                http,
                store,
                inspector,
                refresher,
                terminator,
                executor,
            }),
        })
    }

    /// A client with process-local storage and a logging navigator.
    pub fn in_memory(config: ClientConfig) -> Result<Self, Error> {
        Self::new(
            config,
            Arc::new(MemoryStorage::new()),
            Arc::new(LoggingNavigator),
        )
    }

    /// Send `url` (absolute, or relative to the application) with the
    /// stored credential, refreshing and retrying once on a `401`.
    ///
    /// # Errors
    ///
    /// - [`Error::NoCredential`] before any network call when nothing is stored
    /// - [`Error::Transport`] when a send fails on the network
    /// - [`Error::SessionExpired`] when the refresh failed; the session has
    ///   already been terminated
    pub async fn authenticated_request(
        &self,
        url: &str,
        options: RequestOptions,
    ) -> Result<Response, Error> {
        let url = self.inner.http.resolve(url)?;
        self.inner.executor.execute(url, options).await
    }

    /// Presence check only; see [`CredentialStore::is_authenticated`].
    pub fn is_authenticated(&self) -> bool {
        self.inner.store.is_authenticated()
    }

    /// Advisory identity of the stored credential.
    pub fn user_info(&self) -> Option<UserInfo> {
        self.inner.inspector.identity(None)
    }

    /// Advisory, fail-closed expiry of the stored credential.
    pub fn is_token_expired(&self) -> bool {
        self.inner.inspector.is_expired(None)
    }

    /// Store the `access_token` of a login payload.
    ///
    /// Returns whether a credential was stored; storage is unchanged otherwise.
    pub fn handle_login_response(&self, data: &Value) -> bool {
        let Some(token) = data
            .get("access_token")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
        else {
            return false;
        };

        match self.inner.store.set(token) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Failed to store login credential");
                false
            }
        }
    }

    /// Log in against the application's login endpoint.
    #[instrument(skip(self, credentials), fields(username = %credentials.username()))]
    pub async fn login(&self, credentials: &Credentials) -> Result<(), Error> {
        info!("Logging in");

        let url = self.inner.config.login_url()?;
        let options = RequestOptions::new(Method::POST).json(credentials)?;
        let ctx = RequestContext::new(url, options).with_credentials(CredentialsMode::SameOrigin);

        let response = self.inner.http.send(ctx).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LoginError::Rejected {
                status: status.as_u16(),
            }
            .into());
        }

        let body: Value = response.json().await.unwrap_or(Value::Null);
        if self.handle_login_response(&body) {
            info!("Logged in");
            Ok(())
        } else {
            Err(LoginError::MissingAccessToken.into())
        }
    }

    /// Exchange the session cookie for a new credential now.
    ///
    /// A failure terminates the session before returning.
    pub async fn refresh(&self) -> Result<AccessToken, Error> {
        self.inner.refresher.refresh().await
    }

    /// Terminate the session.
    pub async fn logout(&self) {
        self.inner.terminator.terminate().await;
    }

    pub fn store(&self) -> &CredentialStore {
        &self.inner.store
    }

    pub fn inspector(&self) -> &CredentialInspector {
        &self.inner.inspector
    }

    /// The underlying transport, for unauthenticated calls sharing the jar.
    pub fn http(&self) -> &HttpClient {
        &self.inner.http
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }
}

impl std::fmt::Debug for AuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthClient")
            .field("base_url", &self.inner.config.base_url)
            .field("credential", &"[REDACTED]")
            .finish()
    }
}
