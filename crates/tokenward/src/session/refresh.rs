//! Credential refresh.

use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::auth::{AccessToken, CredentialStore};
use crate::error::{Error, RefreshError};
use crate::http::{HttpClient, RequestContext};

use super::terminate::SessionTerminator;

/// Success body of the refresh endpoint.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    #[serde(default)]
    access_token: Option<String>,
}

/// Exchanges the session cookie for a new access credential.
///
/// Exchanges are serialised: a caller whose rejected credential was already
/// replaced while it waited reuses the stored one instead of refreshing
/// again. Any failed exchange terminates the session before the error is
/// returned.
pub struct RefreshCoordinator {
    http: HttpClient,
    store: CredentialStore,
    terminator: SessionTerminator,
    refresh_url: Url,
    gate: Mutex<()>,
}

impl RefreshCoordinator {
    pub fn new(
        http: HttpClient,
        store: CredentialStore,
        terminator: SessionTerminator,
        refresh_url: Url,
    ) -> Self {
        Self {
            http,
            store,
            terminator,
            refresh_url,
            gate: Mutex::new(()),
        }
    }

    /// Refresh unconditionally and store the new credential.
    #[instrument(skip(self), fields(url = %self.refresh_url))]
    pub async fn refresh(&self) -> Result<AccessToken, Error> {
        let _gate = self.gate.lock().await;
        self.exchange_or_terminate().await
    }

    /// Refresh after the server rejected `rejected`.
    ///
    /// Reuses the stored credential when a concurrent refresh already
    /// replaced `rejected`; fails with [`RefreshError::SessionEnded`] when a
    /// concurrent refresh failed and emptied the store.
    #[instrument(skip(self, rejected), fields(url = %self.refresh_url))]
    pub async fn refresh_rejected(&self, rejected: &AccessToken) -> Result<AccessToken, Error> {
        let _gate = self.gate.lock().await;

        match self.store.get() {
            Some(current) if current != *rejected => {
                debug!("Credential already replaced by a concurrent refresh");
                Ok(current)
            }
            Some(_) => self.exchange_or_terminate().await,
            None => {
                debug!("Session ended while waiting to refresh");
                Err(RefreshError::SessionEnded.into())
            }
        }
    }

    async fn exchange_or_terminate(&self) -> Result<AccessToken, Error> {
        match self.exchange().await {
            Ok(token) => Ok(token),
            Err(e) => {
                warn!(error = %e, "Credential refresh failed");
                self.terminator.terminate().await;
                Err(e.into())
            }
        }
    }

    async fn exchange(&self) -> Result<AccessToken, RefreshError> {
        info!("Refreshing access credential");

        let mut ctx = RequestContext::cookie_scoped(self.refresh_url.clone(), Method::POST);
        ctx.options
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let response = self
            .http
            .send(ctx)
            .await
            .map_err(RefreshError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RefreshError::Rejected {
                status: status.as_u16(),
            });
        }

        let body: RefreshResponse = response.json().await.map_err(|e| RefreshError::MalformedBody {
            message: e.to_string(),
        })?;

        let token = body
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or(RefreshError::MissingAccessToken)?;

        if let Err(e) = self.store.set(&token) {
            warn!(error = %e, "Failed to store refreshed credential");
        }

        debug!("Access credential refreshed");
        Ok(AccessToken::new(token))
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("refresh_url", &self.refresh_url)
            .finish_non_exhaustive()
    }
}
