//! Session termination.

use std::sync::Arc;

use reqwest::Method;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::auth::CredentialStore;
use crate::http::{HttpClient, RequestContext};

/// Client-side navigation, the last step of a terminated session.
pub trait Navigator: Send + Sync {
    fn navigate(&self, location: &Url);
}

/// Navigator that only records the navigation in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingNavigator;

impl Navigator for LoggingNavigator {
    fn navigate(&self, location: &Url) {
        info!(%location, "Navigating to landing location");
    }
}

/// Ends the session: notifies the server, clears the credential, navigates.
///
/// Termination always completes locally, whatever happens on the network.
#[derive(Clone)]
pub struct SessionTerminator {
    http: HttpClient,
    store: CredentialStore,
    logout_url: Url,
    landing_url: Url,
    navigator: Arc<dyn Navigator>,
}

impl SessionTerminator {
    pub fn new(
        http: HttpClient,
        store: CredentialStore,
        logout_url: Url,
        landing_url: Url,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            http,
            store,
            logout_url,
            landing_url,
            navigator,
        }
    }

    #[instrument(skip(self), fields(logout = %self.logout_url))]
    pub async fn terminate(&self) {
        info!("Terminating session");

        // Cookie-scoped, no bearer header; the response body is ignored.
        let ctx = RequestContext::cookie_scoped(self.logout_url.clone(), Method::POST);
        match self.http.send(ctx).await {
            Ok(response) => debug!(status = %response.status(), "Logout endpoint notified"),
            Err(e) => warn!(error = %e, "Logout notification failed"),
        }

        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear stored credential");
        }

        self.navigator.navigate(&self.landing_url);
    }
}

impl std::fmt::Debug for SessionTerminator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTerminator")
            .field("logout_url", &self.logout_url)
            .field("landing_url", &self.landing_url)
            .finish_non_exhaustive()
    }
}
