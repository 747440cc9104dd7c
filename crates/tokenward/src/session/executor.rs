//! The authenticated-request state machine.
//!
//! ```text
//! Attach --no credential--> Fail(NoCredential)
//! Attach --credential-----> Send
//! Send ----transport err--> Fail(Transport)
//! Send ----response-------> Inspect
//! Inspect --not 401-------> Done(response)
//! Inspect --401-----------> Refresh
//! Refresh --failed--------> Fail(SessionExpired)   (session already terminated)
//! Refresh --new cred------> Retry
//! Retry ---transport err--> Fail(Transport)
//! Retry ---any response---> Done(response)
//! ```
//!
//! A request is retried at most once, and the retry's response is final
//! even if it is another 401.

use std::sync::Arc;

use reqwest::{Response, StatusCode};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::auth::{AccessToken, CredentialStore};
use crate::error::Error;
use crate::http::{HttpClient, RequestContext, RequestOptions};

use super::refresh::RefreshCoordinator;

enum Step {
    Attach,
    Send { token: AccessToken },
    Inspect { token: AccessToken, response: Response },
    Refresh { rejected: AccessToken },
    Retry { token: AccessToken },
    Done(Response),
    Fail(Error),
}

impl Step {
    fn name(&self) -> &'static str {
        match self {
            Step::Attach => "attach",
            Step::Send { .. } => "send",
            Step::Inspect { .. } => "inspect",
            Step::Refresh { .. } => "refresh",
            Step::Retry { .. } => "retry",
            Step::Done(_) => "done",
            Step::Fail(_) => "fail",
        }
    }
}

/// Attaches the stored credential to requests and recovers from one `401`.
#[derive(Debug, Clone)]
pub struct AuthenticatedRequestExecutor {
    http: HttpClient,
    store: CredentialStore,
    refresher: Arc<RefreshCoordinator>,
}

impl AuthenticatedRequestExecutor {
    pub fn new(
        http: HttpClient,
        store: CredentialStore,
        refresher: Arc<RefreshCoordinator>,
    ) -> Self {
        Self {
            http,
            store,
            refresher,
        }
    }

    /// Run one authenticated request to completion.
    ///
    /// Statuses other than 401 are returned as-is.
    #[instrument(skip(self, options), fields(method = %options.method, %url))]
    pub async fn execute(&self, url: Url, options: RequestOptions) -> Result<Response, Error> {
        let mut step = Step::Attach;
        loop {
            step = match step {
                Step::Done(response) => return Ok(response),
                Step::Fail(err) => return Err(err),
                current => {
                    let from = current.name();
                    let next = self.advance(&url, &options, current).await;
                    debug!(from, to = next.name(), "Request transition");
                    next
                }
            };
        }
    }

    async fn advance(&self, url: &Url, options: &RequestOptions, step: Step) -> Step {
        match step {
            Step::Attach => match self.store.get() {
                Some(token) => Step::Send { token },
                None => Step::Fail(Error::NoCredential),
            },

            Step::Send { token } => match self.send(url, options, &token).await {
                Ok(response) => Step::Inspect { token, response },
                Err(e) => Step::Fail(e),
            },

            Step::Inspect { token, response } => {
                if response.status() == StatusCode::UNAUTHORIZED {
                    info!("Credential rejected, refreshing");
                    Step::Refresh { rejected: token }
                } else {
                    Step::Done(response)
                }
            }

            Step::Refresh { rejected } => match self.refresher.refresh_rejected(&rejected).await {
                Ok(token) => Step::Retry { token },
                Err(e) => {
                    warn!(error = %e, "Refresh failed, session expired");
                    Step::Fail(Error::SessionExpired)
                }
            },

            Step::Retry { token } => match self.send(url, options, &token).await {
                Ok(response) => {
                    if response.status() == StatusCode::UNAUTHORIZED {
                        warn!("Retried request rejected again");
                    }
                    Step::Done(response)
                }
                Err(e) => Step::Fail(e),
            },

            terminal @ (Step::Done(_) | Step::Fail(_)) => terminal,
        }
    }

    async fn send(
        &self,
        url: &Url,
        options: &RequestOptions,
        token: &AccessToken,
    ) -> Result<Response, Error> {
        let ctx = RequestContext::authorized(url, options, token)?;
        Ok(self.http.send(ctx).await?)
    }
}
