//! HTTP transport.

use std::sync::Arc;

use reqwest::header::COOKIE;
use tracing::{debug, instrument, trace};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{Error, TransportError};
use crate::types::AppUrl;

use super::cookies::CookieJar;
use super::request::{CredentialsMode, RequestContext};

/// HTTP client that applies a [`CredentialsMode`] to a shared cookie jar.
///
/// Responses come back untouched: status handling belongs to the caller.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    app: AppUrl,
    cookies: Arc<CookieJar>,
}

impl HttpClient {
    /// Build a client for `config`, carrying cookies in `cookies`.
    pub fn new(config: &ClientConfig, cookies: Arc<CookieJar>) -> Result<Self, Error> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.as_str());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            app: config.base_url.clone(),
            cookies,
        })
    }

    /// The application this client resolves against.
    pub fn app(&self) -> &AppUrl {
        &self.app
    }

    /// Resolve `target` against the application URL.
    pub fn resolve(&self, target: &str) -> Result<Url, Error> {
        self.app.resolve(target)
    }

    /// Issue one request. Network failures map to [`TransportError`]; any
    /// HTTP status, including errors, is a successful send.
    #[instrument(skip(self, ctx), fields(method = %ctx.options.method, url = %ctx.url))]
    pub async fn send(&self, ctx: RequestContext) -> Result<reqwest::Response, TransportError> {
        let with_cookies = self.cookies_allowed(ctx.credentials, &ctx.url);
        debug!(credentials = ?ctx.credentials, with_cookies, "HTTP request");

        let mut request = self
            .client
            .request(ctx.options.method, ctx.url.clone())
            .headers(ctx.options.headers);

        if with_cookies && let Some(cookie) = self.cookies.cookie_header(&ctx.url) {
            request = request.header(COOKIE, cookie);
        }
        if let Some(body) = ctx.options.body {
            request = request.body(body);
        }

        let response = request.send().await?;
        trace!(status = %response.status(), "HTTP response");

        if with_cookies {
            self.cookies.absorb(response.url(), response.headers());
        }

        Ok(response)
    }

    fn cookies_allowed(&self, mode: CredentialsMode, url: &Url) -> bool {
        match mode {
            CredentialsMode::Include => true,
            CredentialsMode::SameOrigin => self.app.is_same_origin(url),
            CredentialsMode::Omit => false,
        }
    }
}
