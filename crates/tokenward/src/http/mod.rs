//! HTTP plumbing: request description, cookie jar and transport.

mod client;
mod cookies;
mod request;

pub use client::HttpClient;
pub use cookies::CookieJar;
pub use request::{CredentialsMode, RequestContext, RequestOptions};
