//! Validated value types.

mod app_url;

pub use app_url::AppUrl;
