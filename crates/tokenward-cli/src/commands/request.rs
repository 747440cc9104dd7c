//! Request command implementation.

use anyhow::{Context, Result, anyhow, bail};
use clap::Args;
use tokenward::{Error, Method, RequestOptions};
use tracing::{debug, warn};

use crate::session::SessionContext;

#[derive(Args, Debug)]
pub struct RequestArgs {
    /// Path relative to the base URL, or an absolute URL
    pub path: String,

    /// HTTP method
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// Extra request header, repeatable
    #[arg(short = 'H', long = "header", value_name = "NAME: VALUE")]
    pub headers: Vec<String>,

    /// Raw request body
    #[arg(short, long, conflicts_with = "json")]
    pub data: Option<String>,

    /// JSON request body
    #[arg(long)]
    pub json: Option<String>,

    /// Print the response status and headers to stderr
    #[arg(short, long)]
    pub include: bool,
}

pub async fn run(ctx: &SessionContext, args: RequestArgs) -> Result<()> {
    let options = build_options(&args)?;
    let client = ctx.client()?;

    let response = client
        .authenticated_request(&args.path, options)
        .await
        .map_err(|e| match e {
            Error::NoCredential => anyhow!("No active session. Run 'tokenward login' first."),
            other => anyhow::Error::new(other).context("Request failed"),
        })?;

    let status = response.status();
    debug!(%status, url = %response.url(), "Response received");
    if args.include {
        eprintln!("{}", status);
        for (name, value) in response.headers() {
            eprintln!("{}: {}", name, value.to_str().unwrap_or("<binary>"));
        }
        eprintln!();
    }

    let body = response
        .text()
        .await
        .context("Failed to read response body")?;
    println!("{}", body);

    if status.is_client_error() || status.is_server_error() {
        warn!(%status, path = %args.path, "Request answered with an error status");
        bail!("Server returned HTTP {}", status);
    }

    Ok(())
}

fn build_options(args: &RequestArgs) -> Result<RequestOptions> {
    let method = Method::from_bytes(args.method.to_uppercase().as_bytes())
        .with_context(|| format!("Invalid method '{}'", args.method))?;

    let mut options = RequestOptions::new(method);
    for header in &args.headers {
        let (name, value) = header
            .split_once(':')
            .with_context(|| format!("Header '{}' is not NAME: VALUE", header))?;
        options = options.header(name.trim(), value.trim())?;
    }

    if let Some(data) = &args.data {
        options = options.body(data.clone());
    }
    if let Some(json) = &args.json {
        let value: serde_json::Value = serde_json::from_str(json).context("Invalid JSON body")?;
        options = options.json(&value)?;
    }

    Ok(options)
}
