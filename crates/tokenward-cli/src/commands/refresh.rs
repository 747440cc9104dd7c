//! Refresh command implementation.

use anyhow::{Context, Result};
use clap::Args;

use crate::output;
use crate::session::SessionContext;

#[derive(Args, Debug)]
pub struct RefreshArgs {}

pub async fn run(ctx: &SessionContext, _args: RefreshArgs) -> Result<()> {
    let client = ctx.client()?;

    let token = client
        .refresh()
        .await
        .context("Failed to refresh credential")?;

    output::success("Credential refreshed");
    if let Some(info) = client.inspector().identity(Some(token.as_str())) {
        output::field("Expires", &output::timestamp(info.expires_at_utc()));
    }

    Ok(())
}
