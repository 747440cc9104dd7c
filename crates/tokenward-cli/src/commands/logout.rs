//! Logout command implementation.

use anyhow::Result;
use clap::Args;

use crate::output;
use crate::session::SessionContext;

#[derive(Args, Debug)]
pub struct LogoutArgs {}

pub async fn run(ctx: &SessionContext, _args: LogoutArgs) -> Result<()> {
    ctx.client()?.logout().await;
    output::success("Logged out");
    Ok(())
}
