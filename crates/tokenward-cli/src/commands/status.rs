//! Status command implementation.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::output;
use crate::session::SessionContext;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct Status {
    base_url: String,
    session_file: String,
    authenticated: bool,
    expired: bool,
    expires_at: Option<i64>,
}

pub async fn run(ctx: &SessionContext, args: StatusArgs) -> Result<()> {
    let client = ctx.client()?;
    let authenticated = client.is_authenticated();

    let status = Status {
        base_url: ctx.base_url.to_string(),
        session_file: ctx.storage_path.display().to_string(),
        authenticated,
        expired: authenticated && client.is_token_expired(),
        expires_at: client.user_info().and_then(|info| info.expires_at),
    };

    if args.json {
        return output::json_pretty(&status);
    }

    output::field("Application", &status.base_url);
    output::field("Session file", &status.session_file);
    output::field("Authenticated", output::yes_no(status.authenticated));
    if status.authenticated {
        output::field("Expired", output::yes_no(status.expired));
    }

    Ok(())
}
