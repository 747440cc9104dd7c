//! Whoami command implementation.

use anyhow::{Context, Result, bail};
use clap::Args;
use serde::Serialize;
use tokenward::UserInfo;

use crate::output;
use crate::session::SessionContext;

#[derive(Args, Debug)]
pub struct WhoamiArgs {
    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct Identity<'a> {
    #[serde(flatten)]
    info: &'a UserInfo,
    expired: bool,
}

pub async fn run(ctx: &SessionContext, args: WhoamiArgs) -> Result<()> {
    let client = ctx.client()?;
    if !client.is_authenticated() {
        bail!("No active session. Run 'tokenward login' first.");
    }

    let info = client
        .user_info()
        .context("Stored credential has no readable claims")?;
    let expired = client.is_token_expired();

    if args.json {
        output::json_pretty(&Identity {
            info: &info,
            expired,
        })?;
    } else {
        print_identity(&info, expired);
    }

    Ok(())
}

pub fn print_identity(info: &UserInfo, expired: bool) {
    let subject = info
        .subject_id
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "-".to_string());

    output::field("Subject", &subject);
    output::field("Privileged", output::yes_no(info.is_privileged));
    if let Some(kind) = &info.token_type {
        output::field("Type", kind);
    }
    output::field("Issued", &output::timestamp(info.issued_at_utc()));
    output::field("Expires", &output::timestamp(info.expires_at_utc()));
    output::field("Expired", output::yes_no(expired));
}
