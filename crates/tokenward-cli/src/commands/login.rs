//! Login command implementation.

use anyhow::{Context, Result, bail};
use clap::{ArgGroup, Args};
use colored::Colorize;
use serde_json::json;
use tokenward::Credentials;

use super::whoami;
use crate::output;
use crate::session::SessionContext;

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("method").required(true).args(["token", "username"])))]
pub struct LoginArgs {
    /// Store an access token obtained elsewhere
    #[arg(long, conflicts_with_all = ["username", "password"])]
    pub token: Option<String>,

    /// Account username
    #[arg(long, requires = "password")]
    pub username: Option<String>,

    /// Account password
    #[arg(long, requires = "username")]
    pub password: Option<String>,
}

pub async fn run(ctx: &SessionContext, args: LoginArgs) -> Result<()> {
    let client = ctx.client()?;

    match (args.token, args.username, args.password) {
        (Some(token), _, _) => {
            if !client.handle_login_response(&json!({ "access_token": token })) {
                bail!("Failed to store access token");
            }
        }
        (None, Some(username), Some(password)) => {
            eprintln!("{}", "Logging in...".dimmed());
            client
                .login(&Credentials::new(username, password))
                .await
                .context("Failed to login")?;
        }
        _ => bail!("Provide --token, or --username with --password"),
    }

    output::success("Logged in successfully");
    println!();
    match client.user_info() {
        Some(info) => whoami::print_identity(&info, client.is_token_expired()),
        None => output::field("Credential", "opaque (no readable claims)"),
    }

    Ok(())
}
