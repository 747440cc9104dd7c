//! Subcommand implementations.

mod login;
mod logout;
mod refresh;
mod request;
mod status;
mod whoami;

use anyhow::Result;
use clap::Subcommand;

use crate::session::SessionContext;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in with a username and password, or store an existing token
    Login(login::LoginArgs),

    /// Display the identity carried by the stored credential
    Whoami(whoami::WhoamiArgs),

    /// Show whether a session is active
    Status(status::StatusArgs),

    /// Send an authenticated request, refreshing once on 401
    Request(request::RequestArgs),

    /// Exchange the session cookie for a new credential
    Refresh(refresh::RefreshArgs),

    /// End the session
    Logout(logout::LogoutArgs),
}

pub async fn handle(cmd: Commands, ctx: &SessionContext) -> Result<()> {
    match cmd {
        Commands::Login(args) => login::run(ctx, args).await,
        Commands::Whoami(args) => whoami::run(ctx, args).await,
        Commands::Status(args) => status::run(ctx, args).await,
        Commands::Request(args) => request::run(ctx, args).await,
        Commands::Refresh(args) => refresh::run(ctx, args).await,
        Commands::Logout(args) => logout::run(ctx, args).await,
    }
}
