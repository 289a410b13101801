//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::{login, logout, refresh, request, status, whoami};

/// Talk to an authenticated API with automatic token refresh.
#[derive(Parser, Debug)]
#[command(name = "authfetch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// API base URL
    #[arg(long, env = "AUTHFETCH_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Credential store file (defaults to the platform data directory)
    #[arg(long, env = "AUTHFETCH_STORE", global = true)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and persist the issued credential
    Login(login::LoginArgs),

    /// Forget the persisted credential
    Logout(logout::LogoutArgs),

    /// Print whether a credential is held
    Status(status::StatusArgs),

    /// Exchange the refresh token for a new credential
    Refresh(refresh::RefreshArgs),

    /// Fetch the signed-in user's profile
    Whoami(whoami::WhoamiArgs),

    /// Send a request through the dispatcher and print the envelope
    Request(request::RequestArgs),
}
