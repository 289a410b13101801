//! authfetch - CLI for an authenticated API.
//!
//! A thin wrapper over `authfetch-http`: log in, inspect the persisted
//! session, and send arbitrary requests through the refreshing dispatcher.

mod cli;
mod commands;
mod output;
mod session;
mod sink;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.json_logs);

    let ctx = session::Context::new(cli.base_url, cli.store)?;

    match cli.command {
        Commands::Login(args) => commands::login::run(&ctx, args).await,
        Commands::Logout(args) => commands::logout::run(&ctx, args),
        Commands::Status(args) => commands::status::run(&ctx, args),
        Commands::Refresh(args) => commands::refresh::run(&ctx, args).await,
        Commands::Whoami(args) => commands::whoami::run(&ctx, args).await,
        Commands::Request(args) => commands::request::run(&ctx, args).await,
    }
}

fn init_logging(verbosity: u8, json: bool) {
    let filter = match verbosity {
        0 => "warn,authfetch::notify=off",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // Logs go to stderr so stdout stays parseable.
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}
