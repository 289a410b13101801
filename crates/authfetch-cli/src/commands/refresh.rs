//! Refresh command implementation.

use anyhow::{Context as _, Result, bail};
use clap::Args;
use colored::Colorize;

use crate::output;
use crate::session::Context;

#[derive(Args, Debug)]
pub struct RefreshArgs {}

pub async fn run(ctx: &Context, _args: RefreshArgs) -> Result<()> {
    if !ctx.store().has_credential() {
        bail!("No active session. Run 'authfetch login' first.");
    }

    let dispatcher = ctx.dispatcher()?;

    eprintln!("{}", "Refreshing session...".dimmed());

    let credential = dispatcher
        .refresh_session()
        .await
        .context("Failed to refresh session")?;

    output::success("Session refreshed successfully");
    if credential.expires_in() > 0 {
        output::field("Expires in", &format!("{}s", credential.expires_in()));
    }

    Ok(())
}
