//! Status command implementation.

use anyhow::Result;
use clap::Args;

use authfetch_core::AuthSessionState;

use crate::session::Context;

#[derive(Args, Debug)]
pub struct StatusArgs {}

/// Prints the session state; needs no network access or base URL.
pub fn run(ctx: &Context, _args: StatusArgs) -> Result<()> {
    let state = AuthSessionState::derive(ctx.store().has_credential(), false);
    println!("{}", state);
    Ok(())
}
