//! Logout command implementation.

use anyhow::Result;
use clap::Args;

use crate::output;
use crate::session::Context;

#[derive(Args, Debug)]
pub struct LogoutArgs {}

pub fn run(ctx: &Context, _args: LogoutArgs) -> Result<()> {
    ctx.store().clear();
    output::success("Logged out");
    Ok(())
}
