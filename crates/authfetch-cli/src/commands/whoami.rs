//! Whoami command implementation.

use anyhow::{Result, bail};
use clap::Args;

use authfetch_core::ResponseEnvelope;

use crate::output;
use crate::session::Context;

#[derive(Args, Debug)]
pub struct WhoamiArgs {
    /// Print the profile as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(ctx: &Context, args: WhoamiArgs) -> Result<()> {
    if !ctx.store().has_credential() {
        bail!("No active session. Run 'authfetch login' first.");
    }

    let user = match ctx.auth()?.current_user().await? {
        ResponseEnvelope::Success { data, .. } => data,
        ResponseEnvelope::Failure { error_code, .. } => {
            bail!("Failed to fetch profile (code {})", error_code)
        }
    };

    if args.json {
        return output::json_pretty(&user);
    }

    output::field("ID", &user.id);
    output::field("Phone", &user.phone);
    if let Some(ref nickname) = user.nickname {
        output::field("Nickname", nickname);
    }
    output::field("Created", &user.created_at);

    Ok(())
}
