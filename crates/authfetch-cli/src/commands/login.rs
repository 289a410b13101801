//! Login command implementation.

use anyhow::{Result, bail};
use clap::{ArgGroup, Args};
use colored::Colorize;

use authfetch_core::{PasswordLogin, ResponseEnvelope, SmsOtpLogin};

use crate::output;
use crate::session::Context;

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("secret").required(true).args(["password", "otp"])))]
pub struct LoginArgs {
    /// Phone number to authenticate with
    #[arg(long)]
    pub phone: String,

    /// Account password
    #[arg(long)]
    pub password: Option<String>,

    /// One-time code received by SMS
    #[arg(long)]
    pub otp: Option<String>,
}

pub async fn run(ctx: &Context, args: LoginArgs) -> Result<()> {
    let auth = ctx.auth()?;

    eprintln!("{}", "Logging in...".dimmed());

    let envelope = match (args.password, args.otp) {
        (Some(password), _) => {
            auth.login_with_password(&PasswordLogin::new(&args.phone, password))
                .await?
        }
        (None, Some(otp)) => auth.login_with_otp(&SmsOtpLogin::new(&args.phone, otp)).await?,
        (None, None) => bail!("Either --password or --otp is required"),
    };

    match envelope {
        ResponseEnvelope::Success { data, .. } => {
            output::success("Logged in successfully");
            output::field("Phone", &args.phone);
            if data.expires_in() > 0 {
                output::field("Expires in", &format!("{}s", data.expires_in()));
            }
            Ok(())
        }
        ResponseEnvelope::Failure { error_code, .. } => {
            bail!("Login failed (code {})", error_code)
        }
    }
}
