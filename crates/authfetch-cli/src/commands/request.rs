//! Request command implementation.

use anyhow::{Context as _, Result, bail};
use clap::Args;
use serde_json::Value;

use authfetch_core::{Method, RequestDescriptor, ResponseEnvelope};

use crate::output;
use crate::session::Context;

#[derive(Args, Debug)]
pub struct RequestArgs {
    /// HTTP method
    pub method: Method,

    /// URL template relative to the base URL, e.g. /users/{id}
    pub url: String,

    /// Path variable (repeatable)
    #[arg(long = "path", value_name = "NAME=VALUE", value_parser = parse_key_val)]
    pub path_vars: Vec<(String, String)>,

    /// Query parameter (repeatable)
    #[arg(long, value_name = "NAME=VALUE", value_parser = parse_key_val)]
    pub query: Vec<(String, String)>,

    /// Extra request header (repeatable)
    #[arg(long, value_name = "NAME=VALUE", value_parser = parse_key_val)]
    pub header: Vec<(String, String)>,

    /// JSON request body
    #[arg(long)]
    pub body: Option<String>,

    /// Send without the stored credential
    #[arg(long)]
    pub ignore_auth: bool,

    /// Suppress failure notifications
    #[arg(long)]
    pub silent: bool,

    /// Exit with an error instead of printing a failure envelope
    #[arg(long)]
    pub throw: bool,
}

pub async fn run(ctx: &Context, args: RequestArgs) -> Result<()> {
    let descriptor = descriptor(args)?;
    let dispatcher = ctx.dispatcher()?;

    let envelope: ResponseEnvelope<Value> = dispatcher.send(&descriptor).await?;
    output::json_pretty(&envelope)?;

    if let Some((code, _)) = envelope.failure_info() {
        bail!("Request failed (code {})", code);
    }
    Ok(())
}

fn descriptor(args: RequestArgs) -> Result<RequestDescriptor> {
    let mut descriptor = RequestDescriptor::new(args.method, args.url)
        .ignore_auth(args.ignore_auth)
        .silent_error(args.silent)
        .throw_error(args.throw);

    for (name, value) in args.path_vars {
        descriptor = descriptor.path_var(name, value);
    }
    for (name, value) in args.query {
        descriptor = descriptor.query(name, value);
    }
    for (name, value) in args.header {
        descriptor = descriptor.header(name, value);
    }
    if let Some(body) = args.body {
        let body: Value = serde_json::from_str(&body).context("--body is not valid JSON")?;
        descriptor = descriptor.body(body);
    }

    Ok(descriptor)
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", s))?;
    if key.is_empty() {
        return Err(format!("empty name in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_key_value_pairs() {
        assert_eq!(
            parse_key_val("id=7").unwrap(),
            ("id".to_string(), "7".to_string())
        );
        assert_eq!(
            parse_key_val("q=a=b").unwrap(),
            ("q".to_string(), "a=b".to_string())
        );
        assert!(parse_key_val("novalue").is_err());
        assert!(parse_key_val("=x").is_err());
    }

    #[test]
    fn builds_descriptor_from_args() {
        let args = RequestArgs {
            method: Method::Get,
            url: "/users/{id}/orders/{orderId}".to_string(),
            path_vars: vec![
                ("id".to_string(), "7".to_string()),
                ("orderId".to_string(), "42".to_string()),
            ],
            query: vec![("page".to_string(), "2".to_string())],
            header: Vec::new(),
            body: None,
            ignore_auth: true,
            silent: false,
            throw: false,
        };

        let descriptor = descriptor(args).unwrap();
        assert_eq!(descriptor.resolve_path().unwrap(), "/users/7/orders/42");
        assert!(descriptor.is_ignore_auth());
        assert_eq!(
            descriptor.query_params(),
            [("page".to_string(), "2".to_string())]
        );
    }
}
