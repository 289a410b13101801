//! Client configuration.

use std::time::Duration;

use authfetch_core::error::{Error, InvalidInputError};
use authfetch_core::types::BaseUrl;

/// Environment variable holding the API base URL.
pub const ENV_BASE_URL: &str = "AUTHFETCH_BASE_URL";

/// Environment variable holding the per-request timeout in milliseconds.
pub const ENV_TIMEOUT_MS: &str = "AUTHFETCH_TIMEOUT_MS";

/// Environment variable holding the refresh exchange bound in milliseconds.
pub const ENV_REFRESH_TIMEOUT_MS: &str = "AUTHFETCH_REFRESH_TIMEOUT_MS";

/// Environment variable overriding the refresh endpoint path.
pub const ENV_REFRESH_PATH: &str = "AUTHFETCH_REFRESH_PATH";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);
pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_millis(10_000);
pub const DEFAULT_REFRESH_PATH: &str = "/auth/token/refresh";
pub const DEFAULT_LOGIN_PATH: &str = "/auth/login";
pub const DEFAULT_OTP_LOGIN_PATH: &str = "/auth/login/sms";
pub const DEFAULT_ME_PATH: &str = "/auth/me";

/// Dispatcher configuration.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use authfetch_core::BaseUrl;
/// use authfetch_http::ClientConfig;
///
/// let config = ClientConfig::new(BaseUrl::new("https://api.example.com").unwrap())
///     .with_timeout(Duration::from_secs(5))
///     .with_refresh_path("/oauth/refresh");
///
/// assert!(config.is_token_endpoint("/oauth/refresh"));
/// assert!(!config.is_token_endpoint("/users/7"));
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    base_url: BaseUrl,
    timeout: Duration,
    refresh_timeout: Duration,
    refresh_path: String,
    login_path: String,
    otp_login_path: String,
    me_path: String,
}

impl ClientConfig {
    /// Configuration with default timeouts and endpoint paths.
    pub fn new(base_url: BaseUrl) -> Self {
        Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
            refresh_timeout: DEFAULT_REFRESH_TIMEOUT,
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            otp_login_path: DEFAULT_OTP_LOGIN_PATH.to_string(),
            me_path: DEFAULT_ME_PATH.to_string(),
        }
    }

    /// Read configuration from `AUTHFETCH_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is missing or any value is malformed.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is missing or any value is malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let base_url = lookup(ENV_BASE_URL).ok_or_else(|| InvalidInputError::Config {
            key: ENV_BASE_URL.to_string(),
            reason: "not set".to_string(),
        })?;
        let mut config = Self::new(BaseUrl::new(base_url)?);

        if let Some(ms) = lookup(ENV_TIMEOUT_MS) {
            config.timeout = parse_millis(ENV_TIMEOUT_MS, &ms)?;
        }
        if let Some(ms) = lookup(ENV_REFRESH_TIMEOUT_MS) {
            config.refresh_timeout = parse_millis(ENV_REFRESH_TIMEOUT_MS, &ms)?;
        }
        if let Some(path) = lookup(ENV_REFRESH_PATH) {
            config.refresh_path = path;
        }

        Ok(config)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = timeout;
        self
    }

    pub fn with_refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = path.into();
        self
    }

    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    pub fn with_otp_login_path(mut self, path: impl Into<String>) -> Self {
        self.otp_login_path = path.into();
        self
    }

    pub fn with_me_path(mut self, path: impl Into<String>) -> Self {
        self.me_path = path.into();
        self
    }

    pub fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn refresh_timeout(&self) -> Duration {
        self.refresh_timeout
    }

    pub fn refresh_path(&self) -> &str {
        &self.refresh_path
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    pub fn otp_login_path(&self) -> &str {
        &self.otp_login_path
    }

    pub fn me_path(&self) -> &str {
        &self.me_path
    }

    /// Returns true if `path` targets an endpoint that issues credentials.
    ///
    /// A 401 from one of these never triggers a refresh.
    pub fn is_token_endpoint(&self, path: &str) -> bool {
        let path = normalize(path);
        [&self.refresh_path, &self.login_path, &self.otp_login_path]
            .into_iter()
            .map(|endpoint| normalize(endpoint))
            .any(|endpoint| path == endpoint || path.ends_with(&format!("/{}", endpoint)))
    }
}

fn normalize(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    path.trim_matches('/')
}

fn parse_millis(key: &str, value: &str) -> Result<Duration, Error> {
    let ms: u64 = value.trim().parse().map_err(|_| InvalidInputError::Config {
        key: key.to_string(),
        reason: format!("'{}' is not a number of milliseconds", value),
    })?;
    if ms == 0 {
        return Err(InvalidInputError::Config {
            key: key.to_string(),
            reason: "must be greater than zero".to_string(),
        }
        .into());
    }
    Ok(Duration::from_millis(ms))
}
