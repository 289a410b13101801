//! API base URL type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::error::{Error, InvalidInputError};

/// A validated API base URL.
///
/// Base URLs must be absolute and use HTTPS, or HTTP when the host is
/// localhost. Request paths are joined onto the base, so a base with a path
/// prefix (`https://api.example.com/v1`) keeps that prefix.
///
/// # Example
///
/// ```
/// use authfetch_core::BaseUrl;
///
/// let base = BaseUrl::new("https://api.example.com/v1/").unwrap();
/// assert_eq!(base.join("/users/7"), "https://api.example.com/v1/users/7");
/// assert_eq!(base.join("users/7"), "https://api.example.com/v1/users/7");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BaseUrl(Url);

impl BaseUrl {
    /// Create a new base URL from a string, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not valid or doesn't meet requirements.
    pub fn new(s: impl AsRef<str>) -> Result<Self, Error> {
        let s = s.as_ref();
        let url = Url::parse(s).map_err(|e| InvalidInputError::BaseUrl {
            value: s.to_string(),
            reason: e.to_string(),
        })?;

        if let Some(reason) = rejection(&url) {
            return Err(InvalidInputError::BaseUrl {
                value: s.to_string(),
                reason: reason.to_string(),
            }
            .into());
        }

        Ok(Self(url))
    }

    /// Returns the absolute URL for a request path.
    ///
    /// Absolute `http(s)://` targets are passed through untouched.
    pub fn join(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let base = self.0.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }

    /// Returns the base URL as a string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the inner URL.
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// Returns the host string.
    pub fn host(&self) -> Option<&str> {
        self.0.host_str()
    }
}

/// Why `url` cannot serve as a base, if it cannot.
fn rejection(url: &Url) -> Option<&'static str> {
    if url.cannot_be_a_base() {
        return Some("must be an absolute URL");
    }

    let Some(host) = url.host_str() else {
        return Some("must have a host");
    };
    let loopback = matches!(host, "localhost" | "127.0.0.1" | "[::1]");

    match url.scheme() {
        "https" => {}
        "http" if loopback => {}
        _ => return Some("must use HTTPS (HTTP allowed only for localhost)"),
    }

    if url.query().is_some() || url.fragment().is_some() {
        return Some("must not carry a query or fragment");
    }

    None
}

impl fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BaseUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for BaseUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.0.as_str())
    }
}

impl<'de> Deserialize<'de> for BaseUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        BaseUrl::new(&s).map_err(serde::de::Error::custom)
    }
}

impl AsRef<str> for BaseUrl {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_https_url() {
        let base = BaseUrl::new("https://api.example.com").unwrap();
        assert_eq!(base.host(), Some("api.example.com"));
    }

    #[test]
    fn valid_localhost_http() {
        let base = BaseUrl::new("http://localhost:8080").unwrap();
        assert_eq!(base.host(), Some("localhost"));
        assert!(BaseUrl::new("http://127.0.0.1:9000").is_ok());
    }

    #[test]
    fn join_handles_slashes() {
        let base = BaseUrl::new("https://api.example.com/").unwrap();
        assert_eq!(base.join("/auth/me"), "https://api.example.com/auth/me");

        let base = BaseUrl::new("https://api.example.com/v2").unwrap();
        assert_eq!(base.join("auth/me"), "https://api.example.com/v2/auth/me");
    }

    #[test]
    fn join_passes_absolute_targets_through() {
        let base = BaseUrl::new("https://api.example.com").unwrap();
        assert_eq!(
            base.join("https://cdn.example.com/a.png"),
            "https://cdn.example.com/a.png"
        );
    }

    #[test]
    fn invalid_http_non_localhost() {
        assert!(BaseUrl::new("http://api.example.com").is_err());
    }

    #[test]
    fn invalid_relative_url() {
        assert!(BaseUrl::new("/api").is_err());
    }

    #[test]
    fn rejects_query() {
        assert!(BaseUrl::new("https://api.example.com/?x=1").is_err());
    }
}
