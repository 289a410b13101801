//! The access/refresh credential pair.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, InvalidInputError};
use crate::tokens::{AccessToken, RefreshToken};

/// An authenticated session's credential.
///
/// Both tokens are always present; a half credential cannot be constructed.
/// `expires_in` is the validity window in seconds as issued by the server,
/// or `0` when unknown (for example after restoring from storage).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireCredential", rename_all = "camelCase")]
pub struct Credential {
    access_token: AccessToken,
    refresh_token: RefreshToken,
    expires_in: u64,
}

/// Wire form accepted from the auth server. Older endpoints call the access token `token`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCredential {
    #[serde(alias = "token")]
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: u64,
}

impl TryFrom<WireCredential> for Credential {
    type Error = Error;

    fn try_from(wire: WireCredential) -> Result<Self, Self::Error> {
        Credential::new(wire.access_token, wire.refresh_token, wire.expires_in)
    }
}

impl Credential {
    /// Create a credential, rejecting empty tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if either token is empty.
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_in: u64,
    ) -> Result<Self, Error> {
        let access_token = access_token.into();
        let refresh_token = refresh_token.into();

        if access_token.is_empty() {
            return Err(InvalidInputError::Credential {
                reason: "access token is empty".to_string(),
            }
            .into());
        }
        if refresh_token.is_empty() {
            return Err(InvalidInputError::Credential {
                reason: "refresh token is empty".to_string(),
            }
            .into());
        }

        Ok(Self {
            access_token: AccessToken::new(access_token),
            refresh_token: RefreshToken::new(refresh_token),
            expires_in,
        })
    }

    pub fn access_token(&self) -> &AccessToken {
        &self.access_token
    }

    pub fn refresh_token(&self) -> &RefreshToken {
        &self.refresh_token
    }

    /// Validity window in seconds, `0` if unknown.
    pub fn expires_in(&self) -> u64 {
        self.expires_in
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &self.access_token)
            .field("refresh_token", &self.refresh_token)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_half_credential() {
        assert!(Credential::new("", "refresh", 0).is_err());
        assert!(Credential::new("access", "", 0).is_err());
    }

    #[test]
    fn deserializes_token_alias() {
        let credential: Credential = serde_json::from_value(json!({
            "token": "a1",
            "refreshToken": "r1",
            "expiresIn": 3600
        }))
        .unwrap();

        assert_eq!(credential.access_token().as_str(), "a1");
        assert_eq!(credential.refresh_token().as_str(), "r1");
        assert_eq!(credential.expires_in(), 3600);
    }

    #[test]
    fn serializes_camel_case() {
        let credential = Credential::new("a1", "r1", 60).unwrap();
        let value = serde_json::to_value(&credential).unwrap();
        assert_eq!(
            value,
            json!({"accessToken": "a1", "refreshToken": "r1", "expiresIn": 60})
        );
    }

    #[test]
    fn deserialize_rejects_empty_refresh_token() {
        let result: Result<Credential, _> =
            serde_json::from_value(json!({"accessToken": "a1", "refreshToken": ""}));
        assert!(result.is_err());
    }

    #[test]
    fn debug_is_redacted() {
        let credential = Credential::new("secret-access", "secret-refresh", 0).unwrap();
        let debug = format!("{:?}", credential);
        assert!(!debug.contains("secret"));
    }
}
