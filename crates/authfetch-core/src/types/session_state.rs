//! Derived authentication state.

use std::fmt;

use serde::Serialize;

/// Where the client's session currently stands.
///
/// Never stored: `Authenticated` means the credential store holds a
/// credential, `Refreshing` means a refresh exchange is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthSessionState {
    Authenticated,
    Unauthenticated,
    Refreshing,
}

impl AuthSessionState {
    /// Derive the state from its two inputs. An in-flight refresh wins.
    pub fn derive(has_credential: bool, refreshing: bool) -> Self {
        match (refreshing, has_credential) {
            (true, _) => AuthSessionState::Refreshing,
            (false, true) => AuthSessionState::Authenticated,
            (false, false) => AuthSessionState::Unauthenticated,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuthSessionState::Authenticated => "authenticated",
            AuthSessionState::Unauthenticated => "unauthenticated",
            AuthSessionState::Refreshing => "refreshing",
        }
    }
}

impl fmt::Display for AuthSessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
