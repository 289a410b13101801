//! Bearer and refresh token newtypes.
//!
//! Both are opaque strings whose `Debug` output never shows the value, so a
//! credential can be logged with `?` without leaking it.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! secret_token {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(token: impl Into<String>) -> Self {
                Self(token.into())
            }

            /// The raw value, for building request headers and bodies only.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&"[REDACTED]").finish()
            }
        }
    };
}

secret_token! {
    /// Sent as `Authorization: Bearer <token>` on authenticated requests.
    AccessToken
}

secret_token! {
    /// Exchanged at the refresh endpoint for a new credential.
    ///
    /// Single use: every successful exchange returns a new one.
    RefreshToken
}

impl AccessToken {
    /// Renders the `Authorization` header value.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}
