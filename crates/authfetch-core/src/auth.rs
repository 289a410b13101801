//! Login forms and the user profile returned by the auth API.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Phone number and password login.
#[derive(Clone, Serialize)]
pub struct PasswordLogin {
    pub phone: String,
    pub password: String,
}

impl PasswordLogin {
    pub fn new(phone: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            phone: phone.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for PasswordLogin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordLogin")
            .field("phone", &self.phone)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Phone number and one-time SMS code login.
#[derive(Debug, Clone, Serialize)]
pub struct SmsOtpLogin {
    pub phone: String,
    pub otp: String,
}

impl SmsOtpLogin {
    pub fn new(phone: impl Into<String>, otp: impl Into<String>) -> Self {
        Self {
            phone: phone.into(),
            otp: otp.into(),
        }
    }
}

/// Body of the refresh exchange.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenForm<'a> {
    pub refresh_token: &'a str,
}

/// The signed-in user's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}
