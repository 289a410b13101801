//! Refresh exchange trait.

use async_trait::async_trait;

use crate::error::AuthError;
use crate::{Credential, RefreshToken};

/// Trades a refresh token for a new credential.
///
/// Implementations perform exactly one network exchange per call and never
/// touch the credential store; installing or clearing the result is the
/// caller's job.
#[async_trait]
pub trait TokenExchange: Send + Sync {
    async fn exchange(&self, refresh_token: &RefreshToken) -> Result<Credential, AuthError>;
}
