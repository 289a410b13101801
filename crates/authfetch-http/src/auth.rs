//! Login, logout and profile operations.

use serde::Serialize;
use tracing::{info, instrument};

use authfetch_core::error::Error;
use authfetch_core::types::{RequestDescriptor, ResponseEnvelope};
use authfetch_core::{Credential, PasswordLogin, SmsOtpLogin, UserInfo};

use crate::dispatcher::Dispatcher;

/// Auth endpoints layered over a [`Dispatcher`].
///
/// Logins bypass bearer injection and install the returned credential in
/// the dispatcher's store when the server accepts them.
#[derive(Debug, Clone)]
pub struct AuthApi {
    dispatcher: Dispatcher,
}

impl AuthApi {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Log in with phone number and password.
    ///
    /// # Errors
    ///
    /// Only [`Error::InvalidInput`] is raised; server rejections come back
    /// as a failure envelope.
    #[instrument(skip_all)]
    pub async fn login_with_password(
        &self,
        form: &PasswordLogin,
    ) -> Result<ResponseEnvelope<Credential>, Error> {
        self.login(self.dispatcher.config().login_path(), form).await
    }

    /// Log in with phone number and one-time SMS code.
    ///
    /// # Errors
    ///
    /// Only [`Error::InvalidInput`] is raised; server rejections come back
    /// as a failure envelope.
    #[instrument(skip_all)]
    pub async fn login_with_otp(
        &self,
        form: &SmsOtpLogin,
    ) -> Result<ResponseEnvelope<Credential>, Error> {
        self.login(self.dispatcher.config().otp_login_path(), form).await
    }

    async fn login<B: Serialize>(
        &self,
        path: &str,
        form: &B,
    ) -> Result<ResponseEnvelope<Credential>, Error> {
        let request = RequestDescriptor::post(path).json(form)?.ignore_auth(true);
        let envelope = self.dispatcher.send::<Credential>(&request).await?;

        if let ResponseEnvelope::Success { ref data, .. } = envelope {
            self.dispatcher.store().set(data.clone());
            info!("Logged in");
        }

        Ok(envelope)
    }

    /// End the session locally.
    pub fn logout(&self) {
        self.dispatcher.store().clear();
        info!("Logged out");
    }

    /// Fetch the signed-in user's profile through the authenticated send path.
    ///
    /// # Errors
    ///
    /// Only [`Error::InvalidInput`] is raised.
    pub async fn current_user(&self) -> Result<ResponseEnvelope<UserInfo>, Error> {
        let request = RequestDescriptor::get(self.dispatcher.config().me_path());
        self.dispatcher.send(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use authfetch_core::BaseUrl;

    #[test]
    fn logout_clears_store() {
        let config = ClientConfig::new(BaseUrl::new("http://localhost:9").unwrap());
        let api = AuthApi::new(Dispatcher::new(config).unwrap());
        api.dispatcher()
            .store()
            .set(Credential::new("a", "r", 60).unwrap());

        api.logout();

        assert!(!api.dispatcher().store().has_credential());
    }
}
