//! HTTP refresh exchange.

use async_trait::async_trait;
use tracing::{debug, instrument};

use authfetch_core::error::AuthError;
use authfetch_core::types::{ResponseEnvelope, is_envelope};
use authfetch_core::{Credential, RefreshToken, RefreshTokenForm, TokenExchange};

use crate::client::{HttpClient, ResolvedRequest};

/// Posts `{refreshToken}` to the refresh endpoint and decodes the new credential.
///
/// The request never carries a bearer header and bypasses the dispatcher, so
/// the refresh endpoint can never recurse into another refresh.
#[derive(Debug, Clone)]
pub struct HttpTokenExchange {
    client: HttpClient,
    refresh_path: String,
}

impl HttpTokenExchange {
    pub fn new(client: HttpClient, refresh_path: impl Into<String>) -> Self {
        Self {
            client,
            refresh_path: refresh_path.into(),
        }
    }
}

#[async_trait]
impl TokenExchange for HttpTokenExchange {
    #[instrument(skip_all, fields(path = %self.refresh_path))]
    async fn exchange(&self, refresh_token: &RefreshToken) -> Result<Credential, AuthError> {
        let form = RefreshTokenForm {
            refresh_token: refresh_token.as_str(),
        };
        let body = serde_json::to_value(&form).map_err(|e| AuthError::RefreshRejected {
            status: None,
            message: e.to_string(),
        })?;
        let request = ResolvedRequest::post_json(&self.refresh_path, body);

        let response = self
            .client
            .execute(&request, None)
            .await
            .map_err(|e| AuthError::RefreshRejected {
                status: e.status(),
                message: e.user_message(),
            })?;

        if !response.is_success() {
            let err = response.protocol_error();
            return Err(AuthError::RefreshRejected {
                status: Some(err.status),
                message: err.user_message(),
            });
        }

        let decoded = if is_envelope(&response.body) {
            serde_json::from_value::<ResponseEnvelope<Credential>>(response.body)
        } else {
            serde_json::from_value::<Credential>(response.body).map(ResponseEnvelope::success)
        };

        match decoded {
            Ok(ResponseEnvelope::Success { data, .. }) => {
                debug!("Refresh exchange succeeded");
                Ok(data)
            }
            Ok(ResponseEnvelope::Failure {
                error_code,
                error_message,
                ..
            }) => Err(AuthError::RefreshRejected {
                status: u16::try_from(error_code).ok(),
                message: error_message,
            }),
            Err(e) => Err(AuthError::RefreshRejected {
                status: Some(response.status),
                message: format!("malformed refresh response: {}", e),
            }),
        }
    }
}
