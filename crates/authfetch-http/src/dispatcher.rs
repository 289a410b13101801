//! The request dispatcher.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use authfetch_core::error::{AuthError, Error, FALLBACK_STATUS, TransportError};
use authfetch_core::types::{AuthSessionState, RequestDescriptor, ResponseEnvelope, is_envelope};
use authfetch_core::{
    AccessToken, Credential, CredentialStore, NotificationSink, TokenExchange, TracingSink,
};

use crate::client::{HttpClient, HttpResponse, ResolvedRequest};
use crate::config::ClientConfig;
use crate::exchange::HttpTokenExchange;
use crate::refresh::{RefreshCoordinator, SESSION_EXPIRED_MESSAGE};

/// Sends request descriptors with bearer injection and 401 recovery.
///
/// Cloning is cheap; clones share the credential store, the notification
/// sink and the in-flight refresh.
///
/// # Example
///
/// ```no_run
/// use authfetch_core::{BaseUrl, RequestDescriptor, ResponseEnvelope};
/// use authfetch_http::{ClientConfig, Dispatcher};
///
/// # async fn example() -> Result<(), authfetch_core::Error> {
/// let config = ClientConfig::new(BaseUrl::new("https://api.example.com")?);
/// let dispatcher = Dispatcher::new(config)?;
///
/// let request = RequestDescriptor::get("/users/{id}").path_var("id", 7);
/// match dispatcher.send::<serde_json::Value>(&request).await? {
///     ResponseEnvelope::Success { data, .. } => println!("{}", data),
///     ResponseEnvelope::Failure { error_code, error_message, .. } => {
///         eprintln!("{}: {}", error_code, error_message)
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

struct Inner {
    config: ClientConfig,
    client: HttpClient,
    store: Arc<CredentialStore>,
    sink: Arc<dyn NotificationSink>,
    refresh: RefreshCoordinator,
}

/// A failed request chain on its way to becoming an envelope or an error.
struct Failure {
    error: Error,
    status: u16,
    message: String,
    /// The sink already heard about this chain.
    notified: bool,
}

impl Failure {
    fn from_error(error: Error) -> Self {
        Self {
            status: error.status().unwrap_or(FALLBACK_STATUS),
            message: error.user_message(),
            error,
            notified: false,
        }
    }

    /// The refresh coordinator reports these itself, so the dispatcher
    /// must not notify again.
    fn session_expired(error: AuthError) -> Self {
        Self {
            error: Error::Auth(error),
            status: 401,
            message: SESSION_EXPIRED_MESSAGE.to_string(),
            notified: true,
        }
    }
}

impl Dispatcher {
    /// Dispatcher with an in-memory store, the tracing sink and the HTTP
    /// refresh exchange.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        Self::builder(config).build()
    }

    pub fn builder(config: ClientConfig) -> DispatcherBuilder {
        DispatcherBuilder {
            config,
            store: None,
            sink: None,
            exchange: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<CredentialStore> {
        &self.inner.store
    }

    pub fn sink(&self) -> &Arc<dyn NotificationSink> {
        &self.inner.sink
    }

    /// Current authentication state, derived on every call.
    pub fn session_state(&self) -> AuthSessionState {
        AuthSessionState::derive(
            self.inner.store.has_credential(),
            self.inner.refresh.is_refreshing(),
        )
    }

    /// Number of refresh exchanges started by this dispatcher.
    pub fn refresh_count(&self) -> u64 {
        self.inner.refresh.exchanges_started()
    }

    /// Force a refresh exchange, joining one already in flight.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Auth`] if the exchange fails; the store is cleared.
    pub async fn refresh_session(&self) -> Result<Credential, Error> {
        Ok(self.inner.refresh.refresh(false).await?)
    }

    /// Send one logical request.
    ///
    /// A 401 on an authenticated request triggers one shared refresh and one
    /// retry. Failures become a [`ResponseEnvelope::Failure`] unless the
    /// descriptor asks for them to be raised.
    ///
    /// # Errors
    ///
    /// Always returns [`Error::InvalidInput`] for a descriptor that cannot be
    /// resolved. Other failures are returned as errors only when the
    /// descriptor has `throw_error` set.
    #[instrument(skip_all, fields(method = %descriptor.method(), url = %descriptor.url()))]
    pub async fn send<T: DeserializeOwned>(
        &self,
        descriptor: &RequestDescriptor,
    ) -> Result<ResponseEnvelope<T>, Error> {
        let request = ResolvedRequest::from_descriptor(descriptor)?;
        let outcome = self.run(&request, descriptor).await;
        self.settle(outcome, descriptor)
    }

    /// Token to attach to a request, or `None` for anonymous requests.
    ///
    /// The returned token is remembered by the caller so that a 401 can be
    /// matched against the credential that was actually sent.
    pub fn authorize(&self, descriptor: &RequestDescriptor) -> Option<AccessToken> {
        if descriptor.is_ignore_auth() {
            return None;
        }
        self.inner.store.access_token()
    }

    async fn run<T: DeserializeOwned>(
        &self,
        request: &ResolvedRequest,
        descriptor: &RequestDescriptor,
    ) -> Result<ResponseEnvelope<T>, Failure> {
        let token = self.authorize(descriptor);
        let response = self
            .inner
            .client
            .execute(request, token.as_ref())
            .await
            .map_err(Failure::from_error)?;

        if !response.is_unauthorized()
            || descriptor.is_ignore_auth()
            || self.inner.config.is_token_endpoint(&request.path)
        {
            return normalize(response);
        }

        debug!("Request unauthorized, recovering session");
        let credential = self
            .inner
            .refresh
            .recover(token.as_ref(), descriptor.is_silent_error())
            .await
            .map_err(Failure::session_expired)?;

        let response = self
            .inner
            .client
            .execute(request, Some(credential.access_token()))
            .await
            .map_err(Failure::from_error)?;

        if response.is_unauthorized() {
            info!("Refreshed credential rejected, ending session");
            self.inner.store.clear_if_current(credential.refresh_token());
        }

        normalize(response)
    }

    fn settle<T>(
        &self,
        outcome: Result<ResponseEnvelope<T>, Failure>,
        descriptor: &RequestDescriptor,
    ) -> Result<ResponseEnvelope<T>, Error> {
        let failure = match outcome {
            Ok(envelope) => return Ok(envelope),
            Err(failure) => failure,
        };

        warn!(status = failure.status, error = %failure.error, "Request failed");

        if !failure.notified && !descriptor.is_silent_error() {
            self.inner.sink.show_error(&failure.message);
        }

        if descriptor.is_throw_error() {
            return Err(failure.error);
        }

        Ok(ResponseEnvelope::failure(
            i64::from(failure.status),
            failure.message,
        ))
    }

    pub async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<ResponseEnvelope<T>, Error> {
        self.send(&RequestDescriptor::get(url)).await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<ResponseEnvelope<T>, Error> {
        self.send(&RequestDescriptor::delete(url)).await
    }

    pub async fn post<T, B>(&self, url: &str, body: &B) -> Result<ResponseEnvelope<T>, Error>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(&RequestDescriptor::post(url).json(body)?).await
    }

    pub async fn put<T, B>(&self, url: &str, body: &B) -> Result<ResponseEnvelope<T>, Error>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(&RequestDescriptor::put(url).json(body)?).await
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("base_url", &self.inner.config.base_url().as_str())
            .field("state", &self.session_state())
            .finish()
    }
}

/// Step four: turn a completed exchange into an envelope.
fn normalize<T: DeserializeOwned>(response: HttpResponse) -> Result<ResponseEnvelope<T>, Failure> {
    if !response.is_success() {
        return Err(Failure::from_error(response.protocol_error().into()));
    }

    let status = response.status;
    let decoded = if is_envelope(&response.body) {
        serde_json::from_value::<ResponseEnvelope<T>>(response.body)
    } else {
        serde_json::from_value::<T>(response.body).map(ResponseEnvelope::success)
    };

    decoded.map_err(|e| {
        Failure::from_error(
            TransportError::Decode {
                status,
                message: e.to_string(),
            }
            .into(),
        )
    })
}

/// Builder for [`Dispatcher`].
pub struct DispatcherBuilder {
    config: ClientConfig,
    store: Option<Arc<CredentialStore>>,
    sink: Option<Arc<dyn NotificationSink>>,
    exchange: Option<Arc<dyn TokenExchange>>,
}

impl DispatcherBuilder {
    /// Use a shared credential store instead of a fresh in-memory one.
    pub fn store(mut self, store: Arc<CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Replace the HTTP refresh exchange.
    pub fn exchange(mut self, exchange: Arc<dyn TokenExchange>) -> Self {
        self.exchange = Some(exchange);
        self
    }

    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn build(self) -> Result<Dispatcher, Error> {
        let client = HttpClient::new(&self.config)?;

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(CredentialStore::in_memory()));
        let sink = self
            .sink
            .unwrap_or_else(|| Arc::new(TracingSink) as Arc<dyn NotificationSink>);
        let exchange: Arc<dyn TokenExchange> = match self.exchange {
            Some(exchange) => exchange,
            None => Arc::new(HttpTokenExchange::new(
                client.clone(),
                self.config.refresh_path(),
            )),
        };

        let refresh = RefreshCoordinator::new(
            store.clone(),
            exchange,
            sink.clone(),
            self.config.refresh_timeout(),
        );

        Ok(Dispatcher {
            inner: Arc::new(Inner {
                config: self.config,
                client,
                store,
                sink,
                refresh,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use authfetch_core::BaseUrl;
    use serde_json::json;

    fn dispatcher() -> Dispatcher {
        let config = ClientConfig::new(BaseUrl::new("http://localhost:9").unwrap());
        Dispatcher::new(config).unwrap()
    }

    #[test]
    fn authorize_attaches_stored_token() {
        let dispatcher = dispatcher();
        let request = RequestDescriptor::get("/auth/me");
        assert!(dispatcher.authorize(&request).is_none());

        dispatcher
            .store()
            .set(Credential::new("access-1", "refresh-1", 60).unwrap());
        assert_eq!(
            dispatcher.authorize(&request).unwrap().as_str(),
            "access-1"
        );
        assert!(dispatcher.authorize(&request.ignore_auth(true)).is_none());
    }

    #[test]
    fn session_state_follows_store() {
        let dispatcher = dispatcher();
        assert_eq!(dispatcher.session_state(), AuthSessionState::Unauthenticated);

        dispatcher
            .store()
            .set(Credential::new("a", "r", 60).unwrap());
        assert_eq!(dispatcher.session_state(), AuthSessionState::Authenticated);
        assert_eq!(dispatcher.clone().session_state(), AuthSessionState::Authenticated);
    }

    #[test]
    fn normalize_wraps_plain_bodies() {
        let response = HttpResponse {
            status: 200,
            body: json!({"id": "7"}),
        };
        let envelope: ResponseEnvelope<serde_json::Value> = normalize(response).ok().unwrap();
        assert_eq!(envelope, ResponseEnvelope::success(json!({"id": "7"})));

        let response = HttpResponse {
            status: 204,
            body: serde_json::Value::Null,
        };
        let envelope: ResponseEnvelope<()> = normalize(response).ok().unwrap();
        assert!(envelope.is_success());
    }

    #[test]
    fn normalize_passes_envelopes_through() {
        let response = HttpResponse {
            status: 200,
            body: json!({"success": false, "errorCode": 1001, "errorMessage": "quota"}),
        };
        let envelope: ResponseEnvelope<serde_json::Value> = normalize(response).ok().unwrap();
        assert_eq!(envelope.failure_info(), Some((1001, "quota")));
    }

    #[test]
    fn normalize_reports_undecodable_body_as_500() {
        let response = HttpResponse {
            status: 200,
            body: json!("not a number"),
        };
        let failure = normalize::<u32>(response).err().unwrap();
        assert_eq!(failure.status, 500);
        assert!(matches!(
            failure.error,
            Error::Transport(TransportError::Decode { status: 200, .. })
        ));
    }

    #[test]
    fn normalize_reports_server_message() {
        let response = HttpResponse {
            status: 404,
            body: json!({"message": "user not found"}),
        };
        let failure = normalize::<serde_json::Value>(response).err().unwrap();
        assert_eq!(failure.status, 404);
        assert_eq!(failure.message, "user not found");
        assert!(!failure.notified);
    }
}
