//! Single-flight credential refresh.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tracing::{debug, info, instrument, warn};

use authfetch_core::error::AuthError;
use authfetch_core::{AccessToken, Credential, CredentialStore, NotificationSink, TokenExchange};

/// Notification emitted when the session cannot be renewed.
pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired, please log in again";

type RefreshOutcome = Result<Credential, AuthError>;

type InFlight = Shared<BoxFuture<'static, RefreshOutcome>>;

/// The pending exchange, tagged so that only its own completion clears the slot.
struct Pending {
    generation: u64,
    future: InFlight,
}

/// Collapses concurrent refresh triggers into one exchange.
///
/// The first caller to find no refresh pending starts one and parks it in a
/// slot as a shared future; every caller arriving before it completes awaits
/// the same future and sees the same outcome. The future empties the slot
/// when it finishes, so a later, unrelated failure starts a fresh exchange.
///
/// The exchange runs under `timeout`; on expiry every waiter fails with
/// [`AuthError::RefreshTimedOut`] and the credential store is cleared, unless
/// it was given a new credential while the exchange ran.
pub struct RefreshCoordinator {
    store: Arc<CredentialStore>,
    exchange: Arc<dyn TokenExchange>,
    sink: Arc<dyn NotificationSink>,
    timeout: Duration,
    pending: Arc<Mutex<Option<Pending>>>,
    generation: AtomicU64,
}

impl RefreshCoordinator {
    pub fn new(
        store: Arc<CredentialStore>,
        exchange: Arc<dyn TokenExchange>,
        sink: Arc<dyn NotificationSink>,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            exchange,
            sink,
            timeout,
            pending: Arc::new(Mutex::new(None)),
            generation: AtomicU64::new(0),
        }
    }

    /// Returns true while an exchange is in flight.
    pub fn is_refreshing(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Number of exchanges started since construction.
    pub fn exchanges_started(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Recover from a 401 received for a request sent with `rejected`.
    ///
    /// If the store already holds a different access token, another request
    /// refreshed in the meantime and that credential is returned without a
    /// new exchange. Otherwise this joins or starts the shared refresh.
    ///
    /// Unless `silent`, a failure is reported to the notification sink, once
    /// per caller.
    #[instrument(skip_all, fields(silent = silent))]
    pub async fn recover(&self, rejected: Option<&AccessToken>, silent: bool) -> RefreshOutcome {
        if let Some(current) = self.store.get()
            && Some(current.access_token()) != rejected
        {
            debug!("Credential already replaced, skipping refresh");
            return Ok(current);
        }

        self.refresh(silent).await
    }

    /// Join the in-flight refresh, or start one.
    pub async fn refresh(&self, silent: bool) -> RefreshOutcome {
        let outcome = self.join_or_start().await;

        if let Err(ref e) = outcome {
            warn!(error = %e, "Session could not be refreshed");
            if !silent {
                self.sink.show_error(SESSION_EXPIRED_MESSAGE);
            }
        }

        outcome
    }

    fn join_or_start(&self) -> InFlight {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(ref in_flight) = *pending {
            debug!(generation = in_flight.generation, "Joining in-flight refresh");
            return in_flight.future.clone();
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        info!(generation, "Starting refresh exchange");

        let future = self.exchange_future(generation).boxed().shared();
        *pending = Some(Pending {
            generation,
            future: future.clone(),
        });
        future
    }

    fn exchange_future(&self, generation: u64) -> impl Future<Output = RefreshOutcome> + Send + 'static {
        let store = self.store.clone();
        let exchange = self.exchange.clone();
        let pending = self.pending.clone();
        let timeout = self.timeout;

        async move {
            let started_from = store.refresh_token();
            let outcome = match tokio::time::timeout(timeout, store.refresh(exchange.as_ref())).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    if let Some(ref token) = started_from {
                        store.clear_if_current(token);
                    }
                    Err(AuthError::RefreshTimedOut {
                        timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                    })
                }
            };

            let mut slot = pending.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.as_ref().is_some_and(|p| p.generation == generation) {
                *slot = None;
            }

            outcome
        }
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("timeout", &self.timeout)
            .field("refreshing", &self.is_refreshing())
            .field("exchanges_started", &self.exchanges_started())
            .finish()
    }
}
