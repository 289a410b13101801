//! The credential store.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info, instrument, warn};

use crate::error::AuthError;
use crate::memory::MemorySlotStorage;
use crate::traits::{SlotStorage, TokenExchange};
use crate::{AccessToken, Credential, RefreshToken};

/// Slot holding the access token.
pub const ACCESS_TOKEN_SLOT: &str = "auth_token";

/// Slot holding the refresh token.
pub const REFRESH_TOKEN_SLOT: &str = "refresh_token";

/// Sole owner of the current credential and its persisted copy.
///
/// The in-memory credential sits behind a single lock, so a reader sees
/// either the previous pair or the new pair, never one token from each.
/// The in-memory value is authoritative: persistence failures are logged
/// and do not undo a `set` or `clear`.
///
/// # Example
///
/// ```
/// use authfetch_core::{Credential, CredentialStore};
///
/// let store = CredentialStore::in_memory();
/// assert!(store.get().is_none());
///
/// store.set(Credential::new("access", "refresh", 3600).unwrap());
/// assert_eq!(store.access_token().unwrap().as_str(), "access");
///
/// store.clear();
/// assert!(!store.has_credential());
/// ```
pub struct CredentialStore {
    storage: Arc<dyn SlotStorage>,
    current: RwLock<Option<Credential>>,
}

impl CredentialStore {
    /// Create a store, restoring any credential persisted in `storage`.
    ///
    /// A half-persisted pair (one slot present, the other missing) is treated
    /// as no credential and both slots are erased.
    #[instrument(skip(storage))]
    pub fn restore(storage: Arc<dyn SlotStorage>) -> Self {
        let current = Self::load(storage.as_ref());
        debug!(restored = current.is_some(), "Credential store initialised");

        Self {
            storage,
            current: RwLock::new(current),
        }
    }

    /// A store backed by process memory only.
    pub fn in_memory() -> Self {
        Self::restore(Arc::new(MemorySlotStorage::new()))
    }

    fn load(storage: &dyn SlotStorage) -> Option<Credential> {
        let read = |key: &str| match storage.read(key) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                warn!(error = %e, slot = key, "Failed to read credential slot");
                None
            }
        };

        match (read(ACCESS_TOKEN_SLOT), read(REFRESH_TOKEN_SLOT)) {
            (Some(access), Some(refresh)) => Credential::new(access, refresh, 0).ok(),
            (None, None) => None,
            _ => {
                warn!("Discarding half-persisted credential");
                if let Err(e) = storage.remove_many(&[ACCESS_TOKEN_SLOT, REFRESH_TOKEN_SLOT]) {
                    warn!(error = %e, "Failed to erase credential slots");
                }
                None
            }
        }
    }

    /// Returns the current credential, if any.
    pub fn get(&self) -> Option<Credential> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the current access token, if any.
    pub fn access_token(&self) -> Option<AccessToken> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|c| c.access_token().clone())
    }

    /// Returns the current refresh token, if any.
    pub fn refresh_token(&self) -> Option<RefreshToken> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|c| c.refresh_token().clone())
    }

    pub fn has_credential(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Replace the credential and persist both tokens.
    pub fn set(&self, credential: Credential) {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        self.install(&mut current, credential);
    }

    /// Drop the credential and erase its persisted slots.
    pub fn clear(&self) {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        self.erase(&mut current);
    }

    /// Clear the store only if it still holds `refresh_token`.
    ///
    /// Returns false, leaving the store untouched, when the credential was
    /// replaced or cleared since that token was read.
    pub fn clear_if_current(&self, refresh_token: &RefreshToken) -> bool {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if !holds(current.as_ref(), refresh_token) {
            debug!("Credential replaced, not clearing");
            return false;
        }
        self.erase(&mut current);
        true
    }

    // Both helpers run under the write lock so storage order matches memory order.

    fn install(&self, current: &mut Option<Credential>, credential: Credential) {
        if let Err(e) = self.storage.write_many(&[
            (ACCESS_TOKEN_SLOT, credential.access_token().as_str()),
            (REFRESH_TOKEN_SLOT, credential.refresh_token().as_str()),
        ]) {
            warn!(error = %e, "Failed to persist credential");
        }

        *current = Some(credential);
        debug!("Credential replaced");
    }

    fn erase(&self, current: &mut Option<Credential>) {
        if let Err(e) = self
            .storage
            .remove_many(&[ACCESS_TOKEN_SLOT, REFRESH_TOKEN_SLOT])
        {
            warn!(error = %e, "Failed to erase persisted credential");
        }

        if current.take().is_some() {
            info!("Credential cleared");
        }
    }

    /// Exchange the held refresh token for a new credential and install it.
    ///
    /// Any failure clears the store before the error is returned, so a failed
    /// refresh never leaves a stale credential behind.
    ///
    /// The outcome only applies to the credential the exchange started from.
    /// If a login, logout or another refresh replaced it meanwhile, the store
    /// is left as is: a success returns the credential now held, a failure
    /// returns its error without clearing.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingRefreshToken`] if no credential is held,
    /// or the exchange's own error.
    #[instrument(skip_all)]
    pub async fn refresh(&self, exchange: &dyn TokenExchange) -> Result<Credential, AuthError> {
        let Some(refresh_token) = self.refresh_token() else {
            self.clear();
            return Err(AuthError::MissingRefreshToken);
        };

        let outcome = exchange.exchange(&refresh_token).await;

        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if !holds(current.as_ref(), &refresh_token) {
            debug!(succeeded = outcome.is_ok(), "Credential replaced during refresh");
            return match outcome {
                Ok(_) => current.clone().ok_or(AuthError::MissingRefreshToken),
                Err(e) => Err(e),
            };
        }

        match outcome {
            Ok(credential) => {
                self.install(&mut current, credential.clone());
                info!("Credential refreshed");
                Ok(credential)
            }
            Err(e) => {
                warn!(error = %e, "Refresh exchange failed");
                self.erase(&mut current);
                Err(e)
            }
        }
    }
}

fn holds(current: Option<&Credential>, refresh_token: &RefreshToken) -> bool {
    current.is_some_and(|c| c.refresh_token() == refresh_token)
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("has_credential", &self.has_credential())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;

    struct FixedExchange(Result<Credential, AuthError>);

    /// Answers after a delay, leaving room for the store to change meanwhile.
    struct DelayedExchange(Result<Credential, AuthError>);

    #[async_trait]
    impl TokenExchange for DelayedExchange {
        async fn exchange(&self, _refresh_token: &RefreshToken) -> Result<Credential, AuthError> {
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.0.clone()
        }
    }

    #[async_trait]
    impl TokenExchange for FixedExchange {
        async fn exchange(&self, _refresh_token: &RefreshToken) -> Result<Credential, AuthError> {
            self.0.clone()
        }
    }

    fn credential(access: &str, refresh: &str) -> Credential {
        Credential::new(access, refresh, 3600).unwrap()
    }

    #[test]
    fn set_persists_both_slots() {
        let storage = Arc::new(MemorySlotStorage::new());
        let store = CredentialStore::restore(storage.clone());

        store.set(credential("a1", "r1"));

        assert_eq!(storage.read(ACCESS_TOKEN_SLOT).unwrap().as_deref(), Some("a1"));
        assert_eq!(storage.read(REFRESH_TOKEN_SLOT).unwrap().as_deref(), Some("r1"));
    }

    #[test]
    fn restores_persisted_pair() {
        let storage = Arc::new(MemorySlotStorage::new());
        storage.write(ACCESS_TOKEN_SLOT, "a1").unwrap();
        storage.write(REFRESH_TOKEN_SLOT, "r1").unwrap();

        let store = CredentialStore::restore(storage);
        let restored = store.get().unwrap();

        assert_eq!(restored.access_token().as_str(), "a1");
        assert_eq!(restored.refresh_token().as_str(), "r1");
        assert_eq!(restored.expires_in(), 0);
    }

    #[test]
    fn half_persisted_pair_is_discarded() {
        let storage = Arc::new(MemorySlotStorage::new());
        storage.write(ACCESS_TOKEN_SLOT, "a1").unwrap();

        let store = CredentialStore::restore(storage.clone());

        assert!(store.get().is_none());
        assert!(storage.read(ACCESS_TOKEN_SLOT).unwrap().is_none());
    }

    #[test]
    fn clear_erases_slots() {
        let storage = Arc::new(MemorySlotStorage::new());
        let store = CredentialStore::restore(storage.clone());
        store.set(credential("a1", "r1"));

        store.clear();

        assert!(store.get().is_none());
        assert!(storage.read(ACCESS_TOKEN_SLOT).unwrap().is_none());
        assert!(storage.read(REFRESH_TOKEN_SLOT).unwrap().is_none());
    }

    #[tokio::test]
    async fn refresh_installs_new_credential() {
        let store = CredentialStore::in_memory();
        store.set(credential("old-access", "old-refresh"));

        let exchange = FixedExchange(Ok(credential("new-access", "new-refresh")));
        store.refresh(&exchange).await.unwrap();

        let current = store.get().unwrap();
        assert_eq!(current.access_token().as_str(), "new-access");
        assert_eq!(current.refresh_token().as_str(), "new-refresh");
    }

    #[tokio::test]
    async fn failed_refresh_clears_store() {
        let store = CredentialStore::in_memory();
        store.set(credential("old-access", "old-refresh"));

        let exchange = FixedExchange(Err(AuthError::RefreshRejected {
            status: Some(401),
            message: "refresh token revoked".into(),
        }));
        let err = store.refresh(&exchange).await.unwrap_err();

        assert!(matches!(err, AuthError::RefreshRejected { .. }));
        assert!(store.get().is_none());
    }

    #[tokio::test]
    async fn refresh_without_credential_fails() {
        let store = CredentialStore::in_memory();
        let exchange = FixedExchange(Ok(credential("a", "r")));

        let err = store.refresh(&exchange).await.unwrap_err();

        assert_eq!(err, AuthError::MissingRefreshToken);
        assert!(store.get().is_none());
    }

    async fn login_midway(store: &CredentialStore) {
        tokio::time::sleep(Duration::from_millis(10)).await;
        store.set(credential("login-access", "login-refresh"));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_refresh_keeps_login_made_meanwhile() {
        let store = CredentialStore::in_memory();
        store.set(credential("old-access", "old-refresh"));
        let exchange = DelayedExchange(Err(AuthError::RefreshRejected {
            status: Some(401),
            message: "refresh token revoked".into(),
        }));

        let (outcome, ()) = tokio::join!(store.refresh(&exchange), login_midway(&store));

        assert!(matches!(outcome, Err(AuthError::RefreshRejected { .. })));
        assert_eq!(store.access_token().unwrap().as_str(), "login-access");
    }

    #[tokio::test(start_paused = true)]
    async fn successful_refresh_keeps_login_made_meanwhile() {
        let storage = Arc::new(MemorySlotStorage::new());
        let store = CredentialStore::restore(storage.clone());
        store.set(credential("old-access", "old-refresh"));
        let exchange = DelayedExchange(Ok(credential("refreshed-access", "refreshed-refresh")));

        let (outcome, ()) = tokio::join!(store.refresh(&exchange), login_midway(&store));

        assert_eq!(outcome.unwrap().access_token().as_str(), "login-access");
        assert_eq!(store.refresh_token().unwrap().as_str(), "login-refresh");
        assert_eq!(
            storage.read(REFRESH_TOKEN_SLOT).unwrap().as_deref(),
            Some("login-refresh")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_after_logout_does_not_restore_session() {
        let store = CredentialStore::in_memory();
        store.set(credential("old-access", "old-refresh"));
        let exchange = DelayedExchange(Ok(credential("refreshed-access", "refreshed-refresh")));

        let logout = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            store.clear();
        };
        let (outcome, ()) = tokio::join!(store.refresh(&exchange), logout);

        assert_eq!(outcome.unwrap_err(), AuthError::MissingRefreshToken);
        assert!(store.get().is_none());
    }

    #[test]
    fn clear_if_current_skips_replaced_credential() {
        let store = CredentialStore::in_memory();
        store.set(credential("a1", "r1"));
        store.set(credential("a2", "r2"));

        assert!(!store.clear_if_current(&RefreshToken::new("r1")));
        assert_eq!(store.access_token().unwrap().as_str(), "a2");

        assert!(store.clear_if_current(&RefreshToken::new("r2")));
        assert!(store.get().is_none());
    }
}
