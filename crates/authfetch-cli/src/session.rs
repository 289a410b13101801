//! Credential store location and dispatcher wiring.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use directories::ProjectDirs;

use authfetch_core::CredentialStore;
use authfetch_file::FileSlotStorage;
use authfetch_http::config::ENV_BASE_URL;
use authfetch_http::{AuthApi, ClientConfig, Dispatcher};

use crate::sink::ConsoleSink;

/// Shared state for one CLI invocation.
pub struct Context {
    base_url: Option<String>,
    store: Arc<CredentialStore>,
}

impl Context {
    pub fn new(base_url: Option<String>, store_path: Option<PathBuf>) -> Result<Self> {
        let path = match store_path {
            Some(path) => path,
            None => default_store_path()?,
        };
        tracing::debug!(path = %path.display(), "Opening credential store");

        let store = CredentialStore::restore(Arc::new(FileSlotStorage::new(path)));

        Ok(Self {
            base_url,
            store: Arc::new(store),
        })
    }

    pub fn store(&self) -> &Arc<CredentialStore> {
        &self.store
    }

    /// Build a dispatcher over the persisted store.
    pub fn dispatcher(&self) -> Result<Dispatcher> {
        let config = self.config()?;
        Dispatcher::builder(config)
            .store(self.store.clone())
            .sink(Arc::new(ConsoleSink))
            .build()
            .context("Failed to build HTTP client")
    }

    pub fn auth(&self) -> Result<AuthApi> {
        Ok(AuthApi::new(self.dispatcher()?))
    }

    fn config(&self) -> Result<ClientConfig> {
        let base_url = self.base_url.clone();
        ClientConfig::from_lookup(|key| {
            if key == ENV_BASE_URL && base_url.is_some() {
                return base_url.clone();
            }
            std::env::var(key).ok()
        })
        .context("Invalid configuration (set --base-url or AUTHFETCH_BASE_URL)")
    }
}

/// `<data dir>/credentials.json` for the current platform.
fn default_store_path() -> Result<PathBuf> {
    let dirs =
        ProjectDirs::from("", "", "authfetch").context("Could not determine data directory")?;
    Ok(dirs.data_dir().join("credentials.json"))
}
