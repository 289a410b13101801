//! authfetch-http - Authenticated request dispatch over reqwest.
//!
//! The [`Dispatcher`] resolves request descriptors, attaches the stored
//! bearer token, and recovers from a 401 with one shared refresh exchange
//! and one retry. Every outcome is normalised into a
//! [`ResponseEnvelope`](authfetch_core::ResponseEnvelope).
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use authfetch_core::{CredentialStore, PasswordLogin, MemorySlotStorage};
//! use authfetch_http::{AuthApi, ClientConfig, Dispatcher};
//!
//! # async fn example() -> Result<(), authfetch_core::Error> {
//! let config = ClientConfig::from_env()?;
//! let store = Arc::new(CredentialStore::restore(Arc::new(MemorySlotStorage::new())));
//! let dispatcher = Dispatcher::builder(config).store(store).build()?;
//!
//! let auth = AuthApi::new(dispatcher.clone());
//! auth.login_with_password(&PasswordLogin::new("13800000000", "secret")).await?;
//!
//! let me = auth.current_user().await?;
//! println!("{:?}", me.data());
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod dispatcher;
pub mod exchange;
pub mod refresh;

pub use auth::AuthApi;
pub use client::{HttpClient, HttpResponse, ResolvedRequest};
pub use config::ClientConfig;
pub use dispatcher::{Dispatcher, DispatcherBuilder};
pub use exchange::HttpTokenExchange;
pub use refresh::{RefreshCoordinator, SESSION_EXPIRED_MESSAGE};
