//! authfetch-core - Core types and traits for authenticated HTTP dispatch.
//!
//! This crate holds everything that does not touch the network: the
//! credential and its store, request descriptors, the response envelope,
//! the error taxonomy, and the traits the HTTP layer plugs into.

pub mod auth;
pub mod credential;
pub mod error;
pub mod memory;
pub mod sink;
pub mod store;
pub mod tokens;
pub mod traits;
pub mod types;

pub use auth::{PasswordLogin, RefreshTokenForm, SmsOtpLogin, UserInfo};
pub use credential::Credential;
pub use error::Error;
pub use memory::MemorySlotStorage;
pub use sink::TracingSink;
pub use store::{ACCESS_TOKEN_SLOT, CredentialStore, REFRESH_TOKEN_SLOT};
pub use tokens::{AccessToken, RefreshToken};
pub use traits::{NotificationSink, SlotStorage, TokenExchange};
pub use types::{AuthSessionState, BaseUrl, ErrorCode, Method, RequestDescriptor, ResponseEnvelope};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
