//! Error types for authfetch.
//!
//! This module provides a unified error type with explicit variants for
//! transport, authentication, protocol, storage and caller input errors.

use std::fmt;
use thiserror::Error;

/// Message used when neither the server nor the transport supplied one.
pub const GENERIC_FAILURE_MESSAGE: &str = "request failed";

/// Status reported in failure envelopes when no HTTP status is available.
pub const FALLBACK_STATUS: u16 = 500;

/// The unified error type for authfetch operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Network transport errors (connection, timeout, undecodable body).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Authentication errors (missing refresh token, rejected or timed out refresh).
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Non-success HTTP responses.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Caller construction errors. These are raised before any network activity.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    /// Credential persistence errors.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl Error {
    /// HTTP status associated with this error, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Protocol(err) => Some(err.status),
            Error::Auth(AuthError::RefreshRejected { status, .. }) => *status,
            _ => None,
        }
    }

    /// Human readable message for notifications and failure envelopes.
    ///
    /// Prefers the server supplied message, then the error's own description.
    pub fn user_message(&self) -> String {
        match self {
            Error::Protocol(err) => err.user_message(),
            Error::Transport(err) => err.to_string(),
            Error::Auth(err) => err.to_string(),
            Error::InvalidInput(err) => err.to_string(),
            Error::Storage(err) => err.to_string(),
        }
    }

    /// Returns true if the session is gone and the user must log in again.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Error::Auth(_))
    }
}

/// Transport-level errors.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Generic HTTP client error.
    #[error("HTTP error: {message}")]
    Http { message: String },

    /// Response body could not be decoded into the expected type.
    ///
    /// Carries the HTTP status for diagnostics only; failure envelopes report
    /// decode errors with the fallback status.
    #[error("failed to decode HTTP {status} response body: {message}")]
    Decode { status: u16, message: String },
}

/// Authentication-related errors.
///
/// `Clone` so that one refresh outcome can be handed to every caller waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No refresh token is held, so the session cannot be renewed.
    #[error("no refresh token available")]
    MissingRefreshToken,

    /// The auth server rejected the refresh exchange.
    #[error("refresh rejected: {message}")]
    RefreshRejected {
        status: Option<u16>,
        message: String,
    },

    /// The refresh exchange did not complete within its bound.
    #[error("refresh timed out after {timeout_ms}ms")]
    RefreshTimedOut { timeout_ms: u64 },
}

/// A non-success HTTP response.
#[derive(Debug, Clone)]
pub struct ProtocolError {
    /// HTTP status code.
    pub status: u16,
    /// Server error code, if the body carried one.
    pub error: Option<String>,
    /// Error message from the server.
    pub message: Option<String>,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(ref error) = self.error {
            write!(f, " [{}]", error)?;
        }
        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ProtocolError {}

impl ProtocolError {
    /// Create a new protocol error.
    pub fn new(status: u16, error: Option<String>, message: Option<String>) -> Self {
        Self {
            status,
            error,
            message,
        }
    }

    /// Check if this is an authorization failure.
    pub fn is_auth_error(&self) -> bool {
        self.status == 401
    }

    /// The server message, falling back to the status line the transport reports.
    pub fn user_message(&self) -> String {
        match self.message.as_deref() {
            Some(message) if !message.is_empty() => message.to_string(),
            _ => format!("request failed with status code {}", self.status),
        }
    }
}

/// Caller construction errors.
#[derive(Debug, Clone, Error)]
pub enum InvalidInputError {
    /// A URL template placeholder had no matching path variable.
    #[error("unresolved path placeholder '{name}' in '{template}'")]
    UnresolvedPlaceholder { template: String, name: String },

    /// A URL template is malformed (for example an unclosed brace).
    #[error("malformed URL template '{template}': {reason}")]
    Template { template: String, reason: String },

    /// Invalid base URL.
    #[error("invalid base URL '{value}': {reason}")]
    BaseUrl { value: String, reason: String },

    /// Credential with a missing half.
    #[error("invalid credential: {reason}")]
    Credential { reason: String },

    /// Header name or value that cannot be sent.
    #[error("invalid header '{name}': {reason}")]
    Header { name: String, reason: String },

    /// Invalid configuration value.
    #[error("invalid configuration {key}: {reason}")]
    Config { key: String, reason: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}

/// Credential persistence errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem failure.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Stored data could not be parsed.
    #[error("corrupt slot store {path}: {reason}")]
    Corrupt { path: String, reason: String },
}
