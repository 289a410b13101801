//! The uniform response envelope.

use std::fmt;

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{FALLBACK_STATUS, GENERIC_FAILURE_MESSAGE};

/// Error code carried by a success envelope. Servers use both strings and numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorCode {
    Number(i64),
    Text(String),
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Number(n) => write!(f, "{}", n),
            ErrorCode::Text(s) => f.write_str(s),
        }
    }
}

/// Result of every dispatched request.
///
/// On the wire this is `{success: true, data, errorCode?, errorMessage?}` or
/// `{success: false, errorCode, errorMessage, data?}`. Match on the variant
/// before touching `data`; the failure variant's `data` is best effort only.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseEnvelope<T> {
    Success {
        data: T,
        error_code: Option<ErrorCode>,
        error_message: Option<String>,
    },
    Failure {
        error_code: i64,
        error_message: String,
        data: Option<T>,
    },
}

impl<T> ResponseEnvelope<T> {
    /// A success envelope with no embedded code or message.
    pub fn success(data: T) -> Self {
        ResponseEnvelope::Success {
            data,
            error_code: None,
            error_message: None,
        }
    }

    /// A failure envelope without data.
    pub fn failure(error_code: i64, error_message: impl Into<String>) -> Self {
        ResponseEnvelope::Failure {
            error_code,
            error_message: error_message.into(),
            data: None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ResponseEnvelope::Success { .. })
    }

    /// Payload of a success envelope.
    pub fn data(&self) -> Option<&T> {
        match self {
            ResponseEnvelope::Success { data, .. } => Some(data),
            ResponseEnvelope::Failure { .. } => None,
        }
    }

    /// Consume a success envelope into its payload.
    pub fn into_data(self) -> Option<T> {
        match self {
            ResponseEnvelope::Success { data, .. } => Some(data),
            ResponseEnvelope::Failure { .. } => None,
        }
    }

    /// The `(errorCode, errorMessage)` pair of a failure envelope.
    pub fn failure_info(&self) -> Option<(i64, &str)> {
        match self {
            ResponseEnvelope::Failure {
                error_code,
                error_message,
                ..
            } => Some((*error_code, error_message.as_str())),
            ResponseEnvelope::Success { .. } => None,
        }
    }

    /// The message carried by either variant, if any.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            ResponseEnvelope::Success { error_message, .. } => error_message.as_deref(),
            ResponseEnvelope::Failure { error_message, .. } => Some(error_message),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ResponseEnvelope<U> {
        match self {
            ResponseEnvelope::Success {
                data,
                error_code,
                error_message,
            } => ResponseEnvelope::Success {
                data: f(data),
                error_code,
                error_message,
            },
            ResponseEnvelope::Failure {
                error_code,
                error_message,
                data,
            } => ResponseEnvelope::Failure {
                error_code,
                error_message,
                data: data.map(f),
            },
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireEnvelopeOut<'a, T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_code: Option<ErrorCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<&'a str>,
}

impl<T: Serialize> Serialize for ResponseEnvelope<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let wire = match self {
            ResponseEnvelope::Success {
                data,
                error_code,
                error_message,
            } => WireEnvelopeOut {
                success: true,
                data: Some(data),
                error_code: error_code.clone(),
                error_message: error_message.as_deref(),
            },
            ResponseEnvelope::Failure {
                error_code,
                error_message,
                data,
            } => WireEnvelopeOut {
                success: false,
                data: data.as_ref(),
                error_code: Some(ErrorCode::Number(*error_code)),
                error_message: Some(error_message),
            },
        };
        wire.serialize(serializer)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireEnvelopeIn {
    success: bool,
    #[serde(default)]
    data: serde_json::Value,
    #[serde(default)]
    error_code: Option<ErrorCode>,
    #[serde(default)]
    error_message: Option<String>,
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for ResponseEnvelope<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = WireEnvelopeIn::deserialize(deserializer)?;

        if wire.success {
            let data = T::deserialize(wire.data).map_err(D::Error::custom)?;
            return Ok(ResponseEnvelope::Success {
                data,
                error_code: wire.error_code,
                error_message: wire.error_message,
            });
        }

        let error_code = match wire.error_code {
            Some(ErrorCode::Number(code)) => code,
            Some(ErrorCode::Text(text)) => text.parse().unwrap_or(i64::from(FALLBACK_STATUS)),
            None => i64::from(FALLBACK_STATUS),
        };
        let data = if wire.data.is_null() {
            None
        } else {
            T::deserialize(wire.data).ok()
        };

        Ok(ResponseEnvelope::Failure {
            error_code,
            error_message: wire
                .error_message
                .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string()),
            data,
        })
    }
}

/// Returns true if a JSON body follows the envelope convention.
pub fn is_envelope(body: &serde_json::Value) -> bool {
    body.get("success").is_some_and(serde_json::Value::is_boolean)
}
