//! HTTP transport.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, instrument, trace};

use authfetch_core::error::{Error, InvalidInputError, ProtocolError, TransportError};
use authfetch_core::types::{BaseUrl, Method, RequestDescriptor};
use authfetch_core::AccessToken;

use crate::config::ClientConfig;

/// A descriptor with its URL template resolved and its headers validated.
///
/// Building one is step one of every dispatch; it fails before any network
/// activity if the descriptor is incomplete.
#[derive(Debug, Clone)]
pub struct ResolvedRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: Option<serde_json::Value>,
}

impl ResolvedRequest {
    /// Resolve a descriptor.
    ///
    /// # Errors
    ///
    /// Returns an error for unresolved placeholders or unsendable headers.
    pub fn from_descriptor(descriptor: &RequestDescriptor) -> Result<Self, Error> {
        let path = descriptor.resolve_path()?;

        let mut headers = HeaderMap::new();
        for (name, value) in descriptor.headers() {
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| InvalidInputError::Header {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
            let header_value = HeaderValue::from_str(value).map_err(|e| InvalidInputError::Header {
                name: name.clone(),
                reason: e.to_string(),
            })?;
            headers.append(header_name, header_value);
        }

        Ok(Self {
            method: descriptor.method(),
            path,
            query: descriptor.query_params().to_vec(),
            headers,
            body: descriptor.body_value().cloned(),
        })
    }

    /// A bare POST with a JSON body, used for the refresh exchange.
    pub fn post_json(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: Some(body),
        }
    }
}

/// Status and decoded body of a completed exchange.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    /// JSON body; `null` when empty, a JSON string when the body was not JSON.
    pub body: serde_json::Value,
}

impl HttpResponse {
    /// 2xx and 3xx count as transport-level success.
    pub fn is_success(&self) -> bool {
        (200..400).contains(&self.status)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    /// Describe a failed response, reading `message`/`errorMessage` and
    /// `error`/`errorCode` from a JSON body.
    pub fn protocol_error(&self) -> ProtocolError {
        let text = |key: &str| match self.body.get(key) {
            Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };

        ProtocolError::new(
            self.status,
            text("error").or_else(|| text("errorCode")),
            text("message").or_else(|| text("errorMessage")),
        )
    }
}

/// Thin wrapper over `reqwest` bound to a base URL.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    base_url: BaseUrl,
    timeout: Duration,
}

impl HttpClient {
    /// Create a client for the configured base URL and timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new(config: &ClientConfig) -> Result<Self, Error> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .user_agent(concat!("authfetch/", env!("CARGO_PKG_VERSION")))
            .default_headers(default_headers)
            .timeout(config.timeout())
            .build()
            .map_err(|e| TransportError::Http {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url().clone(),
            timeout: config.timeout(),
        })
    }

    /// Returns the base URL this client is configured for.
    pub fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    /// Send one request, attaching `token` as a bearer credential if given.
    ///
    /// Any HTTP status is returned as `Ok`; only transport failures are errors.
    #[instrument(skip(self, request, token), fields(method = %request.method, path = %request.path))]
    pub async fn execute(
        &self,
        request: &ResolvedRequest,
        token: Option<&AccessToken>,
    ) -> Result<HttpResponse, Error> {
        let url = self.base_url.join(&request.path);
        debug!(authorized = token.is_some(), "HTTP request");
        trace!(query = ?request.query, "query parameters");

        let mut builder = self
            .client
            .request(reqwest_method(request.method), &url)
            .headers(request.headers.clone());

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, bearer_header(token)?);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        trace!(status = %status, "HTTP response");

        let bytes = response.bytes().await.map_err(|e| self.transport_error(e))?;

        Ok(HttpResponse {
            status: status.as_u16(),
            body: parse_body(&bytes),
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> Error {
        let transport = if err.is_timeout() {
            TransportError::Timeout {
                duration_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }
        } else if err.is_connect() {
            TransportError::Connection {
                message: err.to_string(),
            }
        } else {
            TransportError::Http {
                message: err.to_string(),
            }
        };
        Error::Transport(transport)
    }
}

fn reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
        Method::Head => reqwest::Method::HEAD,
    }
}

fn bearer_header(token: &AccessToken) -> Result<HeaderValue, Error> {
    let mut value = HeaderValue::from_str(&token.bearer()).map_err(|_| InvalidInputError::Header {
        name: AUTHORIZATION.as_str().to_string(),
        reason: "access token contains characters not allowed in a header".to_string(),
    })?;
    value.set_sensitive(true);
    Ok(value)
}

fn parse_body(bytes: &[u8]) -> serde_json::Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return serde_json::Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| serde_json::Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolves_descriptor() {
        let descriptor = RequestDescriptor::get("/users/{id}")
            .path_var("id", 7)
            .query("page", 2)
            .header("x-trace", "abc");

        let request = ResolvedRequest::from_descriptor(&descriptor).unwrap();
        assert_eq!(request.path, "/users/7");
        assert_eq!(request.query, vec![("page".to_string(), "2".to_string())]);
        assert_eq!(request.headers.get("x-trace").unwrap(), "abc");
    }

    #[test]
    fn rejects_bad_header() {
        let descriptor = RequestDescriptor::get("/ping").header("bad header", "x");
        assert!(matches!(
            ResolvedRequest::from_descriptor(&descriptor),
            Err(Error::InvalidInput(InvalidInputError::Header { .. }))
        ));
    }

    #[test]
    fn parses_bodies() {
        assert_eq!(parse_body(b""), serde_json::Value::Null);
        assert_eq!(parse_body(b"  \n"), serde_json::Value::Null);
        assert_eq!(parse_body(br#"{"a":1}"#), json!({"a": 1}));
        assert_eq!(parse_body(b"Bad Gateway"), json!("Bad Gateway"));
    }

    #[test]
    fn protocol_error_reads_message_fields() {
        let response = HttpResponse {
            status: 404,
            body: json!({"message": "user not found", "errorCode": 40401}),
        };
        let err = response.protocol_error();
        assert_eq!(err.status, 404);
        assert_eq!(err.message.as_deref(), Some("user not found"));
        assert_eq!(err.error.as_deref(), Some("40401"));

        let response = HttpResponse {
            status: 500,
            body: json!({"success": false, "errorMessage": "boom"}),
        };
        assert_eq!(response.protocol_error().user_message(), "boom");

        let response = HttpResponse {
            status: 503,
            body: json!("Service Unavailable"),
        };
        assert_eq!(
            response.protocol_error().user_message(),
            "request failed with status code 503"
        );
    }

    #[test]
    fn success_range() {
        let ok = |status| HttpResponse {
            status,
            body: serde_json::Value::Null,
        };
        assert!(ok(200).is_success());
        assert!(ok(304).is_success());
        assert!(!ok(401).is_success());
        assert!(ok(401).is_unauthorized());
    }
}
