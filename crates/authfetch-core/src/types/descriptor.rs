//! Request descriptors.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::{Error, InvalidInputError};

use super::method::Method;
use super::template::resolve_template;

/// Everything the dispatcher needs to send one logical request.
///
/// # Example
///
/// ```
/// use authfetch_core::{Method, RequestDescriptor};
///
/// let request = RequestDescriptor::get("/users/{id}/orders/{orderId}")
///     .path_var("id", 7)
///     .path_var("orderId", "42")
///     .query("expand", "items")
///     .silent_error(true);
///
/// assert_eq!(request.method(), Method::Get);
/// assert_eq!(request.resolve_path().unwrap(), "/users/7/orders/42");
/// ```
#[derive(Clone)]
pub struct RequestDescriptor {
    method: Method,
    url: String,
    path_vars: BTreeMap<String, String>,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: Option<serde_json::Value>,
    ignore_auth: bool,
    silent_error: bool,
    throw_error: bool,
}

impl RequestDescriptor {
    /// Create a descriptor for `method` and a URL template.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            path_vars: BTreeMap::new(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
            ignore_auth: false,
            silent_error: false,
            throw_error: false,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::Put, url)
    }

    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(Method::Patch, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::Delete, url)
    }

    /// Supply a value for a named path placeholder.
    pub fn path_var(mut self, name: impl Into<String>, value: impl fmt::Display) -> Self {
        self.path_vars.insert(name.into(), value.to_string());
        self
    }

    /// Append a query parameter.
    pub fn query(mut self, name: impl Into<String>, value: impl fmt::Display) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    /// Append an extra request header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set a JSON body.
    pub fn body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Set a JSON body from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be represented as JSON.
    pub fn json<B: Serialize + ?Sized>(self, body: &B) -> Result<Self, Error> {
        let value = serde_json::to_value(body).map_err(|e| InvalidInputError::Other {
            message: format!("request body is not valid JSON: {}", e),
        })?;
        Ok(self.body(value))
    }

    /// Skip credential injection for this request.
    pub fn ignore_auth(mut self, ignore: bool) -> Self {
        self.ignore_auth = ignore;
        self
    }

    /// Suppress notifications for this request's failures.
    pub fn silent_error(mut self, silent: bool) -> Self {
        self.silent_error = silent;
        self
    }

    /// Raise failures as errors instead of returning failure envelopes.
    pub fn throw_error(mut self, throw: bool) -> Self {
        self.throw_error = throw;
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// The unresolved URL template.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn path_vars(&self) -> &BTreeMap<String, String> {
        &self.path_vars
    }

    pub fn query_params(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body_value(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }

    pub fn is_ignore_auth(&self) -> bool {
        self.ignore_auth
    }

    pub fn is_silent_error(&self) -> bool {
        self.silent_error
    }

    pub fn is_throw_error(&self) -> bool {
        self.throw_error
    }

    /// Substitute path variables into the URL template.
    ///
    /// # Errors
    ///
    /// Returns an error if a placeholder has no value or the template is malformed.
    pub fn resolve_path(&self) -> Result<String, Error> {
        resolve_template(&self.url, &self.path_vars)
    }
}

// Bodies may carry passwords or OTP codes; keep them out of logs.
impl fmt::Debug for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestDescriptor")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("path_vars", &self.path_vars)
            .field("query", &self.query)
            .field("body", &self.body.as_ref().map(|_| "[REDACTED]"))
            .field("ignore_auth", &self.ignore_auth)
            .field("silent_error", &self.silent_error)
            .field("throw_error", &self.throw_error)
            .finish()
    }
}
