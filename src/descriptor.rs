//! Endpoint descriptors: the declarative unit of work handed to the loader.
//!
//! A descriptor names where a response lands ([`EndpointDescriptor::state_key`]),
//! where it comes from (`path`, `method`, `query`), and what to send (`body`).
//! Descriptors are validated when built and immutable for the life of a
//! batch; a batch is simply a `Vec<EndpointDescriptor>` with distinct state
//! keys.
//!
//! # Examples
//!
//! ```rust
//! use tributary::descriptor::{EndpointDescriptor, HttpMethod};
//! use serde_json::json;
//!
//! let issues = EndpointDescriptor::get("issues", "/api/0/issues/")
//!     .unwrap()
//!     .with_query("statsPeriod", "14d");
//!
//! let search = EndpointDescriptor::new("results", "/api/0/search/", HttpMethod::Post)
//!     .unwrap()
//!     .with_body(json!({"query": "is:unresolved"}));
//!
//! assert_eq!(issues.state_key(), "issues");
//! assert_eq!(search.method(), HttpMethod::Post);
//! ```

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// HTTP method for a read-style request.
///
/// GET is the default; POST covers search-like endpoints that take a JSON
/// body but are still semantically reads from the loader's point of view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while constructing a descriptor.
#[derive(Debug, Error, Diagnostic)]
pub enum DescriptorError {
    /// The state key was empty or whitespace-only.
    #[error("state key must be non-empty")]
    #[diagnostic(
        code(tributary::descriptor::empty_state_key),
        help("Each descriptor needs a distinct key naming its slot in loader state.")
    )]
    EmptyStateKey,

    /// The request path was empty.
    #[error("request path must be non-empty for state key {state_key:?}")]
    #[diagnostic(code(tributary::descriptor::empty_path))]
    EmptyPath { state_key: String },
}

/// A declarative `(state_key, path, options)` tuple describing one request.
///
/// Constructed once per batch configuration and immutable afterwards. The
/// owning caller must use distinct state keys within one batch; the loader
/// enforces this when the batch starts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EndpointDescriptor {
    state_key: String,
    path: String,
    #[serde(default)]
    method: HttpMethod,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    query: Vec<(String, String)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    body: Option<Value>,
}

impl EndpointDescriptor {
    /// Build a descriptor with an explicit method.
    pub fn new(
        state_key: impl Into<String>,
        path: impl Into<String>,
        method: HttpMethod,
    ) -> Result<Self, DescriptorError> {
        let state_key = state_key.into();
        if state_key.trim().is_empty() {
            return Err(DescriptorError::EmptyStateKey);
        }
        let path = path.into();
        if path.is_empty() {
            return Err(DescriptorError::EmptyPath { state_key });
        }
        Ok(Self {
            state_key,
            path,
            method,
            query: Vec::new(),
            body: None,
        })
    }

    /// Build a GET descriptor, the common case.
    pub fn get(
        state_key: impl Into<String>,
        path: impl Into<String>,
    ) -> Result<Self, DescriptorError> {
        Self::new(state_key, path, HttpMethod::Get)
    }

    /// Append one query parameter pair.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Attach a JSON request body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn state_key(&self) -> &str {
        &self.state_key
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    #[must_use]
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }
}

impl fmt::Display for EndpointDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} -> {}", self.method, self.path, self.state_key)
    }
}
