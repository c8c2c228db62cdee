//! The HTTP collaborator seam.
//!
//! The loader never talks to the network directly; it drives an [`ApiClient`]
//! implementation. Production code uses [`HttpClient`]; tests substitute
//! scripted doubles. The seam is one async method returning either a decoded
//! JSON body or a [`FetchError`] classifying what went wrong.

pub mod http;

pub use http::{ClientError, HttpClient};

use async_trait::async_trait;
use miette::Diagnostic;
use serde_json::Value;
use thiserror::Error;

use crate::descriptor::EndpointDescriptor;

/// A failed fetch, classified for the loader's failure handling.
#[derive(Debug, Error, Diagnostic)]
pub enum FetchError {
    /// The request never produced a response: connect failure, broken
    /// transport, or an opted-in timeout.
    #[error("transport failure: {message}")]
    #[diagnostic(code(tributary::client::transport))]
    Transport { message: String },

    /// The server answered with a non-2xx status.
    #[error("endpoint returned {status}: {detail}")]
    #[diagnostic(code(tributary::client::status))]
    Status {
        status: u16,
        /// User-facing text, extracted from the body's `detail` field when
        /// present, otherwise the canonical reason phrase.
        detail: String,
        /// The decoded error payload, `Null` when the body was not JSON.
        body: Value,
    },

    /// A 2xx response whose body was not valid JSON.
    #[error("invalid response body")]
    #[diagnostic(
        code(tributary::client::decode),
        help("The endpoint answered success with a non-JSON body.")
    )]
    Decode {
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    /// Build a status error, extracting `detail` from the payload.
    pub fn from_status(status: u16, body: Value, reason: &str) -> Self {
        let detail = body
            .get("detail")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| reason.to_string());
        FetchError::Status {
            status,
            detail,
            body,
        }
    }

    /// The HTTP status, when the server answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The decoded error payload, when one was received.
    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        match self {
            FetchError::Status { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// Read-style request issuer the loader fans out through.
///
/// Implementations must be safe to call concurrently: the loader issues every
/// descriptor of a batch at once against a shared client.
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Issue one request and decode its JSON body.
    async fn fetch(&self, descriptor: &EndpointDescriptor) -> Result<Value, FetchError>;
}
