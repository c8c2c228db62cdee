//! Recorded endpoint failures and their presentation helpers.
//!
//! A failed endpoint never aborts its siblings; it becomes an
//! [`EndpointFailure`] in loader state and the batch runs to settlement.
//! At presentation time identical messages collapse to one line, so three
//! endpoints failing with the same upstream detail read as a single failure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::FetchError;

/// One endpoint's recorded failure within a batch.
///
/// Carries enough to render a consolidated message (`message`), attribute the
/// failure (`state_key`, `status`, `when`), and debug it (`body`, the raw
/// error payload when one was received).
///
/// # Examples
///
/// ```rust
/// use tributary::errors::EndpointFailure;
///
/// let failure = EndpointFailure::status("issues", 400, "Invalid statsPeriod")
///     .with_body(serde_json::json!({"detail": "Invalid statsPeriod"}));
/// assert_eq!(failure.status, Some(400));
/// assert_eq!(failure.message, "Invalid statsPeriod");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EndpointFailure {
    #[serde(default = "chrono::Utc::now")]
    pub when: DateTime<Utc>,
    /// The state key of the descriptor that failed.
    pub state_key: String,
    /// HTTP status when the server answered; `None` for transport failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// User-facing failure text (the response body's `detail` when present).
    pub message: String,
    /// Raw error payload, `Null` when none was received.
    #[serde(default)]
    pub body: Value,
}

impl EndpointFailure {
    /// Record a transport-level failure (request never produced a response).
    pub fn transport(state_key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            when: Utc::now(),
            state_key: state_key.into(),
            status: None,
            message: message.into(),
            body: Value::Null,
        }
    }

    /// Record a non-2xx response.
    pub fn status(state_key: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self {
            when: Utc::now(),
            state_key: state_key.into(),
            status: Some(status),
            message: message.into(),
            body: Value::Null,
        }
    }

    /// Attach the raw error payload.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    /// Build the failure record for a settled fetch error.
    pub fn from_fetch(state_key: impl Into<String>, error: &FetchError) -> Self {
        match error {
            FetchError::Transport { message } => Self::transport(state_key, message.clone()),
            FetchError::Status {
                status,
                detail,
                body,
            } => Self::status(state_key, *status, detail.clone()).with_body(body.clone()),
            FetchError::Decode { source } => {
                Self::transport(state_key, format!("invalid response body: {source}"))
            }
        }
    }
}

/// Distinct failure messages in first-seen order.
///
/// Multiple endpoints failing with an identical message collapse to one
/// entry, so the aggregate failure view never repeats the same text per
/// endpoint.
pub fn dedup_messages(failures: &[EndpointFailure]) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::with_capacity(failures.len());
    for failure in failures {
        if !seen.contains(&failure.message.as_str()) {
            seen.push(&failure.message);
        }
    }
    seen
}

/// Render the consolidated, de-duplicated failure text for a settled batch.
pub fn consolidate(failures: &[EndpointFailure]) -> String {
    dedup_messages(failures).join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_preserves_first_seen_order() {
        let failures = vec![
            EndpointFailure::status("a", 400, "X"),
            EndpointFailure::status("b", 400, "X"),
            EndpointFailure::status("c", 500, "Y"),
        ];
        assert_eq!(dedup_messages(&failures), vec!["X", "Y"]);
        assert_eq!(consolidate(&failures), "X\nY");
    }

    #[test]
    fn from_fetch_maps_each_variant() {
        let transport = FetchError::Transport {
            message: "connection refused".into(),
        };
        let failure = EndpointFailure::from_fetch("k", &transport);
        assert_eq!(failure.status, None);
        assert_eq!(failure.message, "connection refused");

        let status = FetchError::Status {
            status: 403,
            detail: "forbidden".into(),
            body: serde_json::json!({"detail": "forbidden"}),
        };
        let failure = EndpointFailure::from_fetch("k", &status);
        assert_eq!(failure.status, Some(403));
        assert_eq!(failure.body, serde_json::json!({"detail": "forbidden"}));
    }
}
