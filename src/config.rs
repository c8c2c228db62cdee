//! Loader configuration.
//!
//! Configuration is explicit and injected: a [`LoaderConfig`] is built once,
//! handed to the client/loader, and read-only from then on. The only ambient
//! input is the `TRIBUTARY_BASE_URL` environment variable (loaded through
//! `dotenvy`, so a local `.env` file works), and only as a default when no
//! base URL was set in code.

use std::time::Duration;

/// Environment variable consulted for a default base URL.
pub const BASE_URL_ENV: &str = "TRIBUTARY_BASE_URL";

/// Read-only configuration shared by the HTTP client and the loader.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
/// use tributary::config::LoaderConfig;
///
/// let config = LoaderConfig::new("https://sentry.example.com")
///     .with_render_bad_requests(true)
///     .with_request_timeout(Duration::from_secs(30));
///
/// assert_eq!(config.base_url(), Some("https://sentry.example.com"));
/// assert!(config.render_bad_requests());
/// ```
#[derive(Clone, Debug)]
pub struct LoaderConfig {
    base_url: Option<String>,
    render_bad_requests: bool,
    request_timeout: Option<Duration>,
    user_agent: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            base_url: Self::resolve_base_url(None),
            render_bad_requests: false,
            request_timeout: None,
            user_agent: Self::default_user_agent(),
        }
    }
}

impl LoaderConfig {
    fn resolve_base_url(provided: Option<String>) -> Option<String> {
        if provided.is_some() {
            return provided;
        }
        dotenvy::dotenv().ok();
        std::env::var(BASE_URL_ENV).ok()
    }

    fn default_user_agent() -> String {
        format!("tributary/{}", env!("CARGO_PKG_VERSION"))
    }

    /// Build a configuration with an explicit base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            ..Self::default_without_env()
        }
    }

    fn default_without_env() -> Self {
        Self {
            base_url: None,
            render_bad_requests: false,
            request_timeout: None,
            user_agent: Self::default_user_agent(),
        }
    }

    /// Treat renderable 4xx bodies (400, 403, 404) as data instead of batch
    /// failures.
    #[must_use]
    pub fn with_render_bad_requests(mut self, enabled: bool) -> Self {
        self.render_bad_requests = enabled;
        self
    }

    /// Opt in to a per-request timeout.
    ///
    /// Without one, a hung request leaves its batch loading indefinitely;
    /// the loader imposes no deadline of its own.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    #[must_use]
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    #[must_use]
    pub fn render_bad_requests(&self) -> bool {
        self.render_bad_requests
    }

    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }

    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_round_trip() {
        let config = LoaderConfig::new("http://localhost:9000")
            .with_render_bad_requests(true)
            .with_request_timeout(Duration::from_millis(250))
            .with_user_agent("test-agent");
        assert_eq!(config.base_url(), Some("http://localhost:9000"));
        assert!(config.render_bad_requests());
        assert_eq!(config.request_timeout(), Some(Duration::from_millis(250)));
        assert_eq!(config.user_agent(), "test-agent");
    }

    #[test]
    fn explicit_base_url_skips_env() {
        let config = LoaderConfig::new("http://explicit");
        assert_eq!(config.base_url(), Some("http://explicit"));
    }
}
