//! Configuration management for GitLab client

use std::{path::PathBuf, time::Duration};

use compact_str::CompactString;

use super::error::{ClientError, Result};
use crate::config::ExporterConfig;

/// Main configuration for GitLab client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// GitLab instance base URL, without the `/api/v4` suffix
    pub base_url: CompactString,
    /// Private access token
    pub private_token: CompactString,
    /// Polling configuration
    pub polling: PollingConfig,
    /// Request configuration
    pub request: RequestConfig,
    /// Debug configuration
    pub debug: DebugConfig,
}

/// Poll cycle scheduling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollingConfig {
    /// Delay after a poll cycle before the next one starts
    pub interval: Duration,
}

/// HTTP request configuration
#[derive(Debug, Clone)]
pub struct RequestConfig {
    /// Number of items per page for paginated requests
    pub per_page: u32,
    /// Request timeout
    pub timeout: Duration,
    /// Upper bound on pages fetched per listing; `None` follows `X-Next-Page` forever
    pub max_pages: Option<u32>,
}

/// Debug and logging configuration
#[derive(Debug, Clone)]
pub struct DebugConfig {
    /// Enable dumping of raw HTTP response bodies
    pub log_responses: bool,
    /// Directory for storing response dumps
    pub log_directory: Option<PathBuf>,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self { interval: Duration::from_secs(60) }
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            per_page: 100,
            timeout: Duration::from_secs(30),
            max_pages: Some(1000),
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_responses: false,
            log_directory: Some(PathBuf::from("gitlab-exporter-logs")),
        }
    }
}

impl ClientConfig {
    /// Create a new client configuration
    pub fn new(
        base_url: impl Into<CompactString>,
        private_token: impl Into<CompactString>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            private_token: private_token.into(),
            polling: PollingConfig::default(),
            request: RequestConfig::default(),
            debug: DebugConfig::default(),
        }
    }

    /// Create a builder for fluent configuration
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(ClientError::config("Base URL cannot be empty"));
        }

        if self.private_token.is_empty() {
            return Err(ClientError::config("Private token cannot be empty"));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ClientError::config("Base URL must start with http:// or https://"));
        }

        if self.request.per_page == 0 || self.request.per_page > 100 {
            return Err(ClientError::config("per_page must be between 1 and 100"));
        }

        if self.request.timeout.is_zero() {
            return Err(ClientError::config("Timeout must be greater than zero"));
        }

        if self.request.max_pages == Some(0) {
            return Err(ClientError::config("max_pages must be greater than zero"));
        }

        if self.polling.interval.is_zero() {
            return Err(ClientError::config("Poll interval must be greater than zero"));
        }

        Ok(())
    }

    /// Base URL with any trailing slashes removed
    pub fn api_root(&self) -> CompactString {
        let base = self.base_url.trim_end_matches('/');
        compact_str::format_compact!("{base}/api/v4")
    }
}

impl ClientConfig {
    /// Client settings for the exporter's config file, optionally dumping
    /// raw response bodies
    pub fn from_exporter(config: &ExporterConfig, debug: bool) -> Result<Self> {
        ClientConfig::builder()
            .base_url(config.gitlab_url.as_str())
            .private_token(config.gitlab_token.as_str())
            .poll_interval(Duration::from_secs(config.poll_interval_secs))
            .per_page(config.per_page)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .max_pages(config.max_pages)
            .debug_logging(debug)
            .build()
    }
}

/// Builder for ClientConfig
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    base_url: Option<CompactString>,
    private_token: Option<CompactString>,
    polling: Option<PollingConfig>,
    request: Option<RequestConfig>,
    debug: Option<DebugConfig>,
}

impl ClientConfigBuilder {
    /// Set base URL
    pub fn base_url(mut self, url: impl Into<CompactString>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set private token
    pub fn private_token(mut self, token: impl Into<CompactString>) -> Self {
        self.private_token = Some(token.into());
        self
    }

    /// Enable dumping of response bodies
    pub fn debug_logging(mut self, enabled: bool) -> Self {
        let mut debug = self.debug.unwrap_or_default();
        debug.log_responses = enabled;
        self.debug = Some(debug);
        self
    }

    /// Set poll interval
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        let mut polling = self.polling.unwrap_or_default();
        polling.interval = interval;
        self.polling = Some(polling);
        self
    }

    /// Set items per page
    pub fn per_page(mut self, per_page: u32) -> Self {
        let mut request = self.request.unwrap_or_default();
        request.per_page = per_page;
        self.request = Some(request);
        self
    }

    /// Set request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        let mut request = self.request.unwrap_or_default();
        request.timeout = timeout;
        self.request = Some(request);
        self
    }

    /// Set the page limit per paginated listing
    pub fn max_pages(mut self, max_pages: Option<u32>) -> Self {
        let mut request = self.request.unwrap_or_default();
        request.max_pages = max_pages;
        self.request = Some(request);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<ClientConfig> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::config("Base URL is required"))?;
        let private_token = self
            .private_token
            .ok_or_else(|| ClientError::config("Private token is required"))?;

        let config = ClientConfig {
            base_url,
            private_token,
            polling: self.polling.unwrap_or_default(),
            request: self.request.unwrap_or_default(),
            debug: self.debug.unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ClientConfig::builder()
            .base_url("https://gitlab.example.com")
            .private_token("test-token")
            .per_page(50)
            .max_pages(None)
            .debug_logging(true)
            .build()
            .unwrap();

        assert_eq!(config.base_url, "https://gitlab.example.com");
        assert_eq!(config.private_token, "test-token");
        assert_eq!(config.request.per_page, 50);
        assert_eq!(config.request.max_pages, None);
        assert!(config.debug.log_responses);
    }

    #[test]
    fn test_config_validation() {
        // Valid config
        let config = ClientConfig::new("https://gitlab.com", "token");
        assert!(config.validate().is_ok());

        // Empty base URL
        let config = ClientConfig::new("", "token");
        assert!(config.validate().is_err());

        // Empty token
        let config = ClientConfig::new("https://gitlab.com", "");
        assert!(config.validate().is_err());

        // Invalid URL
        let config = ClientConfig::new("not-a-url", "token");
        assert!(config.validate().is_err());

        // Page size above the GitLab maximum
        let result = ClientConfig::builder()
            .base_url("https://gitlab.com")
            .private_token("token")
            .per_page(101)
            .build();
        assert!(result.is_err());

        // Zero page limit
        let result = ClientConfig::builder()
            .base_url("https://gitlab.com")
            .private_token("token")
            .max_pages(Some(0))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_requires_token() {
        let result = ClientConfig::builder().base_url("https://gitlab.com").build();
        assert!(matches!(result, Err(ClientError::Config(msg)) if msg.contains("token")));
    }

    #[test]
    fn test_api_root_strips_trailing_slash() {
        let config = ClientConfig::new("https://git.example.com/", "token");
        assert_eq!(config.api_root(), "https://git.example.com/api/v4");

        let config = ClientConfig::new("https://git.example.com", "token");
        assert_eq!(config.api_root(), "https://git.example.com/api/v4");
    }

    #[test]
    fn test_from_exporter_config() {
        let exporter_config = ExporterConfig {
            gitlab_url: "https://gitlab.example.com".into(),
            gitlab_token: "test-token".into(),
            poll_interval_secs: 120,
            per_page: 20,
            max_pages: Some(5),
            ..ExporterConfig::default()
        };

        let client_config = ClientConfig::from_exporter(&exporter_config, false).unwrap();
        assert_eq!(client_config.base_url, "https://gitlab.example.com");
        assert_eq!(client_config.private_token, "test-token");
        assert_eq!(client_config.polling.interval, Duration::from_secs(120));
        assert_eq!(client_config.request.max_pages, Some(5));
        assert_eq!(client_config.request.per_page, 20);
        assert!(!client_config.debug.log_responses);

        let client_config = ClientConfig::from_exporter(&exporter_config, true).unwrap();
        assert!(client_config.debug.log_responses);
    }

    #[test]
    fn test_from_exporter_config_rejects_oversized_pages() {
        let exporter_config = ExporterConfig {
            gitlab_url: "https://gitlab.example.com".into(),
            gitlab_token: "test-token".into(),
            per_page: 500,
            ..ExporterConfig::default()
        };

        let result = ClientConfig::from_exporter(&exporter_config, false);
        assert!(matches!(result, Err(ClientError::Config(msg)) if msg.contains("per_page")));
    }

    #[test]
    fn test_from_default_exporter_config_fails() {
        let result = ClientConfig::from_exporter(&ExporterConfig::default(), false);
        assert!(result.is_err());
    }
}
