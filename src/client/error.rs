//! Error types for GitLab client operations

use compact_str::CompactString;
use thiserror::Error;

/// Structured error types for GitLab client operations
///
/// Every variant aborts the poll cycle it occurs in; none of them carry a
/// partially fetched collection.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error with endpoint context
    #[error("Failed to parse JSON response from {endpoint}: {message}")]
    JsonParse {
        endpoint: String,
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// `X-Next-Page` header present but not a positive page number
    #[error("Malformed X-Next-Page header from {endpoint}: {value:?}")]
    MalformedPageHeader { endpoint: String, value: String },

    /// Upstream kept announcing further pages past the configured limit
    #[error("Gave up after {max_pages} pages from {endpoint}")]
    PageLimitExceeded { endpoint: String, max_pages: u32 },

    /// GitLab API returned an error response
    #[error("GitLab API error: {message}")]
    GitlabApi { message: CompactString },

    /// Configuration is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Authentication failed
    #[error("Authentication failed")]
    Authentication,

    /// Resource not found
    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimit,
}

impl ClientError {
    /// Create a JSON parsing error with endpoint context
    pub fn json_parse(
        endpoint: impl Into<String>,
        message: impl Into<String>,
        source: serde_json::Error,
    ) -> Self {
        Self::JsonParse {
            endpoint: endpoint.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a malformed pagination header error
    pub fn malformed_page_header(endpoint: impl Into<String>, value: impl Into<String>) -> Self {
        Self::MalformedPageHeader { endpoint: endpoint.into(), value: value.into() }
    }

    /// Create a page limit error
    pub fn page_limit_exceeded(endpoint: impl Into<String>, max_pages: u32) -> Self {
        Self::PageLimitExceeded { endpoint: endpoint.into(), max_pages }
    }

    /// Create a GitLab API error
    pub fn gitlab_api(message: impl Into<CompactString>) -> Self {
        Self::GitlabApi { message: message.into() }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a not found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound { resource: resource.into() }
    }

    /// Check if the next poll cycle is likely to succeed without intervention
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Http(e) => e.is_timeout() || e.is_connect(),
            ClientError::RateLimit => true,
            _ => false,
        }
    }

    /// Check if upstream sent a response that breaks the pagination contract
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            ClientError::MalformedPageHeader { .. } | ClientError::PageLimitExceeded { .. }
        )
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
