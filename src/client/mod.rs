//! GitLab client modules
//!
//! Paginated access to the GitLab REST API, split into transport ([api]),
//! pagination bookkeeping ([pagination]), project aggregation ([service]) and
//! scheduled poll cycles ([poller]).

pub mod api;
pub mod config;
pub mod error;
pub mod pagination;
pub mod poller;
pub mod service;

#[cfg(test)]
mod tests;

// Re-export main types for convenience
pub use config::ClientConfig;
pub use error::ClientError;
pub use service::GitlabService;
