//! Core HTTP client for GitLab API

use chrono::Local;
use compact_str::{format_compact, CompactString};
use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use super::{
    config::ClientConfig,
    error::{ClientError, Result},
    pagination::{next_page_from_headers, Page},
};
use crate::{
    domain::{MergeRequest, Project},
    id::ProjectId,
};

/// Pure HTTP client for GitLab API
#[derive(Debug, Clone)]
pub struct GitlabApi {
    client: Client,
    config: ClientConfig,
}

/// GitLab API error response formats
#[derive(Debug, Deserialize)]
struct GitlabApiError {
    error: CompactString,
    error_description: Option<CompactString>,
}

#[derive(Debug, Deserialize)]
struct GitlabApiError2 {
    message: CompactString,
}

impl GitlabApi {
    /// Create a new GitLab API client
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.request.timeout)
            .build()
            .map_err(ClientError::Http)?;

        Ok(Self { client, config })
    }

    /// Get one page of all projects visible to the token
    #[instrument(skip(self), fields(page = %page))]
    pub async fn list_projects_page(&self, page: u32) -> Result<Page<Project>> {
        let url = self.projects_url();
        self.get_page(&url, page, self.config.request.per_page).await
    }

    /// Get one page of a project's merge requests
    #[instrument(skip(self), fields(project_id = %project_id, page = %page))]
    pub async fn list_merge_requests_page(
        &self,
        project_id: ProjectId,
        page: u32,
    ) -> Result<Page<MergeRequest>> {
        let url = self.merge_requests_url(project_id);
        self.get_page(&url, page, self.config.request.per_page).await
    }

    /// Validate API connection and credentials
    #[instrument(skip(self))]
    pub async fn validate_connection(&self) -> Result<()> {
        let url = self.projects_url();
        let page: Page<serde_json::Value> = self.get_page(&url, 1, 1).await?;

        debug!(visible = page.items.len(), "Connection validation successful");
        Ok(())
    }

    /// Get current configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(super) fn projects_url(&self) -> CompactString {
        format_compact!("{}/projects", self.config.api_root())
    }

    pub(super) fn merge_requests_url(&self, project_id: ProjectId) -> CompactString {
        format_compact!("{}/projects/{}/merge_requests", self.config.api_root(), project_id)
    }

    // Private helper methods

    /// Fetch a single page of a listing endpoint
    async fn get_page<T>(&self, url: &str, page: u32, per_page: u32) -> Result<Page<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        debug!(url, page, per_page, "Requesting page");

        let response = self
            .client
            .get(url)
            .query(&[
                ("private_token", self.config.private_token.as_str()),
                ("per_page", per_page.to_string().as_str()),
                ("statistics", "1"),
                ("page", page.to_string().as_str()),
            ])
            .send()
            .await
            .map_err(|e| ClientError::Http(e.without_url()))?;

        self.handle_response(response).await
    }

    /// Handle HTTP response, deserialize the JSON body and read the continuation signal
    async fn handle_response<T>(&self, response: Response) -> Result<Page<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        let url_path = response.url().path().to_string();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Http(e.without_url()))?;

        if self.config.debug.log_responses {
            self.log_response_to_file(&url_path, &body);
        }

        if !status.is_success() {
            return self.handle_error_response(status.as_u16(), &url_path, &body);
        }

        let items: Vec<T> = serde_json::from_str(&body).map_err(|e| {
            ClientError::json_parse(
                url_path.clone(),
                format!("expected a JSON array ({:?})", e.classify()),
                e,
            )
        })?;
        let next_page = next_page_from_headers(&url_path, &headers)?;

        debug!(items = items.len(), next_page = ?next_page, "Received page");
        Ok(Page { items, next_page })
    }

    /// Handle error responses from GitLab API
    fn handle_error_response<T>(&self, status: u16, url_path: &str, body: &str) -> Result<T> {
        match status {
            401 => Err(ClientError::Authentication),
            404 => Err(ClientError::not_found(url_path)),
            429 => Err(ClientError::RateLimit),
            _ => {
                // Try to parse GitLab API error formats
                if let Ok(api_error) = serde_json::from_str::<GitlabApiError>(body) {
                    Err(ClientError::gitlab_api(format_compact!(
                        "HTTP {}: {} {}",
                        status,
                        api_error.error,
                        api_error.error_description.unwrap_or_default()
                    )))
                } else if let Ok(api_error2) = serde_json::from_str::<GitlabApiError2>(body) {
                    Err(ClientError::gitlab_api(format_compact!(
                        "HTTP {}: {}",
                        status,
                        api_error2.message
                    )))
                } else {
                    Err(ClientError::gitlab_api(format_compact!("HTTP {}: {}", status, body)))
                }
            },
        }
    }

    /// Dump a response body to the debug directory
    fn log_response_to_file(&self, path: &str, body: &str) {
        if let Some(log_dir) = &self.config.debug.log_directory {
            if !log_dir.exists() {
                if let Err(e) = std::fs::create_dir_all(log_dir) {
                    warn!("Failed to create log directory: {}", e);
                    return;
                }
            }

            let filename = format!(
                "{}_{}.json",
                Local::now().format("%Y-%m-%d_%H-%M-%S%.3f"),
                path.replace('/', "_")
            );

            let log_path = log_dir.join(filename);

            if let Err(e) = std::fs::write(&log_path, body) {
                warn!("Failed to write response log to {:?}: {}", log_path, e);
            } else {
                debug!("Response logged to {:?}", log_path);
            }
        }
    }
}
