//! High-level GitLab service operations

use std::sync::Arc;

use tracing::{debug, error, info, instrument};

use super::{
    api::GitlabApi,
    config::ClientConfig,
    error::Result,
    pagination::Paginator,
};
use crate::{
    domain::{MergeRequest, Project},
    id::ProjectId,
};

/// High-level service for GitLab operations
///
/// Walks the paginated listings and assembles projects together with their
/// merge requests. Each call starts from an empty collection.
#[derive(Debug, Clone)]
pub struct GitlabService {
    api: Arc<GitlabApi>,
}

impl GitlabService {
    /// Create a new GitLab service
    pub fn new(config: ClientConfig) -> Result<Self> {
        let api = Arc::new(GitlabApi::new(config)?);
        Ok(Self { api })
    }

    /// Create service from existing API client
    pub fn from_api(api: Arc<GitlabApi>) -> Self {
        Self { api }
    }

    /// Fetch every project, each carrying all of its merge requests.
    ///
    /// Merge requests of a page's projects are fetched before the next page
    /// of projects is requested. Any failure aborts the whole fetch.
    #[instrument(skip(self))]
    pub async fn fetch_projects(&self) -> Result<Vec<Project>> {
        info!("Fetching projects from GitLab");

        let mut pages = Paginator::new(self.api.projects_url(), self.max_pages());
        let mut projects = Vec::new();

        while let Some(page) = pages.current() {
            let page = self.api.list_projects_page(page).await?;

            for project in page.items {
                let merge_requests = self.fetch_merge_requests(project.id).await?;
                projects.push(project.with_merge_requests(merge_requests));
            }

            pages.advance(page.next_page)?;
        }

        debug!(
            project_count = projects.len(),
            pages = pages.pages_fetched(),
            "Successfully fetched projects"
        );
        Ok(projects)
    }

    /// Fetch every merge request of a single project
    #[instrument(skip(self), fields(project_id = %project_id))]
    pub async fn fetch_merge_requests(&self, project_id: ProjectId) -> Result<Vec<MergeRequest>> {
        let mut pages =
            Paginator::new(self.api.merge_requests_url(project_id), self.max_pages());
        let mut merge_requests = Vec::new();

        while let Some(page) = pages.current() {
            let page = self.api.list_merge_requests_page(project_id, page).await?;
            merge_requests.extend(page.items);
            pages.advance(page.next_page)?;
        }

        debug!(
            merge_request_count = merge_requests.len(),
            "Successfully fetched merge requests"
        );
        Ok(merge_requests)
    }

    /// Validate GitLab connection and credentials
    #[instrument(skip(self))]
    pub async fn validate_connection(&self) -> Result<()> {
        info!("Validating GitLab connection");

        match self.api.validate_connection().await {
            Ok(()) => {
                info!("GitLab connection validation successful");
                Ok(())
            },
            Err(e) => {
                error!(error = %e, "GitLab connection validation failed");
                Err(e)
            },
        }
    }

    /// Get current configuration
    pub fn config(&self) -> &ClientConfig {
        self.api.config()
    }

    fn max_pages(&self) -> Option<u32> {
        self.api.config().request.max_pages
    }
}

/// Fetch all projects and their merge requests using default request settings
pub async fn fetch_projects(endpoint_base: &str, credential: &str) -> Result<Vec<Project>> {
    GitlabService::new(ClientConfig::new(endpoint_base, credential))?
        .fetch_projects()
        .await
}

/// Fetch all merge requests of one project using default request settings
pub async fn fetch_merge_requests(
    endpoint_base: &str,
    credential: &str,
    project_id: ProjectId,
) -> Result<Vec<MergeRequest>> {
    GitlabService::new(ClientConfig::new(endpoint_base, credential))?
        .fetch_merge_requests(project_id)
        .await
}
