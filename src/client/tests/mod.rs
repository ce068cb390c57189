//! Test utilities and common test fixtures for client modules

use serde_json::json;
use wiremock::{
    matchers::{method, path, query_param},
    Mock, ResponseTemplate,
};

use crate::{client::config::ClientConfig, id::ProjectId};


/// Create JSON representation of a project with zeroed statistics
pub fn project_json(id: u64, path_with_namespace: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": path_with_namespace.rsplit('/').next().unwrap_or_default(),
        "path_with_namespace": path_with_namespace,
        "star_count": 0,
        "forks_count": 0,
        "fork_count": 0,
        "open_issues_count": 0,
        "last_activity_at": "2023-01-01T00:00:00Z",
        "statistics": {
            "commit_count": 0,
            "storage_size": 0,
            "repository_size": 0,
            "lfs_objects_size": 0,
            "job_artifacts_size": 0
        }
    })
}

/// Create JSON representation of a merge request
pub fn merge_request_json(title: &str, state: &str, target_branch: &str) -> serde_json::Value {
    json!({
        "id": 1,
        "iid": 1,
        "title": title,
        "state": state,
        "merge_status": "can_be_merged",
        "target_branch": target_branch,
        "source_branch": "feature",
        "created_at": "2023-01-01T00:00:00Z",
        "updated_at": "2023-01-02T00:00:00Z"
    })
}

/// Create GitLab API error response
pub fn gitlab_error_response(message: &str) -> serde_json::Value {
    json!({
        "message": message
    })
}

/// A JSON page response carrying the given continuation signal
pub fn page_response(items: serde_json::Value, next_page: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_json(items)
        .insert_header("X-Next-Page", next_page)
}

/// Mock HTTP server for testing
pub struct MockServer {
    pub server: wiremock::MockServer,
}

impl MockServer {
    /// Start a new mock server
    pub async fn start() -> Self {
        let server = wiremock::MockServer::start().await;
        Self { server }
    }

    /// Get the base URL of the mock server
    pub fn base_url(&self) -> String {
        self.server.uri()
    }

    /// Create a test config pointing to this mock server
    pub fn test_config(&self) -> ClientConfig {
        ClientConfig::new(self.base_url(), "test-token")
    }

    /// Serve one page of the project listing, expected to be requested exactly once
    pub async fn mount_projects_page(&self, page: u32, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path("/api/v4/projects"))
            .and(query_param("page", page.to_string()))
            .respond_with(response)
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Serve one page of a project's merge requests, expected to be requested exactly once
    pub async fn mount_merge_requests_page(
        &self,
        project_id: ProjectId,
        page: u32,
        response: ResponseTemplate,
    ) {
        Mock::given(method("GET"))
            .and(path(format!("/api/v4/projects/{project_id}/merge_requests")))
            .and(query_param("page", page.to_string()))
            .respond_with(response)
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Number of requests the server has seen so far
    pub async fn request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|requests| requests.len())
            .unwrap_or_default()
    }
}
