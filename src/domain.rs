// GitLab API Documentation: https://docs.gitlab.com/ee/api/projects.html
//                           https://docs.gitlab.com/ee/api/merge_requests.html
use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::Deserialize;

use crate::id::ProjectId;

#[derive(Clone, Debug, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub path_with_namespace: CompactString,
    #[serde(default)]
    pub star_count: u64,
    #[serde(default)]
    pub fork_count: u64,
    #[serde(default)]
    pub open_issues_count: u64,
    pub last_activity_at: DateTime<Utc>,
    #[serde(default)]
    pub statistics: Statistics,
    /// Populated by the aggregation step, never part of the API payload.
    #[serde(skip)]
    pub merge_requests: Vec<MergeRequest>,
}

/// Repository disk usage, only reported when `statistics=1` is requested
/// by a user with at least reporter access.
///
/// Older payloads spell the LFS counter `lfs_object_size`; when both
/// spellings are present `lfs_objects_size` wins.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "RawStatistics")]
pub struct Statistics {
    pub commit_count: u64,
    pub storage_size: u64,
    pub repository_size: u64,
    pub lfs_objects_size: u64,
    pub job_artifacts_size: u64,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct RawStatistics {
    commit_count: u64,
    storage_size: u64,
    repository_size: u64,
    lfs_objects_size: Option<u64>,
    lfs_object_size: Option<u64>,
    job_artifacts_size: u64,
}

impl From<RawStatistics> for Statistics {
    fn from(raw: RawStatistics) -> Self {
        Self {
            commit_count: raw.commit_count,
            storage_size: raw.storage_size,
            repository_size: raw.repository_size,
            lfs_objects_size: raw.lfs_objects_size.or(raw.lfs_object_size).unwrap_or_default(),
            job_artifacts_size: raw.job_artifacts_size,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct MergeRequest {
    #[serde(default)]
    pub title: CompactString,
    /// opened, closed, locked or merged
    #[serde(default)]
    pub state: CompactString,
    #[serde(default)]
    pub merge_status: CompactString,
    #[serde(default)]
    pub target_branch: CompactString,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Attaches the project's merge requests. Consumes the project so that a
    /// project can only leave the aggregation step fully populated.
    pub fn with_merge_requests(mut self, merge_requests: Vec<MergeRequest>) -> Self {
        debug_assert!(self.merge_requests.is_empty());
        self.merge_requests = merge_requests;
        self
    }
}
