use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{domain::Project, metrics::render_projects};

/// Metrics text of the last successful poll cycle
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub body: Arc<str>,
    pub project_count: usize,
    pub merge_request_count: usize,
    pub collected_at: DateTime<Utc>,
}

impl MetricsSnapshot {
    pub fn from_projects(projects: &[Project], collected_at: DateTime<Utc>) -> Self {
        Self {
            body: render_projects(projects).into(),
            project_count: projects.len(),
            merge_request_count: projects.iter().map(|p| p.merge_requests.len()).sum(),
            collected_at,
        }
    }
}

/// Shared holder of the latest [MetricsSnapshot].
///
/// Only complete poll cycles are published; a failed cycle leaves the
/// previous snapshot in place.
#[derive(Debug, Clone, Default)]
pub struct MetricsStore {
    latest: Arc<RwLock<Option<MetricsSnapshot>>>,
}

impl MetricsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn publish(&self, snapshot: MetricsSnapshot) {
        *self.latest.write().await = Some(snapshot);
    }

    pub async fn latest(&self) -> Option<MetricsSnapshot> {
        self.latest.read().await.clone()
    }
}
