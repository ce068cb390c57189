//! Periodic poll cycles against GitLab

use std::time::Duration;

use chrono::Utc;
use tokio::{sync::broadcast, time::sleep};
use tracing::{debug, error, info, instrument, warn};

use super::{config::PollingConfig, error::Result, service::GitlabService};
use crate::stores::{MetricsSnapshot, MetricsStore};

/// Background poller for GitLab statistics
///
/// Runs one poll cycle per interval and publishes the rendered metrics of
/// every successful cycle to the [MetricsStore].
#[derive(Debug)]
pub struct GitlabPoller {
    service: GitlabService,
    store: MetricsStore,
    config: PollingConfig,
    shutdown_tx: broadcast::Sender<()>,
}

impl GitlabPoller {
    /// Create a new GitLab poller
    pub fn new(service: GitlabService, store: MetricsStore, config: PollingConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self { service, store, config, shutdown_tx }
    }

    /// Run a single poll cycle.
    ///
    /// On success the store holds the new snapshot; on failure it keeps
    /// serving the previous one.
    #[instrument(skip(self))]
    pub async fn poll_once(&self) -> Result<MetricsSnapshot> {
        let started = std::time::Instant::now();
        let projects = self.service.fetch_projects().await?;
        let snapshot = MetricsSnapshot::from_projects(&projects, Utc::now());

        if projects.is_empty() {
            warn!("Poll cycle found no projects visible to the token");
        }

        info!(
            project_count = snapshot.project_count,
            merge_request_count = snapshot.merge_request_count,
            elapsed = ?started.elapsed(),
            "Poll cycle completed"
        );

        self.store.publish(snapshot.clone()).await;
        Ok(snapshot)
    }

    /// Poll until a shutdown signal arrives; the first cycle runs immediately.
    ///
    /// A cycle in progress always runs to completion before shutdown is
    /// observed.
    #[instrument(skip(self), fields(interval = ?self.config.interval))]
    pub async fn start(self) {
        info!("Starting GitLab poller");
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            if let Err(e) = self.poll_once().await {
                error!(
                    error = %e,
                    retryable = e.is_retryable(),
                    protocol_violation = e.is_protocol_violation(),
                    "Poll cycle failed, keeping previous metrics"
                );
            }

            tokio::select! {
                _ = sleep(self.config.interval) => {
                    debug!("Poll interval elapsed");
                }
                _ = shutdown_rx.recv() => {
                    debug!("Poller received shutdown signal");
                    break;
                }
            }
        }

        info!("GitLab poller stopped");
    }

    /// Get a shutdown sender for external shutdown control
    pub fn shutdown_sender(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }
}

/// Spawn a GitLab poller as a background task
///
/// Returns the shutdown sender and the task handle.
pub fn spawn_poller(
    service: GitlabService,
    store: MetricsStore,
    config: PollingConfig,
) -> (broadcast::Sender<()>, tokio::task::JoinHandle<()>) {
    let poller = GitlabPoller::new(service, store, config);
    let shutdown_sender = poller.shutdown_sender();

    let handle = tokio::spawn(poller.start());

    (shutdown_sender, handle)
}

/// Default wait for the poller to notice a shutdown request
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);
