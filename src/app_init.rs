use std::sync::Arc;

use compact_str::ToCompactString;
use tokio::task::JoinHandle;
use tracing_appender::non_blocking::WorkerGuard;

use crate::{
    client::{
        api::GitlabApi,
        poller::{spawn_poller, SHUTDOWN_GRACE},
        ClientConfig, GitlabService,
    },
    config::ExporterConfig,
    logging::{init_logging, LoggingConfig},
    metrics::render_projects,
    result::{ExporterError, Result},
    server::serve,
    stores::MetricsStore,
};

pub fn initialize_logging(config: &ExporterConfig) -> Result<Option<WorkerGuard>> {
    let mut logging_config = LoggingConfig::from_env();

    // Override with config if specified
    if let Some(log_level) = &config.log_level {
        logging_config.apply_level(log_level);
    }

    init_logging(logging_config).map_err(|e| {
        ExporterError::GeneralError(format!("Failed to initialize logging: {e}").into())
    })
}

fn create_gitlab_service(config: &ExporterConfig, debug: bool) -> Result<GitlabService> {
    let client_config = ClientConfig::from_exporter(config, debug)?;
    let api = Arc::new(GitlabApi::new(client_config)?);

    Ok(GitlabService::from_api(api))
}

/// Runs a single poll cycle and writes the metrics to stdout.
pub async fn run_once(config: ExporterConfig, debug: bool) -> Result<()> {
    let service = create_gitlab_service(&config, debug)?;

    let projects = service.fetch_projects().await?;
    print!("{}", render_projects(&projects));

    Ok(())
}

/// Polls GitLab in the background and serves `/metrics` until interrupted.
pub async fn run_exporter(config: ExporterConfig, debug: bool) -> Result<()> {
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        gitlab_url = %config.gitlab_url,
        "GitLab exporter starting up"
    );

    let service = create_gitlab_service(&config, debug)?;

    // an unreachable GitLab at startup is not fatal; the poller retries every interval
    if let Err(e) = service.validate_connection().await {
        tracing::warn!(error = %e, "Continuing despite failed connection check");
    }

    let store = MetricsStore::new();
    let polling = service.config().polling.clone();
    let (shutdown, poller) = spawn_poller(service, store.clone(), polling);
    let mut server: JoinHandle<Result<()>> =
        tokio::spawn({
            let listen_address = config.listen_address.clone();
            let shutdown = shutdown.clone();
            async move { serve(&listen_address, store, shutdown).await }
        });

    let outcome = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            tracing::info!("Received interrupt, shutting down");
            signal.map_err(ExporterError::from)
        }
        served = &mut server => {
            flatten(served)
        }
    };

    let _ = shutdown.send(());
    if !server.is_finished() {
        let _ = tokio::time::timeout(SHUTDOWN_GRACE, &mut server).await;
    }
    if tokio::time::timeout(SHUTDOWN_GRACE, poller).await.is_err() {
        tracing::warn!("Poller did not stop within {:?}", SHUTDOWN_GRACE);
    }

    outcome
}

fn flatten(joined: std::result::Result<Result<()>, tokio::task::JoinError>) -> Result<()> {
    joined.map_err(|e| ExporterError::GeneralError(e.to_compact_string()))?
}
