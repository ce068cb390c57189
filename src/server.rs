//! Scrape endpoint serving the latest metrics snapshot

use std::net::SocketAddr;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::{net::TcpListener, sync::broadcast};
use tracing::{debug, info, instrument};

use crate::{
    result::{ExporterError, Result},
    stores::MetricsStore,
};

const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

pub fn router(store: MetricsStore) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(|| async { "ok" }))
        .with_state(store)
}

/// Handler for GET /metrics
///
/// Serves the snapshot of the last successful poll cycle, or 503 until the
/// first cycle has completed.
#[instrument(skip_all, name = "metrics.scrape")]
async fn metrics_handler(State(store): State<MetricsStore>) -> Response {
    match store.latest().await {
        Some(snapshot) => {
            debug!(collected_at = %snapshot.collected_at, "Serving metrics snapshot");
            ([(header::CONTENT_TYPE, CONTENT_TYPE)], snapshot.body.to_string()).into_response()
        },
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "no successful poll cycle yet\n",
        )
            .into_response(),
    }
}

/// Serves the router until a shutdown signal arrives
pub async fn serve(
    address: &str,
    store: MetricsStore,
    shutdown: broadcast::Sender<()>,
) -> Result<()> {
    let address: SocketAddr = address.parse().map_err(|e| {
        ExporterError::GeneralError(format!("Invalid listen address {address:?}: {e}").into())
    })?;

    let listener = TcpListener::bind(address).await?;
    info!(address = %address, "Metrics endpoint listening");

    let mut shutdown_rx = shutdown.subscribe();
    axum::serve(listener, router(store))
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
        })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use chrono::Utc;
    use tower::ServiceExt;

    use super::*;
    use crate::stores::MetricsSnapshot;

    async fn get_body(store: MetricsStore, uri: &str) -> (StatusCode, String) {
        let response = router(store)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_metrics_unavailable_before_first_poll() {
        let (status, _) = get_body(MetricsStore::new(), "/metrics").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_metrics_serves_latest_snapshot() {
        let store = MetricsStore::new();
        store
            .publish(MetricsSnapshot {
                body: "gitlab_project_stars{repo=\"a___b\"} 3\n".into(),
                project_count: 1,
                merge_request_count: 0,
                collected_at: Utc::now(),
            })
            .await;

        let (status, body) = get_body(store, "/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "gitlab_project_stars{repo=\"a___b\"} 3\n");
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_body(MetricsStore::new(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }
}
