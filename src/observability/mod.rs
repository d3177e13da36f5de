//! Observability module for the CDN origin.
//!
//! Provides logging initialization and the Prometheus metrics endpoint.

use crate::config::ObservabilityConfig;
use crate::error::{CdnError, Result};
use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize logging.
pub fn init(config: &ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber
            .with(fmt::layer().json())
            .try_init()
            .map_err(|e| CdnError::Internal(format!("Failed to init logging: {}", e)))?;
    } else {
        subscriber
            .with(fmt::layer())
            .try_init()
            .map_err(|e| CdnError::Internal(format!("Failed to init logging: {}", e)))?;
    }

    info!("Observability initialized");
    Ok(())
}

/// Run the Prometheus metrics server.
pub async fn run_metrics_server(config: ObservabilityConfig) -> Result<()> {
    let builder = PrometheusBuilder::new();

    let handle = builder
        .install_recorder()
        .map_err(|e| CdnError::Internal(format!("Failed to install metrics recorder: {}", e)))?;

    register_metrics();

    let app = axum::Router::new()
        .route(
            "/metrics",
            axum::routing::get(move || async move { handle.render() }),
        )
        .route("/health", axum::routing::get(|| async { "OK" }));

    let listener = TcpListener::bind(config.metrics_addr).await?;
    info!(addr = %config.metrics_addr, "Metrics server listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| CdnError::Internal(e.to_string()))?;

    Ok(())
}

/// Register standard metrics.
fn register_metrics() {
    describe_counter!(
        "cdn_origin_http_requests_total",
        "Total number of HTTP requests handled by the relay, partitioned by hostname."
    );
    describe_counter!(
        "cdn_origin_volume_lookups_total",
        "Total number of volume lookup requests sent to the master."
    );
    describe_counter!(
        "cdn_origin_cache_hits_total",
        "Total number of volume location cache hits."
    );
    describe_counter!(
        "cdn_origin_cache_misses_total",
        "Total number of volume location cache misses."
    );
    describe_counter!(
        "cdn_origin_fetch_errors_total",
        "Total number of failed fetches against volume servers."
    );

    counter!("cdn_origin_volume_lookups_total").absolute(0);
    counter!("cdn_origin_cache_hits_total").absolute(0);
    counter!("cdn_origin_cache_misses_total").absolute(0);
    counter!("cdn_origin_fetch_errors_total").absolute(0);
}
