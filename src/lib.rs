//! CDN origin for a SeaweedFS-backed object store.
//!
//! A stateless origin server that fetches file content from a sharded,
//! replicated SeaweedFS cluster. Stored files are addressed by composite
//! identifiers of the form `"<volumeId>,<fileKey>"`; the cluster master maps
//! volume ids to the replica addresses currently holding that volume.
//!
//! The interesting part is the volume location cache: master lookups are
//! cached per volume, and cached replica addresses are dispensed round-robin
//! on every resolution, so fetch load spreads evenly across replicas without
//! a master round trip per request.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                     cdn-origin                      │
//! ├─────────────────────────────────────────────────────┤
//! │  Relay: axum GET /<fid>  →  status/headers/body     │
//! ├─────────────────────────────────────────────────────┤
//! │  ContentFetcher: URL build + volume server GET      │
//! ├─────────────────────────────────────────────────────┤
//! │  VolumeResolver: cache hit | master /dir/lookup     │
//! ├─────────────────────────────────────────────────────┤
//! │  VolumeCache: id → replica list + rotation cursor   │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```no_run
//! use cdn_origin::config::CdnConfig;
//!
//! #[tokio::main]
//! async fn main() -> cdn_origin::Result<()> {
//!     let config = CdnConfig::development();
//!     cdn_origin::run(config).await
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod observability;
pub mod resolver;
pub mod server;
pub mod types;

// Re-exports
pub use cache::VolumeCache;
pub use error::{CdnError, Result};
pub use fetch::ContentFetcher;
pub use resolver::VolumeResolver;
pub use types::VolumeId;

use config::CdnConfig;
use std::sync::Arc;
use tracing::{error, info};

/// Run the CDN origin with the given configuration.
///
/// Initializes observability, pings the cluster master (failing fast when it
/// is unreachable), then serves the relay and, when enabled, the metrics
/// endpoint until either exits.
pub async fn run(config: CdnConfig) -> Result<()> {
    config.validate()?;
    observability::init(&config.observability)?;

    info!(master = %config.seaweed.master_url, "Starting CDN origin");

    let cache = Arc::new(VolumeCache::with_ttl(config.seaweed.location_cache_ttl));
    let resolver = VolumeResolver::new(
        &config.seaweed.master_url,
        config.seaweed.lookup_timeout,
        cache,
    );

    resolver.ping().await.map_err(|e| {
        error!(err = %e, "failed to ping SeaweedFS master");
        e
    })?;
    info!("SeaweedFS master reachable");

    let fetcher = ContentFetcher::new(resolver, config.seaweed.fetch_timeout);

    if config.observability.metrics_enabled {
        let obs_config = config.observability.clone();
        tokio::spawn(async move {
            if let Err(e) = observability::run_metrics_server(obs_config).await {
                error!("Metrics server error: {}", e);
            }
        });
    }

    server::run_relay_server(config.http, fetcher).await
}
