//! Integration tests for volume resolution against a mock master.

mod common;

use cdn_origin::cache::VolumeCache;
use cdn_origin::error::CdnError;
use cdn_origin::resolver::VolumeResolver;
use common::{lookup_body, spawn_server};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(2);

/// A mock master serving the two-replica fixture for volume 7 and counting
/// lookup calls.
async fn fixture_master(lookups: Arc<AtomicUsize>) -> std::net::SocketAddr {
    let app = axum::Router::new()
        .route(
            "/dir/lookup",
            axum::routing::get(move || {
                let lookups = Arc::clone(&lookups);
                async move {
                    lookups.fetch_add(1, Ordering::SeqCst);
                    lookup_body("7", &["cdn1.example.com:8080", "cdn2.example.com:8080"])
                }
            }),
        )
        .route("/cluster/status", axum::routing::get(|| async { "{}" }));
    spawn_server(app).await
}

fn resolver_for(addr: std::net::SocketAddr) -> VolumeResolver {
    VolumeResolver::new(
        &format!("http://{}", addr),
        LOOKUP_TIMEOUT,
        Arc::new(VolumeCache::new()),
    )
}

#[tokio::test]
async fn test_cold_resolve_populates_and_rotates() {
    let lookups = Arc::new(AtomicUsize::new(0));
    let addr = fixture_master(Arc::clone(&lookups)).await;
    let resolver = resolver_for(addr);

    // First resolve consults the master and dispenses the first replica
    assert_eq!(resolver.resolve("7").await.unwrap(), "cdn1.example.com:8080");
    assert_eq!(lookups.load(Ordering::SeqCst), 1);

    // Warm resolves rotate without touching the master
    assert_eq!(resolver.resolve("7").await.unwrap(), "cdn2.example.com:8080");
    assert_eq!(resolver.resolve("7").await.unwrap(), "cdn1.example.com:8080");
    assert_eq!(lookups.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_malformed_id_makes_no_lookup() {
    let lookups = Arc::new(AtomicUsize::new(0));
    let addr = fixture_master(Arc::clone(&lookups)).await;
    let resolver = resolver_for(addr);

    assert!(matches!(
        resolver.resolve("abc").await,
        Err(CdnError::InvalidVolumeId(_))
    ));
    assert!(matches!(
        resolver.resolve("-1").await,
        Err(CdnError::InvalidVolumeId(_))
    ));
    assert_eq!(lookups.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_master_error_status_is_lookup_failure() {
    let app = axum::Router::new().route(
        "/dir/lookup",
        axum::routing::get(|| async {
            (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "boom")
        }),
    );
    let addr = spawn_server(app).await;
    let resolver = resolver_for(addr);

    assert!(matches!(
        resolver.resolve("7").await,
        Err(CdnError::LookupFailed { volume: 7, .. })
    ));
    // Nothing was cached; the next call hits the master again
    assert!(resolver.cache().get(cdn_origin::VolumeId(7)).is_none());
}

#[tokio::test]
async fn test_garbage_body_is_malformed_lookup() {
    let app = axum::Router::new().route(
        "/dir/lookup",
        axum::routing::get(|| async { "not json at all" }),
    );
    let addr = spawn_server(app).await;
    let resolver = resolver_for(addr);

    assert!(matches!(
        resolver.resolve("7").await,
        Err(CdnError::LookupMalformed { volume: 7, .. })
    ));
}

#[tokio::test]
async fn test_empty_locations_is_malformed_lookup() {
    let app = axum::Router::new().route(
        "/dir/lookup",
        axum::routing::get(|| async { r#"{"volumeId":"7","locations":[]}"# }),
    );
    let addr = spawn_server(app).await;
    let resolver = resolver_for(addr);

    assert!(matches!(
        resolver.resolve("7").await,
        Err(CdnError::LookupMalformed { volume: 7, .. })
    ));
    assert!(resolver.cache().is_empty());
}

#[tokio::test]
async fn test_unreachable_master_is_lookup_failure() {
    let resolver = VolumeResolver::new(
        "http://127.0.0.1:1",
        Duration::from_millis(200),
        Arc::new(VolumeCache::new()),
    );
    assert!(matches!(
        resolver.resolve("7").await,
        Err(CdnError::LookupFailed { volume: 7, .. })
    ));
}

#[tokio::test]
async fn test_ping() {
    let lookups = Arc::new(AtomicUsize::new(0));
    let addr = fixture_master(lookups).await;
    let resolver = resolver_for(addr);
    assert!(resolver.ping().await.is_ok());
}

#[tokio::test]
async fn test_ping_non_200_is_unreachable() {
    let app = axum::Router::new().route(
        "/cluster/status",
        axum::routing::get(|| async { (axum::http::StatusCode::SERVICE_UNAVAILABLE, "") }),
    );
    let addr = spawn_server(app).await;
    let resolver = resolver_for(addr);

    assert!(matches!(
        resolver.ping().await,
        Err(CdnError::MasterUnreachable(_))
    ));
}

#[tokio::test]
async fn test_ping_no_server_is_unreachable() {
    let resolver = VolumeResolver::new(
        "http://127.0.0.1:1",
        Duration::from_millis(200),
        Arc::new(VolumeCache::new()),
    );
    assert!(matches!(
        resolver.ping().await,
        Err(CdnError::MasterUnreachable(_))
    ));
}

#[tokio::test]
async fn test_cache_ttl_forces_fresh_lookup() {
    let lookups = Arc::new(AtomicUsize::new(0));
    let addr = fixture_master(Arc::clone(&lookups)).await;

    let cache = Arc::new(VolumeCache::with_ttl(Some(Duration::from_millis(50))));
    let resolver = VolumeResolver::new(&format!("http://{}", addr), LOOKUP_TIMEOUT, cache);

    resolver.resolve("7").await.unwrap();
    assert_eq!(lookups.load(Ordering::SeqCst), 1);

    tokio::time::sleep(Duration::from_millis(100)).await;
    resolver.resolve("7").await.unwrap();
    assert_eq!(lookups.load(Ordering::SeqCst), 2);
}
