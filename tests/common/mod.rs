//! Shared test helpers: in-process mock servers for the SeaweedFS master and
//! volume server protocols.

use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// Serve `app` on an ephemeral localhost port, returning its address.
pub async fn spawn_server(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Build a master lookup response body for the given replica addresses.
pub fn lookup_body(volume: &str, public_urls: &[&str]) -> String {
    let locations: Vec<String> = public_urls
        .iter()
        .enumerate()
        .map(|(i, url)| {
            format!(
                r#"{{"url":"10.0.0.{}:8080","publicUrl":"{}"}}"#,
                i + 1,
                url
            )
        })
        .collect();
    format!(
        r#"{{"volumeId":"{}","locations":[{}]}}"#,
        volume,
        locations.join(",")
    )
}
