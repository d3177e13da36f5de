//! File fetching from SeaweedFS volume servers.
//!
//! [`ContentFetcher`] resolves the volume of a composite file id, issues the
//! GET against the chosen replica, and relays status, headers, and body back
//! to the caller. A single call talks to a single replica; callers that want
//! to retry simply call again, which re-resolves and rotates to the next
//! replica.

use crate::error::{CdnError, Result};
use crate::resolver::VolumeResolver;
use crate::types::volume_segment;
use metrics::counter;
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::warn;

/// Build the URL for fetching `fid` from a replica address.
///
/// Replica addresses from the master are usually bare `host:port`; a scheme
/// is prefixed when absent, and exactly one slash separates the address from
/// the file id.
fn fetch_url(address: &str, fid: &str, query: &str) -> String {
    let mut url = if address.starts_with("http://") || address.starts_with("https://") {
        address.to_string()
    } else {
        format!("http://{}", address)
    };
    if !url.ends_with('/') {
        url.push('/');
    }
    url.push_str(fid);
    if !query.is_empty() {
        url.push('?');
        url.push_str(query);
    }
    url
}

/// Fetches files from volume servers, one replica per call.
#[derive(Clone)]
pub struct ContentFetcher {
    resolver: VolumeResolver,
    client: Client,
}

impl ContentFetcher {
    /// Create a fetcher backed by the given resolver, with the given timeout
    /// for volume server requests.
    pub fn new(resolver: VolumeResolver, fetch_timeout: Duration) -> Self {
        let client = Client::builder()
            .connect_timeout(fetch_timeout)
            .timeout(fetch_timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { resolver, client }
    }

    /// The resolver backing this fetcher.
    pub fn resolver(&self) -> &VolumeResolver {
        &self.resolver
    }

    /// Fetch a file and stream its body into `writer`.
    ///
    /// `fid` is the composite `"<volumeId>,<fileKey>"` identifier. Caller
    /// headers are forwarded verbatim (conditional and range requests work
    /// unchanged). The body is streamed only for 200 and 206 responses; any
    /// other status passes through with its headers and no body write, for
    /// the caller to interpret. The returned pair is the replica's status
    /// and its unfiltered response headers.
    pub async fn get<W>(
        &self,
        writer: &mut W,
        fid: &str,
        headers: Option<&HeaderMap>,
        query: &str,
    ) -> Result<(StatusCode, HeaderMap)>
    where
        W: AsyncWrite + Unpin,
    {
        let address = self.resolver.resolve(volume_segment(fid)).await?;
        let url = fetch_url(&address, fid, query);

        let mut request = self.client.get(&url);
        if let Some(headers) = headers {
            request = request.headers(headers.clone());
        }

        let mut response = request.send().await.map_err(|e| {
            counter!("cdn_origin_fetch_errors_total").increment(1);
            warn!(url = %url, err = %e, "failed to retrieve file from volume server");
            CdnError::FetchFailed(e.to_string())
        })?;

        let status = response.status();
        let response_headers = response.headers().clone();

        if status == StatusCode::OK || status == StatusCode::PARTIAL_CONTENT {
            loop {
                let chunk = match response.chunk().await {
                    Ok(Some(chunk)) => chunk,
                    Ok(None) => break,
                    Err(e) => {
                        counter!("cdn_origin_fetch_errors_total").increment(1);
                        return Err(CdnError::FetchFailed(format!(
                            "body read interrupted: {}",
                            e
                        )));
                    }
                };
                writer
                    .write_all(&chunk)
                    .await
                    .map_err(|e| CdnError::FetchStream(e.to_string()))?;
            }
        }

        Ok((status, response_headers))
    }
}
