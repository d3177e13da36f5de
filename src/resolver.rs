//! Volume location resolution against the SeaweedFS master.
//!
//! [`VolumeResolver`] turns a volume id into a concrete replica address. The
//! shared [`VolumeCache`] answers warm lookups; a cold lookup asks the master
//! via `GET /dir/lookup?volumeId=<id>`, caches the reported `publicUrl`s, and
//! dispenses the first address. Round-robin advances on every resolution,
//! hits included, so load spreads across replicas from the first request.
//!
//! The cache lock is only ever taken for the in-memory map operations; a
//! blocked master lookup for one volume never delays resolution of an
//! already-cached one.

use crate::cache::VolumeCache;
use crate::error::{CdnError, Result};
use crate::types::VolumeId;
use metrics::counter;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// A volume lookup response from the SeaweedFS master.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupResponse {
    #[allow(dead_code)]
    volume_id: String,
    #[serde(default)]
    locations: Vec<Location>,
}

/// One replica location in a lookup response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Location {
    #[allow(dead_code)]
    url: String,
    /// The externally reachable address; this is the field the origin uses.
    public_url: String,
}

impl LookupResponse {
    fn public_urls(self) -> Vec<String> {
        self.locations.into_iter().map(|l| l.public_url).collect()
    }
}

/// Resolves volume ids to replica addresses, caching master responses.
#[derive(Clone)]
pub struct VolumeResolver {
    master_url: String,
    client: Client,
    cache: Arc<VolumeCache>,
}

impl VolumeResolver {
    /// Create a resolver for the given master, with the given lookup timeout
    /// and a shared location cache.
    pub fn new(master_url: &str, lookup_timeout: Duration, cache: Arc<VolumeCache>) -> Self {
        let client = Client::builder()
            .connect_timeout(lookup_timeout)
            .timeout(lookup_timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            master_url: master_url.trim_end_matches('/').to_string(),
            client,
            cache,
        }
    }

    /// The shared location cache.
    pub fn cache(&self) -> &VolumeCache {
        &self.cache
    }

    /// Resolve a volume id string to a replica address.
    ///
    /// A malformed id fails immediately with [`CdnError::InvalidVolumeId`]
    /// and no network traffic. A cache hit returns the next address in
    /// rotation. A miss consults the master, populates the cache, and returns
    /// the first dispensed address. No retries happen here; a caller that
    /// retries naturally lands on the next replica.
    pub async fn resolve(&self, volume: &str) -> Result<String> {
        let id = VolumeId::parse(volume)?;

        if let Some(address) = self.cache.next(id) {
            counter!("cdn_origin_cache_hits_total").increment(1);
            return Ok(address);
        }
        counter!("cdn_origin_cache_misses_total").increment(1);

        let addresses = self.lookup(id).await?;
        self.cache.insert(id, addresses);
        self.cache
            .next(id)
            .ok_or_else(|| CdnError::Internal(format!("cache entry for volume {} vanished", id)))
    }

    /// Look up the replica addresses for a volume from the master.
    async fn lookup(&self, id: VolumeId) -> Result<Vec<String>> {
        let lookup_url = format!("{}/dir/lookup?volumeId={}", self.master_url, id);
        debug!(volume = %id, url = %lookup_url, "looking up volume from master");
        counter!("cdn_origin_volume_lookups_total").increment(1);

        let response = self.client.get(&lookup_url).send().await.map_err(|e| {
            error!(volume = %id, url = %lookup_url, err = %e, "failed to reach master for volume lookup");
            CdnError::LookupFailed {
                volume: id.0,
                reason: e.to_string(),
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(volume = %id, status = %status, "unexpected status from master lookup");
            return Err(CdnError::LookupFailed {
                volume: id.0,
                reason: format!("unexpected status {}", status),
            });
        }

        let body = response.bytes().await.map_err(|e| CdnError::LookupFailed {
            volume: id.0,
            reason: format!("failed to read lookup body: {}", e),
        })?;

        let parsed: LookupResponse = serde_json::from_slice(&body).map_err(|e| {
            error!(
                volume = %id,
                body = %String::from_utf8_lossy(&body),
                err = %e,
                "failed to parse lookup response from master"
            );
            CdnError::LookupMalformed {
                volume: id.0,
                reason: e.to_string(),
            }
        })?;

        let addresses = parsed.public_urls();
        if addresses.is_empty() {
            warn!(volume = %id, "master returned no replicas for volume");
            return Err(CdnError::LookupMalformed {
                volume: id.0,
                reason: "no replicas reported".to_string(),
            });
        }

        Ok(addresses)
    }

    /// Ping the master via its cluster status endpoint.
    ///
    /// Used at startup to fail fast when the cluster is unreachable.
    pub async fn ping(&self) -> Result<()> {
        let url = format!("{}/cluster/status", self.master_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CdnError::MasterUnreachable(e.to_string()))?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(CdnError::MasterUnreachable(format!(
                "expected 200 OK from cluster status, got {}",
                response.status()
            )));
        }
        Ok(())
    }
}
