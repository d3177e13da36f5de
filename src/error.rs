//! Error types for the CDN origin.
//!
//! All fallible operations in this crate return [`Result`], built on the
//! unified [`CdnError`] enum. The variants distinguish the failure modes a
//! caller may want to treat differently:
//!
//! - **InvalidVolumeId / InvalidFileId**: the request itself is malformed,
//!   never worth retrying.
//! - **LookupFailed**: the master could not be reached or answered with a
//!   non-success status.
//! - **LookupMalformed**: the master answered 200 but the body did not match
//!   the lookup schema, or listed no usable replicas. Kept separate from
//!   `LookupFailed` so protocol drift is diagnosable in logs.
//! - **FetchFailed / FetchStream**: the volume server could not be reached,
//!   or the body could not be written out to the destination.

use std::io;
use thiserror::Error;

/// Main error type for CDN origin operations.
#[derive(Error, Debug)]
pub enum CdnError {
    // Request errors
    #[error("invalid volume id: {0:?}")]
    InvalidVolumeId(String),

    #[error("invalid file id: {0:?}")]
    InvalidFileId(String),

    // Master lookup errors
    #[error("volume lookup failed for volume {volume}: {reason}")]
    LookupFailed { volume: u32, reason: String },

    #[error("malformed lookup response for volume {volume}: {reason}")]
    LookupMalformed { volume: u32, reason: String },

    #[error("master unreachable: {0}")]
    MasterUnreachable(String),

    // Volume server fetch errors
    #[error("fetch failed: {0}")]
    FetchFailed(String),

    #[error("failed to stream response body: {0}")]
    FetchStream(String),

    // Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid configuration: {field}: {reason}")]
    InvalidConfig { field: String, reason: String },

    // External errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl CdnError {
    /// Check if the error may succeed on a retry. A retried fetch re-resolves
    /// the volume and lands on the next replica in rotation. Both lookup
    /// failure modes are retryable: callers handle them the same way, and a
    /// master that answered garbage or an empty replica list may answer
    /// usably once the cluster settles.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CdnError::LookupFailed { .. }
                | CdnError::LookupMalformed { .. }
                | CdnError::MasterUnreachable(_)
                | CdnError::FetchFailed(_)
        )
    }

    /// HTTP status code this error maps to at the relay surface.
    pub fn http_status(&self) -> u16 {
        match self {
            CdnError::InvalidVolumeId(_) | CdnError::InvalidFileId(_) => 400,
            CdnError::LookupFailed { .. }
            | CdnError::LookupMalformed { .. }
            | CdnError::MasterUnreachable(_)
            | CdnError::FetchFailed(_) => 502,
            _ => 500,
        }
    }
}

impl From<serde_json::Error> for CdnError {
    fn from(e: serde_json::Error) -> Self {
        CdnError::Internal(e.to_string())
    }
}

/// Result type alias for CDN origin operations.
pub type Result<T> = std::result::Result<T, CdnError>;
