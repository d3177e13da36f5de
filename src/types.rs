//! Core types shared across the CDN origin.
//!
//! The central identifier is [`VolumeId`], the integer id of a SeaweedFS
//! volume. File identifiers handed to the origin are composite strings of
//! the form `"<volumeId>,<fileKey>"`; only the leading segment is ever
//! interpreted, everything after the first comma is opaque.

use crate::error::{CdnError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a volume in the SeaweedFS cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VolumeId(pub u32);

impl VolumeId {
    /// Parse a volume id from its decimal string form.
    ///
    /// Anything that does not parse as an unsigned 32-bit integer (including
    /// negative numbers) is rejected as [`CdnError::InvalidVolumeId`].
    pub fn parse(s: &str) -> Result<Self> {
        s.parse::<u32>()
            .map(VolumeId)
            .map_err(|_| CdnError::InvalidVolumeId(s.to_string()))
    }
}

impl fmt::Display for VolumeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for VolumeId {
    type Err = CdnError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Return the volume-id segment of a composite file identifier.
///
/// The segment is everything before the first comma; a file identifier
/// without a comma is returned whole (it will fail volume-id parsing
/// downstream unless it happens to be a bare volume id).
pub fn volume_segment(fid: &str) -> &str {
    match fid.split_once(',') {
        Some((volume, _)) => volume,
        None => fid,
    }
}
