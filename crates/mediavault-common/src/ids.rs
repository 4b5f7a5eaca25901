//! Media identifiers.
//!
//! The catalog keys every item by an integer id. [`MediaId`] wraps it so a raw
//! `i64` from a URL or a row cannot be confused with another number, and
//! [`MediaKind`] separates the audio and video tables of the catalog.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Catalog identifier of a media item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaId(i64);

impl MediaId {
    /// Wrap a raw catalog id.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// The raw integer value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for MediaId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<MediaId> for i64 {
    fn from(id: MediaId) -> Self {
        id.0
    }
}

impl std::fmt::Display for MediaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MediaId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Self)
    }
}

/// Whether a catalog entry is a music track or a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
}

impl MediaKind {
    /// Lowercase name as stored in the catalog.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "audio" | "music" => Ok(Self::Audio),
            "video" => Ok(Self::Video),
            other => Err(format!("unknown media kind: {other}")),
        }
    }
}
