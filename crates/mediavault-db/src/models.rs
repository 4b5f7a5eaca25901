//! Rust models matching the catalog schema.

use chrono::{DateTime, Utc};
use mediavault_common::{MediaId, MediaKind};
use serde::{Deserialize, Serialize};

/// A catalog entry: a music track or a video and its opaque locator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaRecord {
    pub id: MediaId,
    pub kind: MediaKind,
    pub title: String,
    /// YouTube URL, remote URL, or a path relative to the sandbox root.
    pub locator: String,
    /// Stored thumbnail, passed through for remote entries.
    pub thumbnail_url: Option<String>,
    pub created_at: DateTime<Utc>,
}
