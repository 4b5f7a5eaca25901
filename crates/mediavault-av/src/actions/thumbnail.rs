//! Single-frame JPEG extraction.

use std::path::Path;
use std::time::Duration;

use crate::gateway::{EncodeJob, EncodeTarget};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailSettings {
    /// Seek position, in ffmpeg time syntax.
    pub seek: String,
    pub timeout: Duration,
}

impl Default for ThumbnailSettings {
    fn default() -> Self {
        Self {
            seek: "00:00:05".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

/// Build the ffmpeg job that grabs one frame of `source` into `target`.
pub fn thumbnail_job(
    ffmpeg: &Path,
    source: &Path,
    target: &Path,
    settings: &ThumbnailSettings,
) -> EncodeJob {
    let mut job = EncodeJob::new(
        "ffmpeg",
        ffmpeg.to_path_buf(),
        EncodeTarget::Thumbnail(target.to_path_buf()),
    );
    job.timeout(settings.timeout);
    job.args(["-y", "-ss", settings.seek.as_str(), "-i"]);
    job.arg(source.to_string_lossy());
    job.args(["-frames:v", "1", "-q:v", "2"]);
    job.arg(target.to_string_lossy());
    job
}
