//! HLS transcode of a source video into one H.264 + AAC rendition.

use std::path::Path;
use std::time::Duration;

use crate::gateway::{EncodeJob, EncodeTarget};

/// File name of the playlist inside a rendition directory.
pub const PLAYLIST_NAME: &str = "output.m3u8";

/// ffmpeg segment file name pattern inside a rendition directory.
pub const SEGMENT_PATTERN: &str = "output%d.ts";

/// Fixed transcode parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HlsSettings {
    /// Target segment duration in seconds.
    pub segment_seconds: u32,
    /// x264 constant rate factor.
    pub crf: u8,
    /// x264 preset.
    pub preset: String,
    /// Audio codec for the rendition.
    pub audio_codec: String,
    pub timeout: Duration,
}

impl Default for HlsSettings {
    fn default() -> Self {
        Self {
            segment_seconds: 10,
            crf: 23,
            preset: "veryfast".to_string(),
            audio_codec: "aac".to_string(),
            timeout: Duration::from_secs(3600),
        }
    }
}

/// Build the ffmpeg job that writes `output.m3u8` and its segments into
/// `output_dir`.
///
/// Audio is mapped optionally so silent sources still encode.
pub fn hls_transcode_job(
    ffmpeg: &Path,
    source: &Path,
    output_dir: &Path,
    settings: &HlsSettings,
) -> EncodeJob {
    let playlist = output_dir.join(PLAYLIST_NAME);
    let segments = output_dir.join(SEGMENT_PATTERN);

    let mut job = EncodeJob::new(
        "ffmpeg",
        ffmpeg.to_path_buf(),
        EncodeTarget::HlsPlaylist(playlist.clone()),
    );
    job.timeout(settings.timeout);
    job.args(["-y", "-i"]);
    job.arg(source.to_string_lossy());
    job.args(["-map", "0:v:0", "-map", "0:a:0?"]);
    job.args(["-c:v", "libx264", "-crf"]);
    job.arg(settings.crf.to_string());
    job.args(["-preset", settings.preset.as_str()]);
    job.args(["-c:a", settings.audio_codec.as_str()]);
    job.args(["-start_number", "0"]);
    job.args(["-hls_time", &settings.segment_seconds.to_string()]);
    job.args(["-hls_list_size", "0"]);
    job.args(["-hls_playlist_type", "vod"]);
    job.arg("-hls_segment_filename");
    job.arg(segments.to_string_lossy());
    job.args(["-f", "hls"]);
    job.arg(playlist.to_string_lossy());
    job
}
