//! Encoder job builders: HLS transcode and thumbnail extraction.

mod hls;
mod thumbnail;

pub use hls::{hls_transcode_job, HlsSettings, PLAYLIST_NAME, SEGMENT_PATTERN};
pub use thumbnail::{thumbnail_job, ThumbnailSettings};
