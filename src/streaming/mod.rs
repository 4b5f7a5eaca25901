//! Media streaming module.
//!
//! - [`direct`]: byte-range streaming of sandboxed local files
//! - [`hls`]: on-demand HLS renditions, one per video id
//! - [`thumbnails`]: on-demand single-frame thumbnails
//! - [`single_flight`]: per-key coalescing shared by both caches

pub mod direct;
pub mod hls;
pub mod single_flight;
pub mod thumbnails;

pub use direct::{parse_range_header, serve_file, serve_resolved, RangeRequest, ResolvedFile};
pub use hls::{validate_segment_name, HlsCacheManager, HlsRendition};
pub use single_flight::SingleFlight;
pub use thumbnails::ThumbnailCacheManager;
