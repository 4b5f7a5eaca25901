//! # mediavault-av
//!
//! External encoder plumbing for the mediavault streaming engine.
//!
//! This crate provides:
//!
//! - **Encoder gateway** ([`EncoderGateway`], [`ProcessGateway`]) -- run one
//!   external encoder invocation and report its exit status and diagnostics,
//!   with a hard timeout and a bound on concurrent encodes.
//! - **Tool discovery** ([`ToolRegistry`]) -- find and cache the path to
//!   ffmpeg, either from configuration or from `PATH`.
//! - **Job builders** ([`actions`]) -- the argument vectors for the HLS
//!   transcode and the single-frame thumbnail extraction.

pub mod actions;
pub mod gateway;
pub mod tools;

pub use actions::{hls_transcode_job, thumbnail_job, HlsSettings, ThumbnailSettings};
pub use gateway::{EncodeJob, EncodeOutput, EncodeTarget, EncoderGateway, ProcessGateway};
pub use tools::{ToolConfig, ToolInfo, ToolRegistry};
