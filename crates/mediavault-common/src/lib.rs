//! Mediavault-Common: Shared types, constants, and utilities.
//!
//! This crate provides common functionality used across mediavault:
//!
//! - **Media IDs**: The catalog's integer media id and the audio/video kind
//! - **Playback Types**: The descriptor handed back to clients for a locator
//! - **MIME Validation**: Extension to content-type mapping and allow-lists
//! - **Error Handling**: The unified error type and its stable error kinds
//!
//! # Examples
//!
//! ```
//! use mediavault_common::{Error, ErrorKind, MediaId, MediaKind, Result};
//! use mediavault_common::mime::{mime_for_path, is_supported};
//! use std::path::Path;
//!
//! let id = MediaId::new(42);
//! assert_eq!(id.to_string(), "42");
//!
//! let mime = mime_for_path(Path::new("clip.mp4"));
//! assert!(is_supported(MediaKind::Video, mime));
//!
//! fn example() -> Result<()> {
//!     Err(Error::not_found("video", 7))
//! }
//! assert_eq!(example().unwrap_err().kind(), ErrorKind::NotFound);
//! ```

pub mod error;
pub mod ids;
pub mod mime;
pub mod types;

pub use error::{Error, ErrorKind, Result};
pub use ids::*;
pub use types::*;
