//! Database query modules.
//!
//! - media: catalog entry creation and lookup

pub mod media;
