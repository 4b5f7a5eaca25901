//! Mediavault-DB: the media catalog
//!
//! The streaming engine only reads the catalog: given a media id it needs the
//! stored locator and whether the entry is audio or video. Writes exist for
//! the CLI and for tests.
//!
//! # Modules
//!
//! - `migrations` - Embedded, versioned schema migrations
//! - `pool` - r2d2 connection pool management
//! - `models` - Rust models matching the database schema
//! - `queries` - Catalog query operations
//!
//! # Example
//!
//! ```
//! use mediavault_common::MediaKind;
//! use mediavault_db::pool::{init_memory_pool, get_conn};
//! use mediavault_db::queries::media;
//!
//! let pool = init_memory_pool().unwrap();
//! let conn = get_conn(&pool).unwrap();
//!
//! let record = media::create_media(&conn, MediaKind::Video, "Clip", "clip.mp4", None).unwrap();
//! let found = media::get_media(&conn, record.id).unwrap().unwrap();
//! assert_eq!(found.locator, "clip.mp4");
//! ```

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;

pub use models::MediaRecord;
pub use pool::{get_conn, init_memory_pool, init_pool, DbPool, PooledConnection};
