//! Mediavault - media resolution and adaptive streaming engine
//!
//! This library crate exposes the core functionality for integration testing.

pub mod config;
pub mod locator;
pub mod playback;
pub mod sandbox;
pub mod server;
pub mod streaming;
