//! hlsrelay - Transparent HLS rewriting relay
//!
//! This library crate exposes the core functionality for integration testing.

pub mod config;
pub mod error;
pub mod playlist;
pub mod server;
pub mod streaming;
