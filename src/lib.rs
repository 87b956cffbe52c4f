//! AdShield library.
//!
//! Wires the component crates into one [`ShieldEngine`] and exposes the
//! pieces the CLI and integration tests compose.

pub mod config;
pub mod engine;

pub use config::AppConfig;
pub use engine::ShieldEngine;
