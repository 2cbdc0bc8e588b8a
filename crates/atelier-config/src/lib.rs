#![allow(clippy::must_use_candidate)]

pub mod cors;
mod env;
pub mod gallery;
pub mod health;
mod loader;
pub mod server;
pub mod telemetry;

use serde::Deserialize;

pub use cors::*;
pub use gallery::*;
pub use health::*;
pub use server::*;
pub use telemetry::{LogFormat, TelemetryConfig};

/// Top-level Atelier configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Remote store and local mirror configuration
    pub gallery: GalleryConfig,
    /// Telemetry configuration
    #[serde(default)]
    pub telemetry: Option<TelemetryConfig>,
}
