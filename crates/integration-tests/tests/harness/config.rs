//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;
use std::path::Path;

use atelier_config::{Config, CorsConfig, GalleryConfig, HealthConfig, ServerConfig};

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Minimal configuration mirroring `base_url` into `mirror_dir`
    pub fn new(base_url: &str, mirror_dir: &Path) -> Self {
        let mut gallery = GalleryConfig::new(base_url.parse().expect("valid URL"));
        gallery.mirror_dir = mirror_dir.to_path_buf();
        gallery.list_timeout = "2s".to_owned();
        gallery.fetch_timeout = "5s".to_owned();

        Self {
            config: Config {
                server: ServerConfig {
                    listen_address: Some(SocketAddr::from(([127, 0, 0, 1], 0))),
                    health: HealthConfig::default(),
                    cors: None,
                },
                gallery,
                telemetry: None,
            },
        }
    }

    /// Mirror only the remote subtree at `root_path`
    pub fn with_root_path(mut self, root_path: &str) -> Self {
        self.config.gallery.root_path = root_path.to_owned();
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.config.gallery.max_depth = max_depth;
        self
    }

    /// Set CORS configuration
    pub fn with_cors(mut self, config: CorsConfig) -> Self {
        self.config.server.cors = Some(config);
        self
    }

    /// Disable health endpoint
    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config.validate().expect("valid test config");
        self.config
    }
}
