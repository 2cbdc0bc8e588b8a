use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use atelier_config::GalleryConfig;
use atelier_telemetry::SyncMetrics;
use axum::response::Response;

use crate::alist::AlistClient;
use crate::error::{GalleryError, Result};
use crate::lister::ImageFilter;
use crate::local::{self, LocalFolder};
use crate::proxy;
use crate::status::SyncStatus;
use crate::sync::{GallerySync, SyncOptions, TriggerOutcome};
use crate::types::RemoteStatus;

/// Gallery service: sync job, local mirror and remote proxy
pub struct Gallery {
    client: AlistClient,
    sync: GallerySync,
    files_path: String,
}

impl Gallery {
    pub fn trigger_sync(&self) -> TriggerOutcome {
        self.sync.trigger()
    }

    pub fn sync_status(&self) -> SyncStatus {
        self.sync.status()
    }

    /// Background sync job, for callers that need to await a run
    pub const fn sync(&self) -> &GallerySync {
        &self.sync
    }

    pub fn mirror_dir(&self) -> &Path {
        &self.sync.options().mirror_dir
    }

    pub fn files_path(&self) -> &str {
        &self.files_path
    }

    pub async fn local_folders(&self) -> Result<Vec<LocalFolder>> {
        let options = self.sync.options();
        local::list_local(options.mirror_dir.clone(), &options.filter, &self.files_path).await
    }

    pub async fn list_remote(&self, path: &str) -> Result<serde_json::Value> {
        proxy::list(&self.client, path).await
    }

    pub async fn image(&self, path: &str) -> Result<Response> {
        proxy::image(&self.client, path).await
    }

    pub async fn download(&self, path: &str) -> Result<Response> {
        proxy::download(&self.client, path).await
    }

    pub async fn remote_status(&self) -> RemoteStatus {
        proxy::status(&self.client).await
    }
}

/// Builder for constructing the gallery service from configuration
pub struct GalleryBuilder<'a> {
    config: &'a GalleryConfig,
}

impl<'a> GalleryBuilder<'a> {
    pub const fn new(config: &'a GalleryConfig) -> Self {
        Self { config }
    }

    pub fn build(self) -> Result<Gallery> {
        let config = self.config;

        let client = AlistClient::new(
            config.base_url.clone(),
            config.password.clone(),
            parse_duration("list_timeout", &config.list_timeout)?,
            parse_duration("fetch_timeout", &config.fetch_timeout)?,
        )?;

        let options = SyncOptions {
            root_path: config.root_path.clone(),
            mirror_dir: config.mirror_dir.clone(),
            filter: ImageFilter::new(&config.image_extensions),
            max_depth: config.max_depth,
        };

        tracing::debug!(
            base_url = %client.base_url(),
            root = %options.root_path,
            mirror = %options.mirror_dir.display(),
            "gallery initialized"
        );

        let sync = GallerySync::new(Arc::new(client.clone()), options, SyncMetrics::global());

        Ok(Gallery {
            client,
            sync,
            files_path: config.files_path.clone(),
        })
    }
}

fn parse_duration(field: &str, value: &str) -> Result<Duration> {
    duration_str::parse(value).map_err(|e| GalleryError::Config(format!("invalid gallery.{field} '{value}': {e}")))
}
