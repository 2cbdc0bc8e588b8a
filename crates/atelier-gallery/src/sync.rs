use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use atelier_telemetry::SyncMetrics;
use serde::Serialize;
use tokio::sync::watch;
use tracing::Instrument;

use crate::diff;
use crate::error::{GalleryError, Result};
use crate::inventory;
use crate::lister::{self, ImageFilter};
use crate::reconcile;
use crate::remote::RemoteStore;
use crate::status::{SyncPermit, SyncState, SyncStatus};

/// Answer to a sync trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerOutcome {
    Started,
    AlreadySyncing,
}

/// What a run mirrors and where
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub root_path: String,
    pub mirror_dir: PathBuf,
    pub filter: ImageFilter,
    pub max_depth: usize,
}

/// Mirrors the remote image tree into the local cache, one run at a time
#[derive(Clone)]
pub struct GallerySync {
    store: Arc<dyn RemoteStore>,
    options: Arc<SyncOptions>,
    state: Arc<SyncState>,
    metrics: SyncMetrics,
}

impl GallerySync {
    pub fn new(store: Arc<dyn RemoteStore>, options: SyncOptions, metrics: SyncMetrics) -> Self {
        Self {
            store,
            options: Arc::new(options),
            state: Arc::new(SyncState::new()),
            metrics,
        }
    }

    /// Start a run in the background unless one is in progress
    ///
    /// Must be called from within a tokio runtime.
    pub fn trigger(&self) -> TriggerOutcome {
        let Some(permit) = self.state.try_begin() else {
            tracing::info!("sync requested while a run is in progress");
            return TriggerOutcome::AlreadySyncing;
        };

        let this = self.clone();
        let span = tracing::info_span!("gallery_sync", root = %self.options.root_path);
        tokio::spawn(async move { this.run(permit).await }.instrument(span));

        TriggerOutcome::Started
    }

    /// Run to completion on the current task
    ///
    /// Returns `None` when another run holds the guard.
    pub async fn sync_once(&self) -> Option<SyncStatus> {
        let permit = self.state.try_begin()?;
        self.run(permit).await;
        Some(self.state.snapshot())
    }

    pub fn status(&self) -> SyncStatus {
        self.state.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.state.subscribe()
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    async fn run(&self, permit: SyncPermit) {
        let start = Instant::now();
        tracing::info!("gallery sync started");

        match self.execute(&permit).await {
            Ok(()) => {
                let status = self.state.snapshot();
                tracing::info!(
                    total = status.total,
                    failed = status.failed,
                    elapsed_ms = start.elapsed().as_millis(),
                    "gallery sync complete"
                );
                self.metrics.record_run(start, true);
                permit.finish("sync complete");
            }
            Err(e) => {
                tracing::error!(error = %e, "gallery sync failed");
                self.metrics.record_run(start, false);
                permit.finish(format!("sync failed: {e}"));
            }
        }
    }

    async fn execute(&self, permit: &SyncPermit) -> Result<()> {
        let options = &*self.options;

        permit.set_message("listing remote files");
        let listing = lister::list_remote(self.store.as_ref(), &options.root_path, &options.filter, options.max_depth).await;

        // An unlistable root would otherwise plan the deletion of the whole mirror
        if listing.root_unreachable() {
            return Err(GalleryError::Connection(format!(
                "remote root '{}' could not be listed",
                options.root_path
            )));
        }

        permit.set_message("scanning local cache");
        let local = inventory::scan(options.mirror_dir.clone()).await?;

        let sync_plan = diff::plan(listing.files, local, &listing.unreachable);
        tracing::info!(
            download = sync_plan.to_download.len(),
            delete = sync_plan.to_delete.len(),
            unreachable = listing.unreachable.len(),
            "sync plan ready"
        );
        permit.set_plan(sync_plan.total());

        for record in &sync_plan.to_delete {
            let success = match reconcile::delete_local(record).await {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(path = %record.relative_path, error = %e, "failed to delete local file");
                    false
                }
            };
            self.metrics.record_operation("delete", success);
            permit.record(format!("deleted {}", record.relative_path), success);
        }

        // Clears directories that stand where a remote file now lives
        if !sync_plan.to_delete.is_empty() {
            reconcile::prune_empty_dirs(options.mirror_dir.clone()).await;
        }

        for record in &sync_plan.to_download {
            let success = match reconcile::download(self.store.as_ref(), &options.mirror_dir, record).await {
                Ok(_) => true,
                Err(e) => {
                    tracing::warn!(path = %record.relative_path, error = %e, "failed to download remote file");
                    false
                }
            };
            self.metrics.record_operation("download", success);
            permit.record(format!("downloaded {}", record.relative_path), success);
        }

        Ok(())
    }
}
