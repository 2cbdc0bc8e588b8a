#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod alist;
mod diff;
mod error;
mod inventory;
mod lister;
mod local;
mod proxy;
mod reconcile;
mod remote;
mod server;
mod status;
mod sync;
mod types;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    response::Response,
    routing::{get, post},
};
use tower_http::services::ServeDir;

pub use alist::AlistClient;
pub use diff::{SyncPlan, plan};
pub use error::{GalleryError, Result};
pub use inventory::{LocalFileRecord, scan_mirror};
pub use lister::{ImageFilter, RemoteFileRecord, RemoteListing, list_remote};
pub use local::{LocalFolder, file_url};
pub use remote::{ByteStream, RemoteEntry, RemoteStore};
pub use server::{Gallery, GalleryBuilder};
pub use status::{SyncState, SyncStatus};
pub use sync::{GallerySync, SyncOptions, TriggerOutcome};
pub use types::{AlistConnection, ListRequest, PathQuery, RemoteStatus, ServiceState, TriggerResponse};

/// Build the gallery service from configuration
pub fn build_server(config: &atelier_config::Config) -> anyhow::Result<Arc<Gallery>> {
    let gallery = Arc::new(
        GalleryBuilder::new(&config.gallery)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to initialize gallery: {e}"))?,
    );
    Ok(gallery)
}

/// Create the API router for the gallery
pub fn endpoint_router() -> Router<Arc<Gallery>> {
    Router::new()
        .route("/api/gallery/sync", post(trigger_sync))
        .route("/api/gallery/sync/status", get(sync_status))
        .route("/api/gallery/local", get(local_folders))
        .route("/api/gallery/list", post(list_remote_dir))
        .route("/api/gallery/image", get(image))
        .route("/api/gallery/download", get(download))
        .route("/api/gallery/status", get(remote_status))
}

/// Static file service for the local mirror, mounted at the configured files path
pub fn files_router(gallery: &Gallery) -> Router {
    Router::new().nest_service(gallery.files_path(), ServeDir::new(gallery.mirror_dir()))
}

async fn trigger_sync(State(gallery): State<Arc<Gallery>>) -> Json<TriggerResponse> {
    let status = gallery.trigger_sync();
    tracing::debug!(?status, "sync trigger handled");
    Json(TriggerResponse { status })
}

async fn sync_status(State(gallery): State<Arc<Gallery>>) -> Json<SyncStatus> {
    Json(gallery.sync_status())
}

async fn local_folders(State(gallery): State<Arc<Gallery>>) -> Result<Json<Vec<LocalFolder>>> {
    Ok(Json(gallery.local_folders().await?))
}

async fn list_remote_dir(
    State(gallery): State<Arc<Gallery>>,
    Json(request): Json<ListRequest>,
) -> Result<Json<serde_json::Value>> {
    tracing::debug!(path = %request.path, "gallery list handler called");
    Ok(Json(gallery.list_remote(&request.path).await?))
}

async fn image(State(gallery): State<Arc<Gallery>>, Query(query): Query<PathQuery>) -> Result<Response> {
    gallery.image(&query.path).await
}

async fn download(State(gallery): State<Arc<Gallery>>, Query(query): Query<PathQuery>) -> Result<Response> {
    gallery.download(&query.path).await
}

async fn remote_status(State(gallery): State<Arc<Gallery>>) -> Json<RemoteStatus> {
    Json(gallery.remote_status().await)
}
