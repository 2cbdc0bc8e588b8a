//! Pass-through access to the remote store for the gallery front-end

use axum::body::Body;
use axum::response::{IntoResponse, Response};
use http::{HeaderValue, header};

use crate::alist::AlistClient;
use crate::error::{GalleryError, Result};
use crate::types::{AlistConnection, RemoteStatus, ServiceState};

const IMAGE_CACHE_CONTROL: &str = "public, max-age=31536000";
const DEFAULT_IMAGE_TYPE: &str = "image/jpeg";
const DEFAULT_DOWNLOAD_TYPE: &str = "application/octet-stream";

/// Upstream listing JSON for `path`, untouched
pub async fn list(client: &AlistClient, path: &str) -> Result<serde_json::Value> {
    client.list_raw(path, 0).await
}

/// Stream a remote image with long-lived caching headers
pub async fn image(client: &AlistClient, path: &str) -> Result<Response> {
    let upstream = fetch_direct(client, path).await?;
    let content_type = content_type(&upstream, DEFAULT_IMAGE_TYPE);

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, HeaderValue::from_static(IMAGE_CACHE_CONTROL)),
        ],
        Body::from_stream(upstream.bytes_stream()),
    )
        .into_response())
}

/// Stream a remote file as an attachment named after its basename
pub async fn download(client: &AlistClient, path: &str) -> Result<Response> {
    let upstream = fetch_direct(client, path).await?;
    let content_type = content_type(&upstream, DEFAULT_DOWNLOAD_TYPE);
    let disposition = attachment(basename(path))?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from_stream(upstream.bytes_stream()),
    )
        .into_response())
}

/// Probe the store with a one-entry listing of `/`
pub async fn status(client: &AlistClient) -> RemoteStatus {
    match client.probe().await {
        Ok(()) => RemoteStatus::new(ServiceState::Ok, AlistConnection::Connected, "gallery service is running"),
        Err(GalleryError::Upstream { status, .. }) => RemoteStatus::new(
            ServiceState::Warning,
            AlistConnection::Error,
            format!("Alist API returned error: {status}"),
        ),
        Err(e @ GalleryError::MalformedResponse(_)) => {
            RemoteStatus::new(ServiceState::Warning, AlistConnection::Error, e.to_string())
        }
        Err(e) => RemoteStatus::new(
            ServiceState::Error,
            AlistConnection::Disconnected,
            format!("cannot reach Alist API: {e}"),
        ),
    }
}

async fn fetch_direct(client: &AlistClient, path: &str) -> Result<reqwest::Response> {
    if path.trim_matches('/').is_empty() {
        return Err(GalleryError::InvalidRequest("path must name a file".to_string()));
    }

    client.fetch(&client.direct_url(path, None)).await
}

fn content_type(response: &reqwest::Response, default: &'static str) -> HeaderValue {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(default))
}

fn basename(path: &str) -> &str {
    path.trim_end_matches('/').rsplit('/').next().unwrap_or(path)
}

/// `attachment` disposition with an ASCII fallback and an RFC 5987 UTF-8 name
fn attachment(filename: &str) -> Result<HeaderValue> {
    let fallback: String = filename
        .chars()
        .map(|c| if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' { c } else { '_' })
        .collect();

    let value = if fallback == filename {
        format!("attachment; filename=\"{filename}\"")
    } else {
        format!(
            "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
            urlencoding::encode(filename)
        )
    };

    HeaderValue::from_str(&value).map_err(|e| GalleryError::Internal(Some(format!("invalid filename header: {e}"))))
}
