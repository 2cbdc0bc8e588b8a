//! Mock Alist store for integration tests
//!
//! Serves `fs/list`, `fs/get` and `/d/*` from an in-memory file tree that
//! tests can change between sync runs

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

/// In-memory Alist server
pub struct MockAlist {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockAlistState>,
}

#[derive(Default)]
struct MockAlistState {
    /// Absolute file path to body
    files: Mutex<BTreeMap<String, Vec<u8>>>,
    /// Directories whose listing answers with an Alist error code
    failing_dirs: Mutex<BTreeSet<String>>,
    /// Signature handed out by `fs/get` and required by `/d/*`
    sign: Mutex<Option<String>>,
    /// Answer every `fs/list` with HTTP 503
    listing_unavailable: AtomicBool,
    /// Delay before each `/d/*` body, in milliseconds
    download_delay_ms: AtomicU64,
    list_count: AtomicU32,
    get_count: AtomicU32,
    download_count: AtomicU32,
}

impl MockAlist {
    /// Start the mock server with an empty tree
    pub async fn start() -> anyhow::Result<Self> {
        let state = Arc::new(MockAlistState::default());

        let app = Router::new()
            .route("/api/fs/list", routing::post(handle_list))
            .route("/api/fs/get", routing::post(handle_get))
            .route("/d/{*path}", routing::get(handle_download))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL for `gallery.base_url`
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Add or replace a file; parent directories exist implicitly
    pub fn put_file(&self, path: &str, body: impl Into<Vec<u8>>) {
        self.state.files.lock().unwrap().insert(path.to_owned(), body.into());
    }

    /// Add a file of `size` filler bytes
    pub fn put_sized(&self, path: &str, size: usize) {
        self.put_file(path, vec![b'x'; size]);
    }

    pub fn remove_file(&self, path: &str) {
        self.state.files.lock().unwrap().remove(path);
    }

    /// Make listings of `dir` fail with an Alist error code
    pub fn fail_dir(&self, dir: &str) {
        self.state.failing_dirs.lock().unwrap().insert(dir.to_owned());
    }

    /// Require `?sign=<sign>` on downloads and hand it out from `fs/get`
    pub fn require_sign(&self, sign: &str) {
        *self.state.sign.lock().unwrap() = Some(sign.to_owned());
    }

    /// Answer every listing with HTTP 503
    pub fn set_listing_unavailable(&self, unavailable: bool) {
        self.state.listing_unavailable.store(unavailable, Ordering::Relaxed);
    }

    /// Slow down every download body
    pub fn set_download_delay(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.state.download_delay_ms.store(millis, Ordering::Relaxed);
    }

    /// Number of `fs/list` requests received
    pub fn list_count(&self) -> u32 {
        self.state.list_count.load(Ordering::Relaxed)
    }

    /// Number of `fs/get` requests received
    pub fn get_count(&self) -> u32 {
        self.state.get_count.load(Ordering::Relaxed)
    }

    /// Number of successful `/d/*` downloads served
    pub fn download_count(&self) -> u32 {
        self.state.download_count.load(Ordering::Relaxed)
    }
}

impl Drop for MockAlist {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[derive(Debug, Deserialize)]
struct ListRequest {
    path: String,
    #[allow(dead_code)]
    password: String,
    #[allow(dead_code)]
    page: u32,
    per_page: u32,
}

#[derive(Debug, Deserialize)]
struct GetRequest {
    path: String,
}

fn normalize_dir(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { "/".to_owned() } else { trimmed.to_owned() }
}

fn alist_error(code: u16, message: &str) -> Json<Value> {
    Json(json!({ "code": code, "message": message, "data": null }))
}

async fn handle_list(State(state): State<Arc<MockAlistState>>, Json(request): Json<ListRequest>) -> Response {
    state.list_count.fetch_add(1, Ordering::Relaxed);

    if state.listing_unavailable.load(Ordering::Relaxed) {
        return (StatusCode::SERVICE_UNAVAILABLE, "maintenance").into_response();
    }

    let dir = normalize_dir(&request.path);

    if state.failing_dirs.lock().unwrap().contains(&dir) {
        return alist_error(500, "failed to list").into_response();
    }

    let prefix = if dir == "/" { "/".to_owned() } else { format!("{dir}/") };

    let mut dirs = BTreeSet::new();
    let mut files = Vec::new();
    for (path, body) in state.files.lock().unwrap().iter() {
        let Some(rest) = path.strip_prefix(&prefix) else {
            continue;
        };
        match rest.split_once('/') {
            Some((child, _)) => {
                dirs.insert(child.to_owned());
            }
            None => files.push(json!({ "name": rest, "is_dir": false, "size": body.len() })),
        }
    }

    if dir != "/" && dirs.is_empty() && files.is_empty() {
        return alist_error(500, "object not found").into_response();
    }

    let mut content: Vec<Value> = dirs
        .into_iter()
        .map(|name| json!({ "name": name, "is_dir": true, "size": 0 }))
        .chain(files)
        .collect();

    let total = content.len();
    if request.per_page > 0 {
        content.truncate(request.per_page as usize);
    }

    Json(json!({
        "code": 200,
        "message": "success",
        "data": { "content": content, "total": total }
    }))
    .into_response()
}

async fn handle_get(State(state): State<Arc<MockAlistState>>, Json(request): Json<GetRequest>) -> Json<Value> {
    state.get_count.fetch_add(1, Ordering::Relaxed);

    let size = state.files.lock().unwrap().get(&request.path).map(Vec::len);
    let Some(size) = size else {
        return alist_error(500, "object not found");
    };

    let sign = state.sign.lock().unwrap().clone().unwrap_or_default();

    Json(json!({
        "code": 200,
        "message": "success",
        "data": {
            "name": request.path.rsplit('/').next(),
            "size": size,
            "is_dir": false,
            "raw_url": "",
            "sign": sign
        }
    }))
}

async fn handle_download(
    State(state): State<Arc<MockAlistState>>,
    Path(path): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let expected_sign = state.sign.lock().unwrap().clone();
    if let Some(expected) = expected_sign
        && query.get("sign") != Some(&expected)
    {
        return (StatusCode::FORBIDDEN, "sign mismatch").into_response();
    }

    let path = format!("/{path}");
    let body = state.files.lock().unwrap().get(&path).cloned();
    let Some(body) = body else {
        return (StatusCode::NOT_FOUND, "not found").into_response();
    };

    let delay = state.download_delay_ms.load(Ordering::Relaxed);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    state.download_count.fetch_add(1, Ordering::Relaxed);

    let content_type = match path.rsplit_once('.').map(|(_, ext)| ext) {
        Some("png") => Some("image/png"),
        Some("jpg" | "jpeg") => Some("image/jpeg"),
        Some("gif") => Some("image/gif"),
        _ => None,
    };

    match content_type {
        Some(content_type) => ([(header::CONTENT_TYPE, content_type)], Body::from(body)).into_response(),
        None => Body::from(body).into_response(),
    }
}
