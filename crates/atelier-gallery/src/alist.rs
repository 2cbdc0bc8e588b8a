use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use url::Url;

use crate::error::{GalleryError, Result};
use crate::remote::{ByteStream, RemoteEntry, RemoteStore};

/// Timeout of the connectivity probe behind the status endpoint
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Alist success code inside the JSON envelope
const ALIST_OK: i64 = 200;

/// HTTP client for an Alist-compatible file store
///
/// All calls share one connection pool.
#[derive(Clone)]
pub struct AlistClient {
    http: Client,
    base_url: Url,
    password: SecretString,
    list_timeout: Duration,
    fetch_timeout: Duration,
}

#[derive(Serialize)]
struct ListBody<'a> {
    path: &'a str,
    password: &'a str,
    page: u32,
    per_page: u32,
}

#[derive(Serialize)]
struct GetBody<'a> {
    path: &'a str,
    password: &'a str,
}

/// `{code, message, data}` wrapper around every Alist API answer
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    code: i64,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ListData {
    #[serde(default)]
    content: Option<Vec<AlistObject>>,
}

#[derive(Debug, Deserialize)]
struct AlistObject {
    name: String,
    #[serde(default)]
    is_dir: bool,
    #[serde(default)]
    size: u64,
}

#[derive(Debug, Deserialize)]
struct GetData {
    #[serde(default)]
    raw_url: Option<String>,
    #[serde(default)]
    sign: Option<String>,
}

impl AlistClient {
    /// Create a client for the store at `base_url`
    pub fn new(base_url: Url, password: SecretString, list_timeout: Duration, fetch_timeout: Duration) -> Result<Self> {
        let mut headers = http::HeaderMap::new();
        headers.insert(http::header::CONNECTION, http::HeaderValue::from_static("keep-alive"));

        let http = Client::builder()
            .pool_idle_timeout(Some(Duration::from_secs(30)))
            .tcp_nodelay(true)
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .default_headers(headers)
            .build()
            .map_err(|e| GalleryError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: with_trailing_slash(base_url),
            password,
            list_timeout,
            fetch_timeout,
        })
    }

    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Raw `fs/list` answer for `path`, passed through untouched
    ///
    /// `per_page = 0` asks Alist for every entry.
    pub async fn list_raw(&self, path: &str, per_page: u32) -> Result<serde_json::Value> {
        self.list_raw_with_timeout(path, per_page, self.list_timeout).await
    }

    /// Check that the store answers a one-entry listing of `/`
    pub async fn probe(&self) -> Result<()> {
        self.list_raw_with_timeout("/", 1, PROBE_TIMEOUT).await.map(drop)
    }

    async fn list_raw_with_timeout(&self, path: &str, per_page: u32, timeout: Duration) -> Result<serde_json::Value> {
        let body = ListBody {
            path,
            password: self.password.expose_secret(),
            page: 1,
            per_page,
        };

        self.post_json(&self.api_url("api/fs/list")?, &body, timeout).await
    }

    /// Children of a remote directory
    ///
    /// A null or missing `content` is an empty directory.
    pub async fn list_dir(&self, path: &str) -> Result<Vec<RemoteEntry>> {
        let value = self.list_raw(path, 0).await?;
        let data: Option<ListData> = unwrap_envelope(value)?;

        let entries = data
            .and_then(|d| d.content)
            .unwrap_or_default()
            .into_iter()
            .map(|object| RemoteEntry {
                name: object.name,
                is_dir: object.is_dir,
                size: object.size,
            })
            .collect();

        Ok(entries)
    }

    /// Resolve the URL a file can be fetched from
    ///
    /// Uses `raw_url` from `fs/get` when present, otherwise `<base>/d<path>`
    /// signed with `sign` when the store returned one.
    pub async fn resolve_url(&self, path: &str) -> Result<Url> {
        let body = GetBody {
            path,
            password: self.password.expose_secret(),
        };

        let value = self.post_json(&self.api_url("api/fs/get")?, &body, self.list_timeout).await?;
        let data: Option<GetData> = unwrap_envelope(value)?;
        let data = data.ok_or_else(|| GalleryError::MalformedResponse(format!("fs/get for '{path}' returned no data")))?;

        match data.raw_url.filter(|u| !u.is_empty()) {
            Some(raw_url) => {
                Url::parse(&raw_url).map_err(|e| GalleryError::MalformedResponse(format!("invalid raw_url '{raw_url}': {e}")))
            }
            None => Ok(self.direct_url(path, data.sign.as_deref())),
        }
    }

    /// `<base>/d<path>`, with `?sign=` when a non-empty signature is given
    pub fn direct_url(&self, path: &str, sign: Option<&str>) -> Url {
        let mut url = self.base_url.clone();

        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("d");
            segments.extend(path.split('/').filter(|s| !s.is_empty()));
        }

        if let Some(sign) = sign.filter(|s| !s.is_empty()) {
            url.query_pairs_mut().append_pair("sign", sign);
        }

        url
    }

    /// Resolve a download URL, falling back to the unsigned direct link
    pub async fn download_url(&self, path: &str) -> Url {
        match self.resolve_url(path).await {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(path, error = %e, "fs/get failed, using unsigned direct link");
                self.direct_url(path, None)
            }
        }
    }

    /// GET a file; non-success statuses are errors
    pub async fn fetch(&self, url: &Url) -> Result<reqwest::Response> {
        let response = self
            .http
            .get(url.as_str())
            .timeout(self.fetch_timeout)
            .send()
            .await
            .map_err(|e| GalleryError::Connection(format!("failed to fetch {url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GalleryError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    fn api_url(&self, endpoint: &str) -> Result<Url> {
        self.base_url
            .join(endpoint)
            .map_err(|e| GalleryError::Config(format!("invalid API URL for '{endpoint}': {e}")))
    }

    async fn post_json<B: Serialize + Sync>(&self, url: &Url, body: &B, timeout: Duration) -> Result<serde_json::Value> {
        let response = self
            .http
            .post(url.as_str())
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| GalleryError::Connection(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GalleryError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| GalleryError::MalformedResponse(format!("invalid JSON from {url}: {e}")))
    }
}

#[async_trait]
impl RemoteStore for AlistClient {
    async fn list(&self, path: &str) -> Result<Vec<RemoteEntry>> {
        self.list_dir(path).await
    }

    async fn open(&self, path: &str) -> Result<ByteStream> {
        let url = self.download_url(path).await;
        let response = self.fetch(&url).await?;

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| GalleryError::Connection(format!("download interrupted: {e}"))))
            .boxed())
    }
}

fn unwrap_envelope<T: DeserializeOwned>(value: serde_json::Value) -> Result<Option<T>> {
    let envelope: Envelope<T> =
        serde_json::from_value(value).map_err(|e| GalleryError::MalformedResponse(e.to_string()))?;

    if envelope.code != ALIST_OK {
        return Err(GalleryError::Upstream {
            status: u16::try_from(envelope.code).unwrap_or(502),
            message: envelope.message,
        });
    }

    Ok(envelope.data)
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
