use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;

/// Chunked body of a remote file
pub type ByteStream = BoxStream<'static, crate::Result<Bytes>>;

/// One entry of a remote directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
}

impl RemoteEntry {
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
            size,
        }
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
            size: 0,
        }
    }
}

/// Read-only view of the hierarchical store being mirrored
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// List the direct children of a remote directory
    async fn list(&self, path: &str) -> crate::Result<Vec<RemoteEntry>>;

    /// Open a remote file for streaming
    async fn open(&self, path: &str) -> crate::Result<ByteStream>;
}
