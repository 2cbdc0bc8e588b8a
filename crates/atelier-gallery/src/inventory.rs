use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{GalleryError, Result};

/// A file present in the local mirror
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFileRecord {
    /// `/`-separated path below the mirror root
    pub relative_path: String,
    pub size: u64,
    pub absolute_path: PathBuf,
}

/// Inventory the mirror without blocking the runtime
pub async fn scan(root: PathBuf) -> Result<Vec<LocalFileRecord>> {
    tokio::task::spawn_blocking(move || scan_mirror(&root))
        .await
        .map_err(|e| GalleryError::Internal(Some(format!("mirror scan task failed: {e}"))))?
}

/// Every regular file below `root`
///
/// A missing root is created and yields an empty inventory. Errors on the
/// root itself fail the scan; errors deeper in the tree skip that entry.
pub fn scan_mirror(root: &Path) -> Result<Vec<LocalFileRecord>> {
    std::fs::create_dir_all(root).map_err(|e| GalleryError::io(root, e))?;
    std::fs::read_dir(root).map_err(|e| GalleryError::io(root, e))?;

    let mut records = Vec::new();

    for entry in WalkDir::new(root).min_depth(1).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable mirror entry");
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let Some(relative_path) = relative_key(root, entry.path()) else {
            tracing::warn!(path = %entry.path().display(), "skipping mirror entry with non UTF-8 path");
            continue;
        };

        let size = match entry.metadata() {
            Ok(metadata) => metadata.len(),
            Err(e) => {
                tracing::warn!(path = %entry.path().display(), error = %e, "failed to stat mirror entry, skipping");
                continue;
            }
        };

        records.push(LocalFileRecord {
            relative_path,
            size,
            absolute_path: entry.into_path(),
        });
    }

    Ok(records)
}

/// `/`-joined components of `path` below `root`
pub(crate) fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;

    Some(parts.join("/"))
}
