use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;

use crate::error::{GalleryError, Result};
use crate::inventory::LocalFileRecord;
use crate::lister::{RemoteFileRecord, is_safe_name};
use crate::remote::RemoteStore;

/// Suffix of in-flight downloads
const PARTIAL_SUFFIX: &str = ".part";

/// Remove a mirrored file; a file that is already gone counts as removed
pub async fn delete_local(record: &LocalFileRecord) -> Result<()> {
    match tokio::fs::remove_file(&record.absolute_path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(GalleryError::io(&record.absolute_path, e)),
    }
}

/// Stream a remote file into the mirror
///
/// The body is written next to its destination with a `.part` suffix and
/// renamed once complete, so the final path only ever holds whole files.
pub async fn download(store: &dyn RemoteStore, root: &Path, record: &RemoteFileRecord) -> Result<PathBuf> {
    let target = mirror_path(root, &record.relative_path)?;

    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| GalleryError::io(parent, e))?;
    }

    let partial = partial_path(&target);

    let result = match write_partial(store, record, &partial).await {
        Ok(written) => {
            if written != record.size {
                tracing::warn!(
                    path = %record.relative_path,
                    expected = record.size,
                    written,
                    "downloaded size differs from remote listing"
                );
            }

            tokio::fs::rename(&partial, &target)
                .await
                .map_err(|e| GalleryError::io(&target, e))
        }
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        if let Err(cleanup) = tokio::fs::remove_file(&partial).await
            && cleanup.kind() != ErrorKind::NotFound
        {
            tracing::warn!(path = %partial.display(), error = %cleanup, "failed to remove partial download");
        }
        return Err(e);
    }

    Ok(target)
}

async fn write_partial(store: &dyn RemoteStore, record: &RemoteFileRecord, partial: &Path) -> Result<u64> {
    let mut body = store.open(&record.remote_location).await?;

    let mut file = tokio::fs::File::create(partial)
        .await
        .map_err(|e| GalleryError::io(partial, e))?;

    let mut written = 0u64;
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await.map_err(|e| GalleryError::io(partial, e))?;
        written += chunk.len() as u64;
    }

    file.flush().await.map_err(|e| GalleryError::io(partial, e))?;

    Ok(written)
}

/// Local destination of `relative_path` below `root`
///
/// Rejects paths that could resolve outside the mirror.
pub fn mirror_path(root: &Path, relative_path: &str) -> Result<PathBuf> {
    let mut path = root.to_path_buf();

    for part in relative_path.split('/') {
        if !is_safe_name(part) {
            return Err(GalleryError::InvalidRequest(format!(
                "refusing to mirror unsafe path '{relative_path}'"
            )));
        }
        path.push(part);
    }

    Ok(path)
}

fn partial_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_owned();
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}

/// Remove directories below `root` that no longer contain anything
///
/// Best effort: failures are logged, the root itself is kept.
pub async fn prune_empty_dirs(root: PathBuf) {
    let result = tokio::task::spawn_blocking(move || prune_blocking(&root)).await;

    if let Err(e) = result {
        tracing::warn!(error = %e, "empty directory pruning task failed");
    }
}

fn prune_blocking(root: &Path) {
    let dirs = walkdir::WalkDir::new(root)
        .min_depth(1)
        .contents_first(true)
        .follow_links(false)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_dir());

    for dir in dirs {
        let is_empty = std::fs::read_dir(dir.path()).is_ok_and(|mut entries| entries.next().is_none());
        if !is_empty {
            continue;
        }

        match std::fs::remove_dir(dir.path()) {
            Ok(()) => tracing::debug!(path = %dir.path().display(), "removed empty mirror directory"),
            Err(e) => tracing::warn!(path = %dir.path().display(), error = %e, "failed to remove empty mirror directory"),
        }
    }
}
