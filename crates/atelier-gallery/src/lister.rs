use std::collections::HashSet;

use crate::remote::RemoteStore;

/// A remote image selected for mirroring
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFileRecord {
    pub name: String,
    /// `/`-separated path below the sync root
    pub relative_path: String,
    pub size: u64,
    /// Absolute path on the remote store
    pub remote_location: String,
}

/// Result of walking the remote tree
#[derive(Debug, Default)]
pub struct RemoteListing {
    pub files: Vec<RemoteFileRecord>,
    /// Relative prefixes whose contents could not be listed (`""` is the root)
    pub unreachable: Vec<String>,
}

impl RemoteListing {
    pub fn root_unreachable(&self) -> bool {
        self.unreachable.iter().any(String::is_empty)
    }
}

/// Case-insensitive file extension filter
#[derive(Debug, Clone)]
pub struct ImageFilter {
    extensions: HashSet<String>,
}

impl ImageFilter {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        name.rsplit_once('.')
            .is_some_and(|(stem, ext)| !stem.is_empty() && self.extensions.contains(&ext.to_ascii_lowercase()))
    }
}

/// A remote directory waiting to be listed
struct PendingDir {
    remote_path: String,
    prefix: String,
    depth: usize,
}

/// Walk the remote tree below `root` and collect every image file
///
/// Directories are processed from an explicit worklist, never deeper than
/// `max_depth` levels below the root. A directory that fails to list
/// contributes nothing and is recorded in [`RemoteListing::unreachable`];
/// its siblings are still walked.
pub async fn list_remote(store: &dyn RemoteStore, root: &str, filter: &ImageFilter, max_depth: usize) -> RemoteListing {
    let mut listing = RemoteListing::default();
    let mut pending = vec![PendingDir {
        remote_path: root.to_string(),
        prefix: String::new(),
        depth: 0,
    }];

    while let Some(dir) = pending.pop() {
        let entries = match store.list(&dir.remote_path).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(path = %dir.remote_path, error = %e, "failed to list remote directory, skipping subtree");
                listing.unreachable.push(dir.prefix);
                continue;
            }
        };

        for entry in entries {
            if !is_safe_name(&entry.name) {
                tracing::warn!(path = %dir.remote_path, name = %entry.name, "skipping remote entry with unsafe name");
                continue;
            }

            let relative_path = join_relative(&dir.prefix, &entry.name);
            let remote_path = join_remote(&dir.remote_path, &entry.name);

            if entry.is_dir {
                if dir.depth >= max_depth {
                    tracing::warn!(path = %remote_path, max_depth, "remote directory exceeds depth limit, skipping");
                    listing.unreachable.push(relative_path);
                } else {
                    pending.push(PendingDir {
                        remote_path,
                        prefix: relative_path,
                        depth: dir.depth + 1,
                    });
                }
            } else if filter.matches(&entry.name) {
                listing.files.push(RemoteFileRecord {
                    name: entry.name,
                    relative_path,
                    size: entry.size,
                    remote_location: remote_path,
                });
            }
        }
    }

    tracing::debug!(
        files = listing.files.len(),
        unreachable = listing.unreachable.len(),
        "remote listing complete"
    );

    listing
}

/// Whether a remote entry name can be used as a single local path component
pub(crate) fn is_safe_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\', '\0'])
}

fn join_relative(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}/{name}")
    }
}

fn join_remote(parent: &str, name: &str) -> String {
    if parent.ends_with('/') {
        format!("{parent}{name}")
    } else {
        format!("{parent}/{name}")
    }
}
