use std::collections::BTreeMap;

use crate::inventory::LocalFileRecord;
use crate::lister::RemoteFileRecord;

/// Work derived from comparing the remote listing with the mirror
#[derive(Debug, Default)]
pub struct SyncPlan {
    pub to_download: Vec<RemoteFileRecord>,
    pub to_delete: Vec<LocalFileRecord>,
}

impl SyncPlan {
    /// Number of file operations the plan schedules
    pub fn total(&self) -> usize {
        self.to_download.len() + self.to_delete.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_download.is_empty() && self.to_delete.is_empty()
    }
}

/// Compare remote and local records by relative path
///
/// A path present on both sides with different sizes is stale and shows up in
/// both lists: the local copy is deleted, then downloaded again. Both lists
/// come out sorted by relative path.
///
/// Unlike a plain set difference, local files below an `unreachable` prefix
/// are not scheduled for deletion: a subtree that failed to list is treated as
/// unknown rather than empty.
pub fn plan(remote: Vec<RemoteFileRecord>, local: Vec<LocalFileRecord>, unreachable: &[String]) -> SyncPlan {
    let remote: BTreeMap<String, RemoteFileRecord> = remote.into_iter().map(|r| (r.relative_path.clone(), r)).collect();
    let mut local: BTreeMap<String, LocalFileRecord> = local.into_iter().map(|l| (l.relative_path.clone(), l)).collect();

    let mut sync_plan = SyncPlan::default();

    for (path, record) in remote {
        match local.remove(&path) {
            Some(existing) if existing.size == record.size => {}
            Some(existing) => {
                sync_plan.to_delete.push(existing);
                sync_plan.to_download.push(record);
            }
            None => sync_plan.to_download.push(record),
        }
    }

    for (path, record) in local {
        if is_under_unreachable(&path, unreachable) {
            tracing::debug!(path = %path, "keeping local file below unreachable remote prefix");
            continue;
        }
        sync_plan.to_delete.push(record);
    }

    sync_plan.to_delete.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

    sync_plan
}

fn is_under_unreachable(path: &str, unreachable: &[String]) -> bool {
    unreachable.iter().any(|prefix| {
        prefix.is_empty()
            || path
                .strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    })
}
