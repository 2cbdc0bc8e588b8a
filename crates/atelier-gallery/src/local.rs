use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::error::Result;
use crate::inventory;
use crate::lister::ImageFilter;

/// Folder name for images stored directly in the mirror root
pub const UNCATEGORIZED: &str = "uncategorized";

/// Number of preview URLs per folder
pub const PREVIEW_COUNT: usize = 4;

/// One top-level folder of the mirror
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalFolder {
    pub name: String,
    pub count: usize,
    pub preview_images: Vec<String>,
    pub all_images: Vec<String>,
}

/// Mirrored images grouped by their top-level folder
///
/// Folders are sorted by name and images by relative path. Image URLs are
/// `files_path` followed by the percent-encoded relative path.
pub async fn list_local(mirror_dir: PathBuf, filter: &ImageFilter, files_path: &str) -> Result<Vec<LocalFolder>> {
    let records = inventory::scan(mirror_dir).await?;

    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for record in records.into_iter().filter(|r| filter.matches(file_name(&r.relative_path))) {
        let folder = match record.relative_path.split_once('/') {
            Some((top, _)) => top.to_string(),
            None => UNCATEGORIZED.to_string(),
        };
        groups.entry(folder).or_default().push(record.relative_path);
    }

    let folders = groups
        .into_iter()
        .map(|(name, mut paths)| {
            paths.sort_unstable();
            let all_images: Vec<String> = paths.iter().map(|p| file_url(files_path, p)).collect();
            LocalFolder {
                name,
                count: all_images.len(),
                preview_images: all_images.iter().take(PREVIEW_COUNT).cloned().collect(),
                all_images,
            }
        })
        .collect();

    Ok(folders)
}

fn file_name(relative_path: &str) -> &str {
    relative_path.rsplit('/').next().unwrap_or(relative_path)
}

/// Public URL of a mirrored file
pub fn file_url(files_path: &str, relative_path: &str) -> String {
    let encoded: Vec<_> = relative_path.split('/').map(urlencoding::encode).collect();
    format!("{}/{}", files_path.trim_end_matches('/'), encoded.join("/"))
}
