use std::path::PathBuf;

use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Image extensions mirrored by default (lowercase, without the leading dot)
pub const DEFAULT_IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "webp", "bmp"];

/// Prefix of the gallery API routes; no other route may live below it
pub const GALLERY_API_PREFIX: &str = "/api/gallery";

/// Gallery configuration: the remote Alist store and its local mirror
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GalleryConfig {
    /// Base URL of the Alist-compatible store (e.g. `https://oss.example.com`)
    pub base_url: Url,
    /// Password sent with listing and metadata calls
    #[serde(default = "default_password")]
    pub password: SecretString,
    /// Remote directory mirrored by the sync job
    #[serde(default = "default_root_path")]
    pub root_path: String,
    /// Local directory holding the mirror
    #[serde(default = "default_mirror_dir")]
    pub mirror_dir: PathBuf,
    /// File extensions considered images
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,
    /// Maximum directory depth descended below `root_path`
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Timeout for listing and metadata calls (e.g. "10s")
    #[serde(default = "default_list_timeout")]
    pub list_timeout: String,
    /// Timeout for a single file fetch (e.g. "30s")
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout: String,
    /// URL prefix under which mirrored files are served
    #[serde(default = "default_files_path")]
    pub files_path: String,
}

impl GalleryConfig {
    /// Minimal configuration pointing at `base_url`, everything else defaulted
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            password: default_password(),
            root_path: default_root_path(),
            mirror_dir: default_mirror_dir(),
            image_extensions: default_image_extensions(),
            max_depth: default_max_depth(),
            list_timeout: default_list_timeout(),
            fetch_timeout: default_fetch_timeout(),
            files_path: default_files_path(),
        }
    }
}

fn default_password() -> SecretString {
    SecretString::from(String::new())
}

fn default_root_path() -> String {
    "/".to_string()
}

fn default_mirror_dir() -> PathBuf {
    PathBuf::from("gallery_cache")
}

fn default_image_extensions() -> Vec<String> {
    DEFAULT_IMAGE_EXTENSIONS.iter().map(ToString::to_string).collect()
}

#[allow(clippy::missing_const_for_fn)]
fn default_max_depth() -> usize {
    32
}

fn default_list_timeout() -> String {
    "10s".to_string()
}

fn default_fetch_timeout() -> String {
    "30s".to_string()
}

fn default_files_path() -> String {
    "/gallery/files".to_string()
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn deserialize_minimal_config() {
        let toml = r#"
            base_url = "https://oss.example.com"
        "#;

        let config: GalleryConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.base_url.as_str(), "https://oss.example.com/");
        assert_eq!(config.password.expose_secret(), "");
        assert_eq!(config.root_path, "/");
        assert_eq!(config.mirror_dir, PathBuf::from("gallery_cache"));
        assert_eq!(config.image_extensions, ["jpg", "jpeg", "png", "gif", "webp", "bmp"]);
        assert_eq!(config.max_depth, 32);
        assert_eq!(config.list_timeout, "10s");
        assert_eq!(config.fetch_timeout, "30s");
        assert_eq!(config.files_path, "/gallery/files");
    }

    #[test]
    fn deserialize_full_config() {
        let toml = r#"
            base_url = "https://oss.example.com"
            password = "hunter2"
            root_path = "/photos"
            mirror_dir = "/var/cache/atelier"
            image_extensions = ["png"]
            max_depth = 4
            list_timeout = "3s"
            fetch_timeout = "2m"
            files_path = "/cache"
        "#;

        let config: GalleryConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.password.expose_secret(), "hunter2");
        assert_eq!(config.root_path, "/photos");
        assert_eq!(config.mirror_dir, PathBuf::from("/var/cache/atelier"));
        assert_eq!(config.image_extensions, ["png"]);
        assert_eq!(config.max_depth, 4);
        assert_eq!(config.fetch_timeout, "2m");
        assert_eq!(config.files_path, "/cache");
    }

    #[test]
    fn unknown_field_is_rejected() {
        let toml = r#"
            base_url = "https://oss.example.com"
            per_page = 10
        "#;

        assert!(toml::from_str::<GalleryConfig>(toml).is_err());
    }
}
