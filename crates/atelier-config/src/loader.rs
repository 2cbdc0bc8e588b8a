use std::path::Path;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::parse(&raw)
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing or validation fails
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let expanded = crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if gallery or telemetry settings are unusable
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_server_config()?;
        self.validate_gallery_config()?;
        self.validate_telemetry_config()?;
        Ok(())
    }

    fn validate_server_config(&self) -> anyhow::Result<()> {
        let health = &self.server.health;
        if health.enabled {
            if !health.path.starts_with('/') {
                anyhow::bail!("server.health.path must start with '/', got '{}'", health.path);
            }

            check_route_path("server.health.path", &health.path)?;

            if is_within(&health.path, &self.gallery.files_path) {
                anyhow::bail!(
                    "server.health.path '{}' collides with gallery.files_path '{}'",
                    health.path,
                    self.gallery.files_path
                );
            }
        }

        if let Some(ref cors) = self.server.cors {
            if let Some(ref max_age) = cors.max_age {
                duration_str::parse(max_age).map_err(|e| anyhow::anyhow!("invalid server.cors.max_age '{max_age}': {e}"))?;
            }

            let has_wildcard = [&cors.origins, &cors.methods, &cors.headers]
                .into_iter()
                .any(|value| *value == crate::AnyOrList::Any);
            if cors.credentials && has_wildcard {
                anyhow::bail!("server.cors.credentials requires explicit origins, methods and headers");
            }
        }

        Ok(())
    }

    fn validate_gallery_config(&self) -> anyhow::Result<()> {
        let gallery = &self.gallery;

        if !matches!(gallery.base_url.scheme(), "http" | "https") {
            anyhow::bail!("gallery.base_url must be an http(s) URL, got '{}'", gallery.base_url);
        }

        if !gallery.root_path.starts_with('/') {
            anyhow::bail!("gallery.root_path must start with '/', got '{}'", gallery.root_path);
        }

        if !gallery.files_path.starts_with('/') || gallery.files_path.len() < 2 || gallery.files_path.ends_with('/') {
            anyhow::bail!(
                "gallery.files_path must be a non-root path starting with '/' without a trailing '/', got '{}'",
                gallery.files_path
            );
        }

        check_route_path("gallery.files_path", &gallery.files_path)?;

        if gallery.image_extensions.is_empty() {
            anyhow::bail!("gallery.image_extensions must not be empty");
        }

        if let Some(ext) = gallery.image_extensions.iter().find(|e| e.is_empty() || e.contains('.')) {
            anyhow::bail!("gallery.image_extensions entries must be bare extensions without dots, got '{ext}'");
        }

        if gallery.max_depth == 0 {
            anyhow::bail!("gallery.max_depth must be greater than 0");
        }

        for (name, value) in [("list_timeout", &gallery.list_timeout), ("fetch_timeout", &gallery.fetch_timeout)] {
            duration_str::parse(value).map_err(|e| anyhow::anyhow!("invalid gallery.{name} '{value}': {e}"))?;
        }

        Ok(())
    }

    fn validate_telemetry_config(&self) -> anyhow::Result<()> {
        let Some(ref telemetry) = self.telemetry else {
            return Ok(());
        };

        if let Some(ref tracing) = telemetry.tracing
            && !(0.0..=1.0).contains(&tracing.sampling_rate)
        {
            anyhow::bail!("telemetry.tracing.sampling_rate must be between 0.0 and 1.0");
        }

        if let Some(ref exporter) = telemetry.exporter {
            duration_str::parse(&exporter.export_interval).map_err(|e| {
                anyhow::anyhow!("invalid telemetry.exporter.export_interval '{}': {e}", exporter.export_interval)
            })?;
        }

        Ok(())
    }
}

/// `path` equals `prefix` or lies below it
fn is_within(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix).is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Reject paths the router cannot mount next to the gallery API
fn check_route_path(field: &str, path: &str) -> anyhow::Result<()> {
    if path.contains(['{', '}', '*']) {
        anyhow::bail!("{field} must be a literal path, got '{path}'");
    }

    if is_within(path, crate::GALLERY_API_PREFIX) || is_within(crate::GALLERY_API_PREFIX, path) {
        anyhow::bail!("{field} '{path}' collides with the gallery API under {}", crate::GALLERY_API_PREFIX);
    }

    Ok(())
}
