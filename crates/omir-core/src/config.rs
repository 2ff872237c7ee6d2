use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Per-run operating mode: discrete raw-file fetches, or a full repository
/// clone/fast-forward per target. Selected once per run, never per target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    #[default]
    Raw,
    Full,
}

/// Global configuration loaded from `~/.config/omir/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorConfig {
    /// Maximum number of targets synchronized concurrently.
    pub max_concurrent_targets: usize,
    /// Raw-file synchronization or full clone/update per target.
    pub sync_mode: SyncMode,
    /// Connect timeout for each HTTP request, in seconds.
    pub connect_timeout_secs: u64,
    /// Total timeout for each HTTP request, in seconds.
    pub fetch_timeout_secs: u64,
    /// Mirror root directory; defaults to `./mirror` when unset.
    #[serde(default)]
    pub download_root: Option<PathBuf>,
    /// Override for the raw-content host (e.g. an offline server).
    #[serde(default)]
    pub raw_base_url: Option<String>,
    /// Override for the repository/releases host (e.g. an offline server).
    #[serde(default)]
    pub hub_base_url: Option<String>,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_targets: 20,
            sync_mode: SyncMode::Raw,
            connect_timeout_secs: 15,
            fetch_timeout_secs: 60,
            download_root: None,
            raw_base_url: None,
            hub_base_url: None,
        }
    }
}

impl MirrorConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("omir")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<MirrorConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = MirrorConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: MirrorConfig = toml::from_str(&data)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = MirrorConfig::default();
        assert_eq!(cfg.max_concurrent_targets, 20);
        assert_eq!(cfg.sync_mode, SyncMode::Raw);
        assert_eq!(cfg.connect_timeout_secs, 15);
        assert_eq!(cfg.fetch_timeout_secs, 60);
        assert!(cfg.download_root.is_none());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = MirrorConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: MirrorConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.max_concurrent_targets, cfg.max_concurrent_targets);
        assert_eq!(parsed.sync_mode, cfg.sync_mode);
        assert_eq!(parsed.connect_timeout_secs, cfg.connect_timeout_secs);
        assert_eq!(parsed.fetch_timeout_secs, cfg.fetch_timeout_secs);
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            max_concurrent_targets = 4
            sync_mode = "full"
            connect_timeout_secs = 5
            fetch_timeout_secs = 30
            download_root = "/srv/obsidian-mirror"
        "#;
        let cfg: MirrorConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.max_concurrent_targets, 4);
        assert_eq!(cfg.sync_mode, SyncMode::Full);
        assert_eq!(
            cfg.download_root.as_deref(),
            Some(std::path::Path::new("/srv/obsidian-mirror"))
        );
        assert!(cfg.raw_base_url.is_none());
        assert!(cfg.hub_base_url.is_none());
    }

    #[test]
    fn config_toml_endpoint_overrides() {
        let toml = r#"
            max_concurrent_targets = 20
            sync_mode = "raw"
            connect_timeout_secs = 15
            fetch_timeout_secs = 60
            raw_base_url = "http://obsidian-server/files"
            hub_base_url = "http://obsidian-server/files"
        "#;
        let cfg: MirrorConfig = toml::from_str(toml).unwrap();
        assert_eq!(
            cfg.raw_base_url.as_deref(),
            Some("http://obsidian-server/files")
        );
        assert_eq!(
            cfg.hub_base_url.as_deref(),
            Some("http://obsidian-server/files")
        );
    }
}
