//! Remote URL conventions for raw files, release assets, and clone remotes.
//!
//! Base hosts default to GitHub but are configurable so the whole mirror can
//! be pointed at an offline server.

use anyhow::{Context, Result};
use url::Url;

pub const DEFAULT_RAW_BASE: &str = "https://raw.githubusercontent.com/";
pub const DEFAULT_HUB_BASE: &str = "https://github.com/";

/// URL builders for one pair of raw-content / repository hosts.
#[derive(Debug, Clone)]
pub struct Endpoints {
    raw_base: Url,
    hub_base: Url,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            raw_base: Url::parse(DEFAULT_RAW_BASE).expect("default raw base URL"),
            hub_base: Url::parse(DEFAULT_HUB_BASE).expect("default hub base URL"),
        }
    }
}

/// Ensures a base URL ends with `/` so `Url::join` treats it as a directory.
fn parse_base(base: &str) -> Result<Url> {
    let normalized = if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{}/", base)
    };
    Url::parse(&normalized).with_context(|| format!("invalid base URL: {}", base))
}

impl Endpoints {
    pub fn new(raw_base: &str, hub_base: &str) -> Result<Self> {
        Ok(Self {
            raw_base: parse_base(raw_base)?,
            hub_base: parse_base(hub_base)?,
        })
    }

    /// Raw file at the HEAD revision:
    /// `<raw>/<owner>/<repo>/HEAD/<file>`.
    pub fn raw_file(&self, repo: &str, file: &str) -> Result<Url> {
        self.raw_base
            .join(&format!("{}/HEAD/{}", repo, file))
            .with_context(|| format!("raw file URL for {}/{}", repo, file))
    }

    /// Release asset: `<hub>/<owner>/<repo>/releases/download/<version>/<file>`.
    pub fn release_asset(&self, repo: &str, version: &str, file: &str) -> Result<Url> {
        self.hub_base
            .join(&format!(
                "{}/releases/download/{}/{}",
                repo, version, file
            ))
            .with_context(|| format!("release asset URL for {}@{}", repo, version))
    }

    /// Releases listing used as the existence probe:
    /// `<hub>/<owner>/<repo>/releases`.
    pub fn releases_listing(&self, repo: &str) -> Result<Url> {
        self.hub_base
            .join(&format!("{}/releases", repo))
            .with_context(|| format!("releases listing URL for {}", repo))
    }

    /// Clone/update remote: `<hub>/<owner>/<repo>`.
    pub fn remote(&self, repo: &str) -> Result<Url> {
        self.hub_base
            .join(repo)
            .with_context(|| format!("remote URL for {}", repo))
    }
}
