//! Catalog documents: the upstream plugin and theme lists and their merge.
//!
//! The two lists are sourced independently and keyed by repository
//! identifier (`owner/name`). A repository may appear in both; the merged
//! entry carries both role flags and the union of extra files. Identifiers
//! are unique after the merge.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Repository that hosts the catalog documents themselves.
pub const CATALOG_REPO: &str = "obsidianmd/obsidian-releases";
/// Plugin list inside the catalog repository.
pub const PLUGIN_LIST_FILE: &str = "community-plugins.json";
/// Theme list inside the catalog repository.
pub const THEME_LIST_FILE: &str = "community-css-themes.json";

/// One row of the community plugin list. Extra JSON fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct PluginListEntry {
    pub repo: String,
}

/// One row of the community theme list. Extra JSON fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ThemeListEntry {
    pub repo: String,
    #[serde(default)]
    pub screenshot: Option<String>,
}

/// Merged catalog entry for one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Repository identifier, `owner/name`.
    pub repo: String,
    pub plugin: bool,
    pub theme: bool,
    /// Additional raw files to mirror (theme screenshots). Plugin-derived
    /// entries come first, theme-derived entries after.
    pub extra_files: Vec<String>,
}

/// Failure to read or parse a catalog document. Structural: the run aborts
/// before scheduling when the catalog cannot be produced.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("cannot read catalog list {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse catalog list {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Reads the plugin list (`community-plugins.json`) from disk.
pub fn load_plugin_list(path: &Path) -> Result<Vec<PluginListEntry>, CatalogError> {
    let data = fs::read_to_string(path).map_err(|source| CatalogError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&data).map_err(|source| CatalogError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads the theme list (`community-css-themes.json`) from disk.
pub fn load_theme_list(path: &Path) -> Result<Vec<ThemeListEntry>, CatalogError> {
    let data = fs::read_to_string(path).map_err(|source| CatalogError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&data).map_err(|source| CatalogError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// True for `owner/name` with exactly one separator and non-empty segments.
/// Anything else cannot map to a local path under the mirror root.
pub fn valid_identifier(repo: &str) -> bool {
    let mut parts = repo.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(owner), Some(name), None) => {
            !owner.is_empty()
                && !name.is_empty()
                && owner != "."
                && owner != ".."
                && name != "."
                && name != ".."
        }
        _ => false,
    }
}

/// Merges the plugin and theme lists into one catalog, OR-ing role flags
/// for identifiers present in both. List order is preserved: plugin entries
/// first, then themes not already seen. Malformed identifiers are dropped.
pub fn merge_catalogs(
    plugins: &[PluginListEntry],
    themes: &[ThemeListEntry],
) -> Vec<CatalogEntry> {
    let mut order: Vec<String> = Vec::new();
    let mut merged: HashMap<String, CatalogEntry> = HashMap::new();

    for p in plugins {
        if !valid_identifier(&p.repo) {
            tracing::warn!(repo = %p.repo, "skipping malformed plugin identifier");
            continue;
        }
        merged
            .entry(p.repo.clone())
            .or_insert_with(|| {
                order.push(p.repo.clone());
                CatalogEntry {
                    repo: p.repo.clone(),
                    plugin: false,
                    theme: false,
                    extra_files: Vec::new(),
                }
            })
            .plugin = true;
    }

    for t in themes {
        if !valid_identifier(&t.repo) {
            tracing::warn!(repo = %t.repo, "skipping malformed theme identifier");
            continue;
        }
        let entry = merged.entry(t.repo.clone()).or_insert_with(|| {
            order.push(t.repo.clone());
            CatalogEntry {
                repo: t.repo.clone(),
                plugin: false,
                theme: false,
                extra_files: Vec::new(),
            }
        });
        entry.theme = true;
        if let Some(screenshot) = t.screenshot.as_deref() {
            if !screenshot.is_empty() && !entry.extra_files.iter().any(|f| f == screenshot) {
                entry.extra_files.push(screenshot.to_string());
            }
        }
    }

    order
        .into_iter()
        .filter_map(|repo| merged.remove(&repo))
        .collect()
}
