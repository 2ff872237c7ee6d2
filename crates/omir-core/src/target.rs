//! Sync targets: one merged catalog entry mapped to a local mirror path.

use std::path::{Component, Path, PathBuf};

use crate::catalog::CatalogEntry;

/// Role of a target, resolved once from the catalog flags. Dispatch happens
/// over this variant, not over the raw booleans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetRole {
    Plugin,
    Theme,
    PluginAndTheme,
}

impl TargetRole {
    /// None means the entry carries no role and the target is invalid.
    pub fn from_entry(entry: &CatalogEntry) -> Option<Self> {
        match (entry.plugin, entry.theme) {
            (true, true) => Some(Self::PluginAndTheme),
            (true, false) => Some(Self::Plugin),
            (false, true) => Some(Self::Theme),
            (false, false) => None,
        }
    }

    pub fn is_plugin(self) -> bool {
        matches!(self, Self::Plugin | Self::PluginAndTheme)
    }

    pub fn is_theme(self) -> bool {
        matches!(self, Self::Theme | Self::PluginAndTheme)
    }
}

/// One unit of scheduled work: a catalog entry plus its mirror path.
/// Paths are disjoint across targets because identifiers are unique.
#[derive(Debug, Clone)]
pub struct SyncTarget {
    pub entry: CatalogEntry,
    pub local_path: PathBuf,
}

impl SyncTarget {
    /// Namespace-preserving path: `<root>/<owner>/<name>`.
    pub fn new(entry: CatalogEntry, root: &Path) -> Self {
        let local_path = root.join(&entry.repo);
        Self { entry, local_path }
    }
}

/// Builds the immutable target set for a run.
pub fn build_targets(entries: Vec<CatalogEntry>, root: &Path) -> Vec<SyncTarget> {
    entries
        .into_iter()
        .map(|entry| SyncTarget::new(entry, root))
        .collect()
}

/// Validates an extra-file path from the catalog before joining it under the
/// target directory. Rejects absolute paths and any `..` component.
pub fn safe_relative_path(raw: &str) -> Option<PathBuf> {
    let path = Path::new(raw);
    if raw.is_empty() || path.is_absolute() {
        return None;
    }
    for component in path.components() {
        match component {
            Component::Normal(_) => {}
            _ => return None,
        }
    }
    Some(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(repo: &str) -> CatalogEntry {
        CatalogEntry {
            repo: repo.to_string(),
            plugin: true,
            theme: false,
            extra_files: Vec::new(),
        }
    }

    #[test]
    fn local_path_preserves_namespace() {
        let target = SyncTarget::new(entry("owner/repo"), Path::new("/srv/mirror"));
        assert_eq!(
            target.local_path,
            PathBuf::from("/srv/mirror/owner/repo")
        );
    }

    #[test]
    fn role_resolution() {
        let mut e = entry("a/b");
        assert_eq!(TargetRole::from_entry(&e), Some(TargetRole::Plugin));
        e.theme = true;
        assert_eq!(TargetRole::from_entry(&e), Some(TargetRole::PluginAndTheme));
        e.plugin = false;
        assert_eq!(TargetRole::from_entry(&e), Some(TargetRole::Theme));
        e.theme = false;
        assert_eq!(TargetRole::from_entry(&e), None);
    }

    #[test]
    fn safe_relative_path_accepts_subdirs() {
        assert_eq!(
            safe_relative_path("images/screenshot.png"),
            Some(PathBuf::from("images/screenshot.png"))
        );
    }

    #[test]
    fn safe_relative_path_rejects_escapes() {
        assert_eq!(safe_relative_path("../../etc/passwd"), None);
        assert_eq!(safe_relative_path("/etc/passwd"), None);
        assert_eq!(safe_relative_path("a/../b"), None);
        assert_eq!(safe_relative_path(""), None);
    }
}
