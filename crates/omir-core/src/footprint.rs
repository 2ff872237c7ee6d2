//! On-disk footprint: recursive file-size sum for one mirror path.

use std::path::Path;
use walkdir::WalkDir;

/// Sums the sizes of all files under `path` (directories excluded).
/// Unreadable entries are skipped; a missing path sums to 0.
pub fn dir_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok())
        .map(|meta| meta.len())
        .sum()
}
