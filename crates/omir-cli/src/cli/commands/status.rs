//! `omir status` – show the on-disk footprint of every mirrored target.

use anyhow::Result;
use omir_core::footprint;
use std::path::Path;

pub fn run_status(root: &Path) -> Result<()> {
    if !root.is_dir() {
        println!("No mirror at {}.", root.display());
        return Ok(());
    }

    println!("{:<12} {}", "SIZE", "TARGET");
    let mut total_bytes = 0u64;
    let mut count = 0usize;
    for (owner, repo, path) in list_targets(root)? {
        let size = footprint::dir_size(&path);
        total_bytes += size;
        count += 1;
        println!("{:<12} {}/{}", size, owner, repo);
    }
    println!("{} target(s), {} bytes total", count, total_bytes);
    Ok(())
}

/// Walks the two-level `<owner>/<repo>` layout under the mirror root,
/// sorted for stable output.
fn list_targets(root: &Path) -> Result<Vec<(String, String, std::path::PathBuf)>> {
    let mut targets = Vec::new();
    for owner_entry in std::fs::read_dir(root)? {
        let owner_entry = owner_entry?;
        if !owner_entry.file_type()?.is_dir() {
            continue;
        }
        let owner = owner_entry.file_name().to_string_lossy().into_owned();
        for repo_entry in std::fs::read_dir(owner_entry.path())? {
            let repo_entry = repo_entry?;
            if !repo_entry.file_type()?.is_dir() {
                continue;
            }
            let repo = repo_entry.file_name().to_string_lossy().into_owned();
            targets.push((owner.clone(), repo, repo_entry.path()));
        }
    }
    targets.sort();
    Ok(targets)
}
