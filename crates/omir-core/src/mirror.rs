//! Full-mirror mode: clone-if-absent / fast-forward-update-if-present.
//!
//! Only fast-forward updates are applied. Diverged history keeps the
//! existing local state; the caller treats any error here as non-fatal for
//! the owning target.

use anyhow::{Context, Result};
use git2::build::CheckoutBuilder;
use git2::Repository;
use std::fs;
use std::path::Path;

/// What the clone/update operation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorUpdate {
    Cloned,
    FastForwarded,
    UpToDate,
}

/// Clones `remote_url` into `local_path`, or fast-forwards the default
/// branch when a repository already exists there.
pub fn clone_or_update(remote_url: &str, local_path: &Path) -> Result<MirrorUpdate> {
    if local_path.join(".git").exists() {
        let repo = Repository::open(local_path)
            .with_context(|| format!("open repo {}", local_path.display()))?;
        fast_forward(&repo).with_context(|| format!("update repo {}", local_path.display()))
    } else {
        if let Some(parent) = local_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create dir {}", parent.display()))?;
        }
        Repository::clone(remote_url, local_path)
            .with_context(|| format!("clone {}", remote_url))?;
        Ok(MirrorUpdate::Cloned)
    }
}

fn fast_forward(repo: &Repository) -> Result<MirrorUpdate> {
    let mut remote = repo.find_remote("origin").context("no origin remote")?;
    remote
        .fetch(&[] as &[&str], None, None)
        .context("fetch origin")?;

    let fetch_head = repo
        .find_reference("FETCH_HEAD")
        .context("no FETCH_HEAD after fetch")?;
    let fetch_commit = repo.reference_to_annotated_commit(&fetch_head)?;
    let (analysis, _) = repo.merge_analysis(&[&fetch_commit])?;

    if analysis.is_up_to_date() {
        return Ok(MirrorUpdate::UpToDate);
    }
    if analysis.is_fast_forward() {
        let refname = {
            let head = repo.head().context("resolve HEAD")?;
            head.name().context("non-utf8 HEAD name")?.to_string()
        };
        let mut reference = repo.find_reference(&refname)?;
        reference.set_target(fetch_commit.id(), "fast-forward")?;
        repo.set_head(&refname)?;
        repo.checkout_head(Some(CheckoutBuilder::default().force()))?;
        return Ok(MirrorUpdate::FastForwarded);
    }

    // Diverged history: the local mirror keeps its current state.
    tracing::warn!(
        path = %repo.path().display(),
        "history diverged, keeping local state"
    );
    Ok(MirrorUpdate::UpToDate)
}
