//! Per-target update protocol.
//!
//! Resolves the target's role and issues the fetches that role prescribes.
//! File-level failures are recorded and never abort sibling fetches; the
//! only step that narrows a target's work is a manifest-decode failure,
//! which skips the release assets for that target alone.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::task::JoinSet;
use url::Url;

use crate::config::SyncMode;
use crate::endpoints::Endpoints;
use crate::fetch::{self, FetchOptions};
use crate::mirror;
use crate::outcome::{FetchOutcome, SyncReport};
use crate::target::{safe_relative_path, SyncTarget, TargetRole};

/// Raw files fetched for every plugin-role target.
pub const PLUGIN_BASE_FILES: [&str; 2] = ["manifest.json", "README.md"];
/// Assets fetched from the latest release of a plugin-role target.
pub const PLUGIN_RELEASE_FILES: [&str; 3] = ["manifest.json", "styles.css", "main.js"];
/// Raw files fetched for every theme-role target.
pub const THEME_BASE_FILES: [&str; 4] =
    ["manifest.json", "README.md", "theme.css", "obsidian.css"];

/// Run-wide inputs shared by every synchronizer invocation.
#[derive(Debug, Clone)]
pub struct SyncContext {
    pub mode: SyncMode,
    pub endpoints: Endpoints,
    pub fetch: FetchOptions,
}

#[derive(Debug, Deserialize)]
struct ReleaseManifest {
    version: String,
}

/// Synchronizes one target and returns its report. Never fails outright:
/// the worst classification is `Warnings`.
pub async fn sync_target(target: &SyncTarget, ctx: &SyncContext) -> SyncReport {
    let repo = target.entry.repo.as_str();
    let Some(role) = TargetRole::from_entry(&target.entry) else {
        tracing::warn!(repo, "target has neither plugin nor theme role");
        return SyncReport::invalid(repo);
    };

    let mut report = SyncReport::new(repo);
    match ctx.mode {
        SyncMode::Raw => {
            if role.is_plugin() {
                sync_plugin_raw(target, ctx, &mut report).await;
            }
            if role.is_theme() {
                sync_theme_raw(target, ctx, &mut report, role.is_plugin()).await;
            }
        }
        SyncMode::Full => {
            sync_full_mirror(target, ctx).await;
            if role.is_plugin() {
                sync_release_assets(target, ctx, &mut report).await;
            }
        }
    }
    report
}

async fn sync_plugin_raw(target: &SyncTarget, ctx: &SyncContext, report: &mut SyncReport) {
    let repo = target.entry.repo.as_str();
    for file in PLUGIN_BASE_FILES {
        let outcome = fetch_one(
            ctx.endpoints.raw_file(repo, file),
            target.local_path.join(file),
            ctx.fetch,
        )
        .await;
        report.record(outcome);
    }
    sync_release_assets(target, ctx, report).await;
}

async fn sync_theme_raw(
    target: &SyncTarget,
    ctx: &SyncContext,
    report: &mut SyncReport,
    have_plugin_base: bool,
) {
    let repo = target.entry.repo.as_str();
    for file in THEME_BASE_FILES {
        // A dual-role target already fetched the shared base files.
        if have_plugin_base && PLUGIN_BASE_FILES.contains(&file) {
            continue;
        }
        let outcome = fetch_one(
            ctx.endpoints.raw_file(repo, file),
            target.local_path.join(file),
            ctx.fetch,
        )
        .await;
        report.record(outcome);
    }
    for extra in &target.entry.extra_files {
        let Some(rel) = safe_relative_path(extra) else {
            tracing::warn!(repo, file = %extra, "refusing unsafe extra-file path");
            report.record(FetchOutcome::failed());
            continue;
        };
        let outcome = fetch_one(
            ctx.endpoints.raw_file(repo, extra),
            target.local_path.join(rel),
            ctx.fetch,
        )
        .await;
        report.record(outcome);
    }
}

/// Probes the releases listing, decodes the local manifest version, and
/// fetches the fixed asset set concurrently. A failing probe is a valid
/// "no releases yet" outcome; a decode failure skips the step with a warning.
async fn sync_release_assets(target: &SyncTarget, ctx: &SyncContext, report: &mut SyncReport) {
    let repo = target.entry.repo.as_str();
    let listing = match ctx.endpoints.releases_listing(repo) {
        Ok(url) => url,
        Err(err) => {
            tracing::warn!(repo, error = %format!("{:#}", err), "bad releases listing URL");
            report.record(FetchOutcome::failed());
            return;
        }
    };

    let opts = ctx.fetch;
    let listing_str = listing.to_string();
    let has_releases =
        tokio::task::spawn_blocking(move || fetch::probe_ok(&listing_str, &opts))
            .await
            .unwrap_or(false);
    if !has_releases {
        tracing::debug!(repo, "no releases listing, skipping release assets");
        return;
    }

    let version = match read_manifest_version(&target.local_path.join("manifest.json")) {
        Ok(version) => version,
        Err(err) => {
            tracing::warn!(
                repo,
                error = %format!("{:#}", err),
                "cannot decode manifest version, skipping release assets"
            );
            report.warn();
            return;
        }
    };

    let release_dir = target
        .local_path
        .join("releases")
        .join("download")
        .join(&version);

    let mut join_set = JoinSet::new();
    for file in PLUGIN_RELEASE_FILES {
        join_set.spawn(fetch_one(
            ctx.endpoints.release_asset(repo, &version, file),
            release_dir.join(file),
            ctx.fetch,
        ));
    }
    while let Some(res) = join_set.join_next().await {
        match res {
            Ok(outcome) => report.record(outcome),
            Err(err) => {
                tracing::warn!(repo, error = %err, "release fetch task join failed");
                report.record(FetchOutcome::failed());
            }
        }
    }
}

async fn sync_full_mirror(target: &SyncTarget, ctx: &SyncContext) {
    let repo = target.entry.repo.clone();
    let remote = match ctx.endpoints.remote(&repo) {
        Ok(url) => url.to_string(),
        Err(err) => {
            tracing::warn!(repo = %repo, error = %format!("{:#}", err), "bad remote URL");
            return;
        }
    };
    let local = target.local_path.clone();
    match tokio::task::spawn_blocking(move || mirror::clone_or_update(&remote, &local)).await {
        Ok(Ok(update)) => tracing::debug!(repo = %repo, ?update, "mirror updated"),
        // Divergence and transient VCS failures leave the existing local
        // state in place; the target's outcome is unaffected.
        Ok(Err(err)) => tracing::warn!(
            repo = %repo,
            error = %format!("{:#}", err),
            "mirror update failed, keeping local state"
        ),
        Err(err) => tracing::warn!(repo = %repo, error = %err, "mirror task join failed"),
    }
}

/// Builds the URL and runs the blocking fetch off the async threads. Any
/// failure along the way resolves to a failed outcome, never an error.
async fn fetch_one(url: Result<Url>, dest: PathBuf, opts: FetchOptions) -> FetchOutcome {
    let url = match url {
        Ok(url) => url,
        Err(err) => {
            tracing::warn!(error = %format!("{:#}", err), "bad fetch URL");
            return FetchOutcome::failed();
        }
    };
    let url_str = url.to_string();
    match tokio::task::spawn_blocking(move || fetch::fetch_if_changed(&url_str, &dest, &opts))
        .await
    {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::warn!(url = %url, error = %err, "fetch task join failed");
            FetchOutcome::failed()
        }
    }
}

fn read_manifest_version(manifest_path: &Path) -> Result<String> {
    let data = std::fs::read_to_string(manifest_path)
        .with_context(|| format!("open {}", manifest_path.display()))?;
    let manifest: ReleaseManifest = serde_json::from_str(&data)
        .with_context(|| format!("decode {}", manifest_path.display()))?;
    let version = manifest.version;
    if version.is_empty()
        || version.contains('/')
        || version.contains('\\')
        || version == "."
        || version == ".."
    {
        anyhow::bail!("manifest version {:?} is not a valid directory name", version);
    }
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn manifest_version_decodes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        fs::write(&path, r#"{"id":"x","version":"1.2.3","minAppVersion":"0.15.0"}"#).unwrap();
        assert_eq!(read_manifest_version(&path).unwrap(), "1.2.3");
    }

    #[test]
    fn manifest_decode_failures() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        assert!(read_manifest_version(&path).is_err());

        fs::write(&path, "not json").unwrap();
        assert!(read_manifest_version(&path).is_err());

        fs::write(&path, r#"{"version":"../escape"}"#).unwrap();
        assert!(read_manifest_version(&path).is_err());

        fs::write(&path, r#"{"version":""}"#).unwrap();
        assert!(read_manifest_version(&path).is_err());
    }
}
