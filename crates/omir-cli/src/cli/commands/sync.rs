//! `omir sync` – synchronize the catalog into the local mirror.

use anyhow::{Context, Result};
use omir_core::catalog::{self, PluginListEntry, ThemeListEntry};
use omir_core::config::{MirrorConfig, SyncMode};
use omir_core::endpoints::{Endpoints, DEFAULT_HUB_BASE, DEFAULT_RAW_BASE};
use omir_core::fetch::FetchOptions;
use omir_core::mirror;
use omir_core::outcome::{RunSummary, SyncStatus};
use omir_core::scheduler::{self, ProgressTracker};
use omir_core::sync::SyncContext;
use omir_core::target;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub struct SyncArgs {
    pub root: Option<PathBuf>,
    pub jobs: Option<usize>,
    pub full_mirror: bool,
    pub plugin_list: Option<PathBuf>,
    pub theme_list: Option<PathBuf>,
    pub plugins_only: bool,
    pub themes_only: bool,
}

pub async fn run_sync(cfg: &MirrorConfig, args: SyncArgs) -> Result<()> {
    let root = args
        .root
        .clone()
        .or_else(|| cfg.download_root.clone())
        .unwrap_or_else(|| PathBuf::from("mirror"));
    std::fs::create_dir_all(&root)
        .with_context(|| format!("create mirror root {}", root.display()))?;

    let endpoints = Endpoints::new(
        cfg.raw_base_url.as_deref().unwrap_or(DEFAULT_RAW_BASE),
        cfg.hub_base_url.as_deref().unwrap_or(DEFAULT_HUB_BASE),
    )?;

    let (plugins, themes) = load_catalog(&root, &endpoints, &args).await?;
    let entries = catalog::merge_catalogs(&plugins, &themes);
    let targets = target::build_targets(entries, &root);
    let total = targets.len();
    println!("[*] Synchronizing {} targets.", total);

    let mode = if args.full_mirror {
        SyncMode::Full
    } else {
        cfg.sync_mode
    };
    let ctx = SyncContext {
        mode,
        endpoints,
        fetch: FetchOptions {
            connect_timeout: cfg.connect_timeout(),
            timeout: cfg.fetch_timeout(),
        },
    };

    let progress = Arc::new(ProgressTracker::new(total));
    let printer = spawn_progress_printer(Arc::clone(&progress));

    let max_in_flight = args.jobs.unwrap_or(cfg.max_concurrent_targets);
    let summary = scheduler::run_targets(targets, &ctx, max_in_flight, Arc::clone(&progress))
        .await?;

    let _ = printer.await;
    print_summary(&summary);
    Ok(())
}

/// Resolves the plugin and theme lists, mirroring the catalog repository
/// first unless both lists were supplied locally. A failure here is
/// structural and aborts the run before any scheduling.
async fn load_catalog(
    root: &Path,
    endpoints: &Endpoints,
    args: &SyncArgs,
) -> Result<(Vec<PluginListEntry>, Vec<ThemeListEntry>)> {
    let plugins_wanted = !args.themes_only;
    let themes_wanted = !args.plugins_only;
    let catalog_dir = root.join(catalog::CATALOG_REPO);

    let needs_bootstrap = (plugins_wanted && args.plugin_list.is_none())
        || (themes_wanted && args.theme_list.is_none());
    if needs_bootstrap {
        println!("[*] Updating catalog repository.");
        let remote = endpoints.remote(catalog::CATALOG_REPO)?.to_string();
        let dir = catalog_dir.clone();
        tokio::task::spawn_blocking(move || mirror::clone_or_update(&remote, &dir))
            .await
            .context("catalog update task join")?
            .context("update catalog repository")?;
    }

    let plugins = if plugins_wanted {
        let path = args
            .plugin_list
            .clone()
            .unwrap_or_else(|| catalog_dir.join(catalog::PLUGIN_LIST_FILE));
        catalog::load_plugin_list(&path)?
    } else {
        Vec::new()
    };
    let themes = if themes_wanted {
        let path = args
            .theme_list
            .clone()
            .unwrap_or_else(|| catalog_dir.join(catalog::THEME_LIST_FILE));
        catalog::load_theme_list(&path)?
    } else {
        Vec::new()
    };
    Ok((plugins, themes))
}

fn spawn_progress_printer(progress: Arc<ProgressTracker>) -> tokio::task::JoinHandle<()> {
    const PRINT_INTERVAL_MS: u64 = 500;
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_millis(PRINT_INTERVAL_MS)).await;
            let snap = progress.snapshot();
            let mib = snap.cumulative_bytes as f64 / 1_048_576.0;
            let eta = snap
                .eta_secs()
                .map(|s| format!("{:.0}s", s))
                .unwrap_or_else(|| "?".to_string());
            println!(
                "\r  {}/{} ({:.1}%)  {:.1} MiB  ETA {}  ",
                snap.completed,
                snap.total,
                snap.fraction() * 100.0,
                mib,
                eta
            );
            if progress.is_done() {
                break;
            }
        }
    })
}

fn print_summary(summary: &RunSummary) {
    let disk_mib = summary.disk_bytes as f64 / 1_048_576.0;
    let written_mib = summary.bytes_written as f64 / 1_048_576.0;
    println!(
        "done: {}/{} targets ({} ok, {} with warnings, {} invalid)",
        summary.completed, summary.total, summary.ok, summary.warned, summary.invalid
    );
    println!(
        "  {:.1} MiB on disk, {:.1} MiB written this run",
        disk_mib, written_mib
    );
    for report in summary
        .reports
        .iter()
        .filter(|r| r.status != SyncStatus::Ok)
    {
        println!("  [!] {}: {:?}", report.repo, report.status);
    }
}
