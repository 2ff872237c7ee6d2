//! Fan the target set out to bounded parallel synchronizer units.
//!
//! One spawned unit per target, at most `max_in_flight` admitted at once,
//! join-all before the summary is returned. Outcomes complete in any order.

use anyhow::Result;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;

use crate::footprint;
use crate::outcome::RunSummary;
use crate::sync::{self, SyncContext};
use crate::target::SyncTarget;

use super::permit::SyncPermits;
use super::progress::ProgressTracker;

/// Synchronizes every target and returns the run summary once all units
/// have completed. Per-unit duration and footprint are forwarded to
/// `progress` as units finish.
pub async fn run_targets(
    targets: Vec<SyncTarget>,
    ctx: &SyncContext,
    max_in_flight: usize,
    progress: Arc<ProgressTracker>,
) -> Result<RunSummary> {
    let mut summary = RunSummary::new(targets.len());
    let permits = SyncPermits::new(max_in_flight);
    let mut join_set = JoinSet::new();

    for target in targets {
        let permit = permits.acquire().await;
        let ctx = ctx.clone();
        let progress = Arc::clone(&progress);
        join_set.spawn(async move {
            let _permit = permit;
            let started = Instant::now();
            let mut report = sync::sync_target(&target, &ctx).await;
            report.elapsed = started.elapsed();

            // Footprint is recomputed per unit; the fold below is the only
            // cross-unit byte accounting.
            let path = target.local_path.clone();
            report.disk_bytes = tokio::task::spawn_blocking(move || footprint::dir_size(&path))
                .await
                .unwrap_or(0);

            progress.on_unit_complete(report.elapsed, report.disk_bytes);
            report
        });
    }

    while let Some(res) = join_set.join_next().await {
        let report = res.map_err(|e| anyhow::anyhow!("sync task join: {}", e))?;
        summary.absorb(report);
    }

    Ok(summary)
}
