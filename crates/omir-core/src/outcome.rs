//! Value results for fetches, targets, and whole runs.
//!
//! Per-file failures are data, not errors: a fetch resolves to a
//! `FetchOutcome` and the run never hard-fails on a single file.

use std::time::Duration;

/// Result of one conditional file fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchOutcome {
    /// True when new content was written to disk.
    pub written: bool,
    /// Bytes written (0 when skipped or failed).
    pub bytes: u64,
    /// True when a transport, filesystem, or decode error was swallowed.
    pub failed: bool,
}

impl FetchOutcome {
    /// Nothing to do: missing remote, empty body, or unchanged length.
    pub fn skipped() -> Self {
        Self::default()
    }

    pub fn wrote(bytes: u64) -> Self {
        Self {
            written: true,
            bytes,
            failed: false,
        }
    }

    pub fn failed() -> Self {
        Self {
            written: false,
            bytes: 0,
            failed: true,
        }
    }
}

/// Final classification of one target's synchronization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// All steps ran; individual files may have been skipped as unchanged.
    Ok,
    /// At least one file-level failure or a manifest-decode failure.
    Warnings,
    /// Neither plugin nor theme role set; nothing was fetched.
    Invalid,
}

/// Per-target aggregation of fetch outcomes plus timing and footprint.
/// Owned by exactly one synchronizer invocation; read-only afterwards.
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub repo: String,
    pub status: SyncStatus,
    pub files_written: u32,
    pub bytes_written: u64,
    pub failed_fetches: u32,
    /// Wall-clock duration of the unit, recorded by the scheduler.
    pub elapsed: Duration,
    /// Recursive on-disk size of the target's mirror path, recorded by the
    /// scheduler after the unit completes.
    pub disk_bytes: u64,
}

impl SyncReport {
    pub fn new(repo: &str) -> Self {
        Self {
            repo: repo.to_string(),
            status: SyncStatus::Ok,
            files_written: 0,
            bytes_written: 0,
            failed_fetches: 0,
            elapsed: Duration::ZERO,
            disk_bytes: 0,
        }
    }

    pub fn invalid(repo: &str) -> Self {
        Self {
            status: SyncStatus::Invalid,
            ..Self::new(repo)
        }
    }

    /// Folds one fetch outcome into the report. Failures downgrade the
    /// status to `Warnings` but never abort the target.
    pub fn record(&mut self, outcome: FetchOutcome) {
        if outcome.written {
            self.files_written += 1;
            self.bytes_written += outcome.bytes;
        }
        if outcome.failed {
            self.failed_fetches += 1;
            self.warn();
        }
    }

    /// Downgrades `Ok` to `Warnings` (invalid targets stay invalid).
    pub fn warn(&mut self) {
        if self.status == SyncStatus::Ok {
            self.status = SyncStatus::Warnings;
        }
    }
}

/// Process-wide accumulation of every target's report.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub total: usize,
    pub completed: usize,
    pub ok: usize,
    pub warned: usize,
    pub invalid: usize,
    pub bytes_written: u64,
    pub disk_bytes: u64,
    pub reports: Vec<SyncReport>,
}

impl RunSummary {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn absorb(&mut self, report: SyncReport) {
        self.completed += 1;
        match report.status {
            SyncStatus::Ok => self.ok += 1,
            SyncStatus::Warnings => self.warned += 1,
            SyncStatus::Invalid => self.invalid += 1,
        }
        self.bytes_written += report.bytes_written;
        self.disk_bytes += report.disk_bytes;
        self.reports.push(report);
    }
}
