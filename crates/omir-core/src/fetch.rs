//! Fetch-if-changed primitive for a single remote file.
//!
//! Issues one GET per call and compares the retrieved byte length against
//! the existing local file before writing. Change detection is length-only:
//! two payloads of identical length are indistinguishable and will not be
//! re-synced. Errors never cross this boundary; every call resolves to a
//! `FetchOutcome`.
//!
//! Runs in the current thread; call from `spawn_blocking` when used from
//! async code.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::outcome::FetchOutcome;

/// Timeouts threaded in from the scheduler so a stuck transfer cannot hold
/// its permit indefinitely.
#[derive(Debug, Clone, Copy)]
pub struct FetchOptions {
    pub connect_timeout: Duration,
    pub timeout: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            timeout: Duration::from_secs(60),
        }
    }
}

/// Fetches `url` into `local_path`, writing only when the remote length
/// differs from the local file (or no local file exists). A non-2xx status
/// or an empty body is "nothing to do", not an error: probed URLs are
/// expected to legitimately not exist yet.
pub fn fetch_if_changed(url: &str, local_path: &Path, opts: &FetchOptions) -> FetchOutcome {
    match try_fetch(url, local_path, opts) {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::warn!(url, error = %format!("{:#}", err), "fetch failed");
            FetchOutcome::failed()
        }
    }
}

fn try_fetch(url: &str, local_path: &Path, opts: &FetchOptions) -> Result<FetchOutcome> {
    let (code, body) = http_get(url, opts)?;
    if !(200..300).contains(&code) || body.is_empty() {
        tracing::debug!(url, code, "nothing to fetch");
        return Ok(FetchOutcome::skipped());
    }

    if !needs_write(existing_len(local_path), body.len() as u64) {
        tracing::debug!(url, "unchanged, skipping write");
        return Ok(FetchOutcome::skipped());
    }

    if let Some(parent) = local_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create dir {}", parent.display()))?;
    }
    // In-place overwrite; no temp-file-then-rename.
    fs::write(local_path, &body).with_context(|| format!("write {}", local_path.display()))?;
    tracing::debug!(url, bytes = body.len(), "wrote {}", local_path.display());
    Ok(FetchOutcome::wrote(body.len() as u64))
}

/// Write when the lengths differ or there is no local file. Length-only by
/// contract.
pub fn needs_write(existing_len: Option<u64>, incoming_len: u64) -> bool {
    existing_len != Some(incoming_len)
}

fn existing_len(path: &Path) -> Option<u64> {
    fs::metadata(path).ok().filter(|m| m.is_file()).map(|m| m.len())
}

/// HEAD probe used for the releases listing: true only for a 2xx response.
/// Transport errors count as "not there" and are logged at debug level.
pub fn probe_ok(url: &str, opts: &FetchOptions) -> bool {
    match head_status(url, opts) {
        Ok(code) => (200..300).contains(&code),
        Err(err) => {
            tracing::debug!(url, error = %format!("{:#}", err), "probe failed");
            false
        }
    }
}

fn head_status(url: &str, opts: &FetchOptions) -> Result<u32> {
    let mut easy = curl::easy::Easy::new();
    easy.url(url).context("invalid URL")?;
    easy.nobody(true)?; // HEAD request
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.connect_timeout(opts.connect_timeout)?;
    easy.timeout(opts.timeout)?;
    easy.perform().context("HEAD request failed")?;
    easy.response_code().context("no response code")
}

fn http_get(url: &str, opts: &FetchOptions) -> Result<(u32, Vec<u8>)> {
    let mut body: Vec<u8> = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(url).context("invalid URL")?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.connect_timeout(opts.connect_timeout)?;
    easy.timeout(opts.timeout)?;

    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform().context("GET request failed")?;
    }

    let code = easy.response_code().context("no response code")?;
    Ok((code, body))
}
