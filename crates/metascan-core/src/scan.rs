//! Scan workflow: hash, look up, and on a cache miss upload and poll.
//!
//! The remote service sits behind [`ScanService`] so the workflow can be
//! exercised against an in-memory stub. Polling is bounded with exponential
//! backoff rather than a busy loop; progress is surfaced through a callback
//! each iteration.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, ScanError};
use crate::hash::sha1_file;
use crate::metadefender::{HashLookup, ScanReport, UploadTicket};

/// What the workflow needs from the remote service.
pub trait ScanService {
    /// Query the scan cache by file digest.
    fn lookup_hash(&mut self, digest: &str) -> Result<HashLookup>;
    /// Submit raw file bytes for scanning.
    fn upload(&mut self, bytes: Vec<u8>) -> Result<UploadTicket>;
    /// Fetch the current report for an uploaded file.
    fn fetch_report(&mut self, data_id: &str) -> Result<ScanReport>;
}

/// A validated scan request. Construction is the only place input is
/// checked, so the workflow itself never touches parsing concerns.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub file_path: PathBuf,
    pub api_key: String,
}

impl ScanRequest {
    pub fn new(file_path: PathBuf, api_key: String) -> Result<Self> {
        let api_key = api_key.trim().to_string();
        if api_key.is_empty() {
            return Err(ScanError::Config("API key is empty".into()));
        }
        if !file_path.is_file() {
            return Err(ScanError::FileNotFound(file_path));
        }
        Ok(Self { file_path, api_key })
    }
}

/// Backoff schedule for status polling.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay before the second status check; doubles each round.
    pub initial_delay: Duration,
    /// Cap on the per-round delay.
    pub max_delay: Duration,
    /// Give up after this many status checks.
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            max_attempts: 60,
        }
    }
}

/// A completed scan, plus whether the service already had it cached.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub report: ScanReport,
    pub cache_hit: bool,
}

/// Run the full workflow for one file.
///
/// `on_progress` is called with the current percentage on every poll round;
/// cache hits skip straight to the finished report without invoking it.
pub fn run_scan<S: ScanService>(
    service: &mut S,
    request: &ScanRequest,
    poll: &PollConfig,
    mut on_progress: impl FnMut(u32),
) -> Result<ScanOutcome> {
    let digest = sha1_file(&request.file_path)?;
    tracing::debug!(%digest, path = %request.file_path.display(), "computed file digest");

    if let HashLookup::Hit(report) = service.lookup_hash(&digest)? {
        tracing::debug!("cache hit, skipping upload");
        return Ok(ScanOutcome {
            report,
            cache_hit: true,
        });
    }

    let bytes = fs::read(&request.file_path).map_err(|source| ScanError::Io {
        path: request.file_path.clone(),
        source,
    })?;
    let ticket = service.upload(bytes)?;
    tracing::debug!(data_id = %ticket.data_id, "file uploaded");

    let report = poll_until_complete(service, &ticket.data_id, poll, &mut on_progress)?;
    Ok(ScanOutcome {
        report,
        cache_hit: false,
    })
}

/// Poll the service until `progress_percentage` reaches 100 or the attempt
/// budget runs out. A transport failure in any round aborts the loop.
pub fn poll_until_complete<S: ScanService>(
    service: &mut S,
    data_id: &str,
    poll: &PollConfig,
    on_progress: &mut dyn FnMut(u32),
) -> Result<ScanReport> {
    let mut delay = poll.initial_delay;
    let mut last_progress = 0;

    for attempt in 1..=poll.max_attempts {
        let report = service.fetch_report(data_id)?;
        let progress = report.scan_results.progress_percentage;
        on_progress(progress);
        if report.is_complete() {
            return Ok(report);
        }
        last_progress = progress;
        tracing::debug!(attempt, progress, "scan in progress");

        if attempt < poll.max_attempts {
            std::thread::sleep(delay);
            delay = (delay * 2).min(poll.max_delay);
        }
    }

    Err(ScanError::Incomplete {
        attempts: poll.max_attempts,
        last_progress,
    })
}
