//! MetaDefender Cloud API adapter.
//!
//! Wraps the v4 REST endpoints used by the scan workflow: hash lookup, file
//! upload, and per-upload status. The API key is passed in the `apikey`
//! header on every request. The service signals "already scanned" by putting
//! a `file_id` field in the lookup body; that quirk is confined to
//! [`classify_lookup`] so the rest of the crate only sees [`HashLookup`].

use std::time::Duration;

use indexmap::IndexMap;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanError};
use crate::scan::ScanService;

const API_BASE: &str = "https://api.metadefender.com/v4";

/// Environment variable the API key is read from when not passed explicitly.
pub const API_KEY_ENV: &str = "METADEFENDER_API_KEY";

/// Opaque handle to an in-progress or completed scan job on the service.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadTicket {
    pub data_id: String,
}

/// Per-engine verdict within a scan report.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineResult {
    #[serde(default)]
    pub threat_found: Option<String>,
    #[serde(default)]
    pub scan_result_i: i32,
    #[serde(default)]
    pub def_time: String,
}

/// The `scan_results` object shared by the lookup and status endpoints.
///
/// `scan_details` keeps the service's insertion order; the reporter iterates
/// it as-is rather than re-sorting.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ScanResults {
    #[serde(default)]
    pub scan_all_result_a: String,
    #[serde(default)]
    pub progress_percentage: u32,
    #[serde(default)]
    pub scan_details: IndexMap<String, EngineResult>,
}

/// A scan report as returned by the service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScanReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    #[serde(default)]
    pub scan_results: ScanResults,
}

impl ScanReport {
    /// A report is complete only once every engine has run.
    pub fn is_complete(&self) -> bool {
        self.scan_results.progress_percentage >= 100
    }
}

/// Outcome of a hash lookup, decided by [`classify_lookup`].
#[derive(Debug, Clone)]
pub enum HashLookup {
    /// The service already has a completed scan for this digest.
    Hit(ScanReport),
    /// Unknown digest; the file must be uploaded.
    Miss,
}

/// Decide hit/miss from a lookup response body.
///
/// The service has no explicit status field here: a cached report carries
/// `file_id`, anything else (including its "hash not found" body) does not.
pub fn classify_lookup(body: serde_json::Value) -> Result<HashLookup> {
    if body.get("file_id").is_none() {
        return Ok(HashLookup::Miss);
    }
    let report: ScanReport =
        serde_json::from_value(body).map_err(|e| ScanError::Protocol(e.to_string()))?;
    Ok(HashLookup::Hit(report))
}

/// Blocking client for the MetaDefender Cloud v4 API.
#[derive(Debug)]
pub struct MetaDefenderClient {
    base_url: String,
    api_key: String,
    client: reqwest::blocking::Client,
}

impl MetaDefenderClient {
    pub fn new(api_key: &str, timeout: Duration) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(ScanError::Config("API key is empty".into()));
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ScanError::from_transport)?;
        Ok(Self {
            base_url: API_BASE.to_string(),
            api_key: api_key.trim().to_string(),
            client,
        })
    }

    /// Point the client at a different server. Used against self-hosted
    /// MetaDefender Core installs, which expose the same v4 surface.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn check_status(resp: reqwest::blocking::Response) -> Result<reqwest::blocking::Response> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(ScanError::Http { status, body });
        }
        Ok(resp)
    }
}

impl ScanService for MetaDefenderClient {
    fn lookup_hash(&mut self, digest: &str) -> Result<HashLookup> {
        let url = format!("{}/hash/{}", self.base_url, digest);
        tracing::debug!(%url, "hash lookup");
        let resp = self
            .client
            .get(&url)
            .header("apikey", &self.api_key)
            .send()
            .map_err(ScanError::from_transport)?;

        // Unknown hashes come back as 404 with an error body.
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(HashLookup::Miss);
        }
        let resp = Self::check_status(resp)?;
        let body: serde_json::Value = resp.json().map_err(ScanError::from_transport)?;
        classify_lookup(body)
    }

    fn upload(&mut self, bytes: Vec<u8>) -> Result<UploadTicket> {
        let url = format!("{}/file", self.base_url);
        tracing::debug!(%url, size = bytes.len(), "uploading file");
        let resp = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(bytes)
            .send()
            .map_err(ScanError::from_transport)?;

        let resp = Self::check_status(resp)?;
        resp.json::<UploadTicket>().map_err(ScanError::from_transport)
    }

    fn fetch_report(&mut self, data_id: &str) -> Result<ScanReport> {
        let url = format!("{}/file/{}", self.base_url, data_id);
        let resp = self
            .client
            .get(&url)
            .header("apikey", &self.api_key)
            .header("x-file-metadata", "0")
            .send()
            .map_err(ScanError::from_transport)?;

        let resp = Self::check_status(resp)?;
        resp.json::<ScanReport>().map_err(ScanError::from_transport)
    }
}
