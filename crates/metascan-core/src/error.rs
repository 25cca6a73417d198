//! Error types for metascan.
//!
//! One variant per failure category, each with its own process exit code so
//! a calling shell can tell transport failures, local I/O problems, and an
//! exhausted poll budget apart.

use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// Unified error type for all metascan operations.
#[derive(Error, Debug)]
pub enum ScanError {
    /// The service answered with a non-success HTTP status.
    #[error("HTTP error ({status}): {body}")]
    Http { status: StatusCode, body: String },

    /// Could not reach the service at all.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The request exceeded the configured timeout.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// A request header could not be constructed.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Any other transport-level failure.
    #[error("Request error: {0}")]
    Request(String),

    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Local I/O failed.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The service answered with a body we could not make sense of.
    #[error("Unexpected response from scan service: {0}")]
    Protocol(String),

    /// The poll budget ran out before the scan finished.
    #[error("scan did not complete after {attempts} status checks (last progress {last_progress}%)")]
    Incomplete { attempts: u32, last_progress: u32 },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ScanError {
    /// Classify a `reqwest` failure into its transport category.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ScanError::Timeout(err.to_string())
        } else if err.is_connect() {
            ScanError::Connection(err.to_string())
        } else if err.is_builder() {
            ScanError::InvalidHeader(err.to_string())
        } else if err.is_decode() {
            ScanError::Protocol(err.to_string())
        } else {
            ScanError::Request(err.to_string())
        }
    }

    /// Distinct non-zero exit code per error category.
    pub fn exit_code(&self) -> i32 {
        match self {
            ScanError::Http { .. } => 2,
            ScanError::Connection(_) => 3,
            ScanError::Timeout(_) => 4,
            ScanError::InvalidHeader(_) => 5,
            ScanError::Request(_) => 6,
            ScanError::FileNotFound(_) => 7,
            ScanError::Io { .. } => 8,
            ScanError::Protocol(_) => 9,
            ScanError::Incomplete { .. } => 10,
            ScanError::Config(_) => 11,
        }
    }
}

/// Result type alias for metascan operations.
pub type Result<T> = std::result::Result<T, ScanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct_and_nonzero() {
        let errors = [
            ScanError::Http {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: String::new(),
            },
            ScanError::Connection("refused".into()),
            ScanError::Timeout("deadline".into()),
            ScanError::InvalidHeader("bad key".into()),
            ScanError::Request("other".into()),
            ScanError::FileNotFound(PathBuf::from("/missing")),
            ScanError::Io {
                path: PathBuf::from("/dir"),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            },
            ScanError::Protocol("not json".into()),
            ScanError::Incomplete {
                attempts: 60,
                last_progress: 85,
            },
            ScanError::Config("empty key".into()),
        ];

        let mut codes: Vec<i32> = errors.iter().map(|e| e.exit_code()).collect();
        assert!(codes.iter().all(|&c| c != 0));
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn http_error_message_carries_status_and_body() {
        let err = ScanError::Http {
            status: StatusCode::UNAUTHORIZED,
            body: "invalid apikey".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("401"));
        assert!(msg.contains("invalid apikey"));
    }

    #[test]
    fn incomplete_reports_last_progress() {
        let err = ScanError::Incomplete {
            attempts: 3,
            last_progress: 40,
        };
        assert!(err.to_string().contains("40%"));
        assert!(err.to_string().contains("3 status checks"));
    }
}
