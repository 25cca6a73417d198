//! metascan - submits a file to MetaDefender Cloud and reports per-engine results.
//!
//! Usage:
//!   metascan suspicious.exe --apikey YOUR_KEY
//!   METADEFENDER_API_KEY=YOUR_KEY metascan suspicious.exe --format json
//!
//! Files already known to the service (by SHA-1) are reported from the scan
//! cache without re-uploading.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

use metascan_core::error::{Result, ScanError};
use metascan_core::metadefender::{MetaDefenderClient, API_KEY_ENV};
use metascan_core::report::{render, OutputFormat};
use metascan_core::scan::{run_scan, PollConfig, ScanRequest};

#[derive(Parser)]
#[command(name = "metascan")]
#[command(about = "MetaDefender Cloud file scanning client")]
struct Cli {
    /// File to scan
    file: PathBuf,

    /// MetaDefender Cloud API key (falls back to METADEFENDER_API_KEY)
    #[arg(short, long)]
    apikey: Option<String>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// Scan server base URL, for self-hosted MetaDefender Core installs
    #[arg(long)]
    base_url: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout: u64,

    /// Give up after this many status polls
    #[arg(long, default_value = "60")]
    max_attempts: u32,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn resolve_api_key(flag: Option<String>) -> Result<String> {
    match flag {
        Some(key) => Ok(key),
        None => std::env::var(API_KEY_ENV)
            .map_err(|_| ScanError::Config(format!("{API_KEY_ENV} environment variable not set"))),
    }
}

fn run(cli: Cli) -> Result<()> {
    let api_key = resolve_api_key(cli.apikey)?;
    let request = ScanRequest::new(cli.file, api_key)?;

    let mut client = MetaDefenderClient::new(&request.api_key, Duration::from_secs(cli.timeout))?;
    if let Some(base_url) = &cli.base_url {
        client = client.with_base_url(base_url);
    }
    let poll = PollConfig {
        max_attempts: cli.max_attempts,
        ..PollConfig::default()
    };

    eprintln!("[*] Scanning {}...", request.file_path.display());
    let outcome = run_scan(&mut client, &request, &poll, |progress| {
        eprintln!("[*] scan progress: {progress}%");
    })?;

    if outcome.cache_hit {
        eprintln!("[*] Result served from the scan cache");
    }

    // Echo the path exactly as it was given.
    let filename = request.file_path.display().to_string();
    print!("{}", render(&filename, &outcome.report, cli.format));

    Ok(())
}
