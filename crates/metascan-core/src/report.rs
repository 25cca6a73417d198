//! Output formatting for scan reports.

use std::fmt::Write;

use crate::metadefender::ScanReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {s}. Use 'text' or 'json'.")),
        }
    }
}

pub fn render(filename: &str, report: &ScanReport, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => render_text(filename, report),
        OutputFormat::Json => render_json(filename, report),
    }
}

/// The service reports a clean file as "No Threat Detected"; everything
/// else ("Infected", "Suspicious", ...) passes through verbatim.
fn display_status(status: &str) -> &str {
    if status == "No Threat Detected" {
        "Clean"
    } else {
        status
    }
}

fn render_text(filename: &str, report: &ScanReport) -> String {
    let results = &report.scan_results;
    let mut out = String::new();

    let _ = writeln!(out, "filename: {filename}");
    let _ = writeln!(
        out,
        "overall status: {}",
        display_status(&results.scan_all_result_a)
    );

    // Service order, never re-sorted.
    for (engine, result) in &results.scan_details {
        let threat = result
            .threat_found
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or("Clean");
        let _ = writeln!(out, "engine: {engine}");
        let _ = writeln!(out, "threat_found: {threat}");
        let _ = writeln!(out, "scan_result: {}", result.scan_result_i);
        let _ = writeln!(out, "def_time: {}", result.def_time);
    }

    out
}

fn render_json(filename: &str, report: &ScanReport) -> String {
    let output = serde_json::json!({
        "filename": filename,
        "overall_status": display_status(&report.scan_results.scan_all_result_a),
        "report": report,
    });
    serde_json::to_string_pretty(&output).unwrap_or_default()
}
