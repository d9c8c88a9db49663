//! Session report rendering.
//!
//! Everything goes to stderr: stdout may be one of the sinks.

use anyhow::{Context, Result};
use fanout::{SessionReport, SinkStatus};

/// Print a human-readable summary
pub fn print_summary(report: &SessionReport) {
    eprint!("{}", render_summary(report));
}

/// Print the report as pretty JSON
pub fn print_json(report: &SessionReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    eprintln!("{json}");
    Ok(())
}

fn render_summary(report: &SessionReport) -> String {
    let mut out = String::new();
    out.push_str("\n=== Fan-out Summary ===\n");
    out.push_str(&format!("Outcome: {}\n", report.outcome.as_str()));
    out.push_str(&format!(
        "Read: {} bytes in {} chunks ({:.2}s, {:.0} B/s)\n",
        report.bytes,
        report.chunks,
        report.elapsed.as_secs_f64(),
        report.throughput()
    ));
    out.push_str(&format!("Chunk size: {}\n", report.chunk_bytes));

    if !report.sinks.is_empty() {
        out.push_str(&format!("Sinks ({}):\n", report.sinks.len()));
        for sink in &report.sinks {
            let marker = match sink.status {
                SinkStatus::Live | SinkStatus::Closed => "ok",
                SinkStatus::Detached => "detached",
                SinkStatus::Failed => "FAILED",
            };
            out.push_str(&format!(
                "  - {} [{}] {} bytes, {} chunks, {} failures, {} skipped\n",
                sink.name,
                marker,
                sink.metrics.bytes_written,
                sink.metrics.chunks_written,
                sink.metrics.failure_count,
                sink.metrics.skipped_count
            ));
            if let Some(err) = &sink.close_error {
                out.push_str(&format!("    close failed: {err}\n"));
            }
        }
    }
    out
}
