// src/output/summary.rs
//! Rendering of the final import summary as text or JSON.

use crate::error::AppError;
use crate::import::ImportReport;
use std::fmt::Write;
use std::time::Duration;

/// Output format of the final summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SummaryFormat {
    #[default]
    Text,
    Json,
}

pub fn render_summary(report: &ImportReport, format: SummaryFormat) -> Result<String, AppError> {
    match format {
        SummaryFormat::Text => Ok(summary_text(report)?),
        SummaryFormat::Json => Ok(format!("{}\n", serde_json::to_string_pretty(report)?)),
    }
}

fn seconds(duration: Duration) -> String {
    format!("{:.2}s", duration.as_secs_f64())
}

/// Human-readable per-phase summary.
pub fn summary_text(report: &ImportReport) -> Result<String, std::fmt::Error> {
    let stats = &report.stats;
    let mut out = String::new();

    writeln!(out, "Imported {} into document {}", report.source, report.document_id)?;
    writeln!(out, "  Started: {}", report.started_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
    writeln!(
        out,
        "  Phase 1 (creation): {} blocks in {} calls, {} segments [{}]",
        stats.blocks_created,
        stats.create_calls,
        report.segments,
        seconds(report.timings.creation)
    )?;
    if stats.images_uploaded + stats.images_degraded > 0 {
        writeln!(
            out,
            "    images: {} uploaded, {} kept as text",
            stats.images_uploaded, stats.images_degraded
        )?;
    }
    writeln!(
        out,
        "  Phase 2 (workers): diagrams {}/{} imported, tables {}/{} filled, {} retries ({} rate limited) [{}]",
        stats.diagrams_imported,
        report.diagrams_queued,
        stats.tables_filled,
        report.tables_queued,
        stats.retries,
        stats.rate_limited,
        seconds(report.timings.workers)
    )?;
    if report.fallback_ran {
        writeln!(
            out,
            "  Phase 3 (fallback): {} diagrams replaced by code blocks, {} failed [{}]",
            stats.fallbacks_applied,
            stats.fallbacks_failed,
            seconds(report.timings.fallback)
        )?;
    } else {
        writeln!(out, "  Phase 3 (fallback): not needed")?;
    }

    if !stats.failures.is_empty() {
        writeln!(out, "Completed with {} problems:", stats.failures.len())?;
        for failure in &stats.failures {
            writeln!(out, "  - {}", failure)?;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::{ImportStats, PhaseTimings};

    fn report() -> ImportReport {
        ImportReport {
            document_id: "doxcn123".to_string(),
            source: "notes.md".to_string(),
            started_at: chrono::DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            segments: 2,
            diagrams_queued: 1,
            tables_queued: 0,
            fallback_ran: true,
            timings: PhaseTimings::default(),
            stats: ImportStats {
                blocks_created: 4,
                create_calls: 2,
                diagrams_failed: 1,
                fallbacks_applied: 1,
                failures: vec!["diagram blk: syntax error".to_string()],
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_text_summary() {
        let text = summary_text(&report()).unwrap();
        assert!(text.starts_with("Imported notes.md into document doxcn123\n"));
        assert!(text.contains("  Started: 2023-11-14 22:13:20 UTC"));
        assert!(text.contains("diagrams 0/1 imported"));
        assert!(text.contains("1 diagrams replaced by code blocks"));
        assert!(text.contains("  - diagram blk: syntax error"));
    }

    #[test]
    fn test_json_summary() {
        let json = render_summary(&report(), SummaryFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["document_id"], "doxcn123");
        assert_eq!(value["stats"]["fallbacks_applied"], 1);
        assert_eq!(value["timings"]["creation"], 0);
    }
}
