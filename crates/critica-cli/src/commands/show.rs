//! The `critica show` command.

use std::path::PathBuf;

use anyhow::Result;

use critica_core::report::AnalysisReport;

use super::{findings_table, OutputFormat};

pub fn execute(report_path: PathBuf, format: OutputFormat) -> Result<()> {
    let report = AnalysisReport::load_json(&report_path)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Markdown => println!("{}", report.to_markdown()),
        OutputFormat::Text => {
            println!(
                "Report {} ({:?}, {})",
                report.id,
                report.kind,
                report.created_at.format("%Y-%m-%d %H:%M")
            );
            println!(
                "Quality: {:.1} ({}) {}",
                report.quality.score, report.quality.level, report.quality.message
            );
            if let Some(most_common) = report.statistics.most_common_type {
                println!(
                    "{} finding(s), mostly {most_common}, average confidence {:.0}%",
                    report.statistics.total,
                    report.statistics.average_confidence * 100.0
                );
            }
            if !report.findings.is_empty() {
                println!("{}", findings_table(&report.sorted_findings()));
            }
        }
    }
    Ok(())
}
