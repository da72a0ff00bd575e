pub mod answer;
pub mod document;
pub mod explain;
pub mod init;
pub mod parse;
pub mod sanitize;
pub mod show;

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use comfy_table::{Cell, Table};

use critica_core::model::Finding;

/// How a command prints its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Markdown,
}

/// Read a file, or stdin when the path is `-`.
pub fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Split a comma-separated list, dropping blanks.
pub fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

pub fn findings_table(findings: &[&Finding]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "Type",
        "Severity",
        "Confidence",
        "Description",
        "Suggestion",
    ]);
    for f in findings {
        table.add_row(vec![
            Cell::new(f.finding_type),
            Cell::new(f.severity),
            Cell::new(format!("{:.0}%", f.confidence * 100.0)),
            Cell::new(&f.description),
            Cell::new(&f.suggestion),
        ]);
    }
    table
}
