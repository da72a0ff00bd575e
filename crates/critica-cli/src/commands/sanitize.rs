//! The `critica sanitize` command.

use std::path::PathBuf;

use anyhow::Result;

use critica_core::sanitize::{sanitize_generated, ReplacementTable};

use super::{read_input, split_list, OutputFormat};

pub fn execute(
    input: PathBuf,
    banned: Option<String>,
    replace: Vec<String>,
    instruction: Option<String>,
    original: Option<PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let text = read_input(&input)?;
    let banned = split_list(banned.as_deref());

    let mut table = ReplacementTable::default();
    for pair in &replace {
        let (term, substitute) = pair
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("invalid --replace value {pair:?}, expected TERM=SUBSTITUTE"))?;
        table = table.with(term.trim(), substitute.trim());
    }

    let original = original.map(|p| read_input(&p)).transpose()?;
    let report = sanitize_generated(
        &text,
        banned.as_slice(),
        &table,
        instruction.as_deref(),
        original.as_deref(),
    );

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text | OutputFormat::Markdown => {
            println!("{}", report.text);
            eprintln!("{} replacement(s)", report.replacements);
            for (term, count) in &report.replaced_terms {
                eprintln!("  {term}: {count}");
            }
            for warning in &report.warnings {
                eprintln!("warning: {warning}");
            }
        }
    }

    Ok(())
}
