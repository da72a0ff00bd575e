//! The `critica parse` command.

use std::path::PathBuf;

use anyhow::Result;

use critica_core::parser::{parse_didactic_report, DidacticReport};

use super::{read_input, OutputFormat};

pub fn execute(input: PathBuf, format: OutputFormat) -> Result<()> {
    let text = read_input(&input)?;
    let report = parse_didactic_report(&text);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Markdown => print!("{}", to_markdown(&report)),
        OutputFormat::Text => {
            println!(
                "{} paragraph(s), {} example(s), {} glossary item(s), {} question(s)",
                report.narrative.len(),
                report.examples.len(),
                report.glossary.len(),
                report.reflection_questions.len()
            );
            print!("{}", to_markdown(&report));
        }
    }
    Ok(())
}

pub fn to_markdown(report: &DidacticReport) -> String {
    let mut md = String::new();
    for paragraph in &report.narrative {
        md.push_str(paragraph);
        md.push_str("\n\n");
    }
    if !report.examples.is_empty() {
        md.push_str("## Ejemplos\n\n");
        for example in &report.examples {
            md.push_str(&format!("- {example}\n"));
        }
        md.push('\n');
    }
    if !report.glossary.is_empty() {
        md.push_str("## Glosario\n\n");
        for item in &report.glossary {
            md.push_str(&format!("- {item}\n"));
        }
        md.push('\n');
    }
    if !report.reflection_questions.is_empty() {
        md.push_str("## Preguntas de reflexión\n\n");
        for (i, question) in report.reflection_questions.iter().enumerate() {
            md.push_str(&format!("{}. {question}\n", i + 1));
        }
        md.push('\n');
    }
    md
}
