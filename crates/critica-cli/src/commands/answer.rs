//! The `critica answer` command.

use std::path::PathBuf;

use anyhow::{anyhow, Result};

use critica_core::model::{AnswerAnalysisRequest, Question, QuestionType};
use critica_core::Engine;

use super::{findings_table, read_input, OutputFormat};

pub fn execute(
    input: PathBuf,
    prompt: Option<String>,
    question_type: Option<String>,
    source: Option<PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let answer = read_input(&input)?;

    let mut request = AnswerAnalysisRequest::new(answer);
    match (prompt, question_type) {
        (Some(prompt), qt) => {
            let question_type = match qt {
                Some(raw) => raw.parse::<QuestionType>().map_err(|e| anyhow!(e))?,
                None => QuestionType::Literal,
            };
            request = request.with_question(Question {
                prompt,
                question_type,
                hint: None,
            });
        }
        (None, Some(_)) => anyhow::bail!("--question-type requires --prompt"),
        (None, None) => {}
    }
    if let Some(path) = source {
        request = request.with_source(read_input(&path)?);
    }

    let result = Engine::default().analyze_answer(&request);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Markdown => {
            println!("{}", result.report.to_markdown());
            println!("## Recomendaciones\n");
            for tip in &result.recommendations {
                println!("- {tip}");
            }
        }
        OutputFormat::Text => {
            let report = &result.report;
            println!(
                "Score: {:.1}/12 ({}) {}",
                report.quality.score, report.quality.level, report.quality.message
            );
            if !report.findings.is_empty() {
                println!("{}", findings_table(&report.sorted_findings()));
            }
            if !result.key_concepts.is_empty() {
                println!(
                    "Concepts covered: {}/{} ({})",
                    result.mentioned_concepts.len(),
                    result.key_concepts.len(),
                    result.mentioned_concepts.join(", ")
                );
            }
            println!("\nRecommendations:");
            for tip in &result.recommendations {
                println!("  - {tip}");
            }
        }
    }

    Ok(())
}
