//! The `critica document` command.

use std::path::PathBuf;

use anyhow::Result;

use critica_core::model::DocumentAnalysisRequest;
use critica_core::report::VerificationStatus;
use critica_core::verification::SentenceOutcome;
use critica_core::Engine;
use critica_providers::{engine_from_config, load_config_from};

use super::{findings_table, read_input, OutputFormat};

pub async fn execute(
    input: PathBuf,
    verify: bool,
    language: Option<String>,
    format: OutputFormat,
    save: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let text = read_input(&input)?;
    anyhow::ensure!(!text.trim().is_empty(), "input text is empty");

    // Collaborators are only needed when verification was asked for.
    let engine = if verify {
        let config = load_config_from(config_path.as_deref())?;
        engine_from_config(&config)
    } else {
        Engine::default()
    };

    let mut request = DocumentAnalysisRequest::new(text);
    if verify {
        request = request.with_verification();
    }
    if let Some(lang) = language {
        request.language_hint = lang;
    }

    let result = engine.analyze_document(&request).await;
    if let Some(err) = result.unavailable_error() {
        tracing::warn!("{err}");
        eprintln!("{}", err.user_message());
    }

    if let Some(path) = &save {
        result.report.save_json(path)?;
        eprintln!("Report saved to {}", path.display());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Markdown => println!("{}", result.report.to_markdown()),
        OutputFormat::Text => {
            let report = &result.report;
            println!(
                "Quality: {:.1} ({}) {}",
                report.quality.score, report.quality.level, report.quality.message
            );
            match &report.verification {
                VerificationStatus::NotRequested => {}
                VerificationStatus::NoVerifiableClaims => {
                    println!("Verification: no verifiable claims found")
                }
                VerificationStatus::Unavailable { reason } => {
                    println!("Verification: unavailable ({reason})")
                }
                VerificationStatus::Completed {
                    sentences_checked,
                    sentences_skipped,
                } => println!(
                    "Verification: {sentences_checked} sentence(s) checked, {sentences_skipped} skipped"
                ),
            }

            if report.findings.is_empty() {
                println!("No findings.");
            } else {
                println!("{} finding(s):", report.findings.len());
                println!("{}", findings_table(&report.sorted_findings()));
            }

            if let Some(verification) = &result.verification {
                for outcome in verification.skipped() {
                    if let SentenceOutcome::Skipped { sentence, reason } = outcome {
                        eprintln!("  skipped: {sentence} ({reason:?})");
                    }
                }
            }

            let terms = report.problematic_terms();
            if !terms.is_empty() {
                println!("Problematic terms: {}", terms.join(", "));
            }
        }
    }

    Ok(())
}
