//! The `critica explain` command.

use std::path::PathBuf;

use anyhow::Result;

use critica_core::engine::DidacticRequest;
use critica_providers::{engine_from_config, load_config_from};

use super::parse::to_markdown;
use super::{read_input, split_list, OutputFormat};

pub async fn execute(
    prompt: String,
    banned: Option<String>,
    instruction: Option<String>,
    previous: Option<PathBuf>,
    format: OutputFormat,
    config_path: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(!prompt.trim().is_empty(), "prompt must not be empty");

    let config = load_config_from(config_path.as_deref())?;
    let engine = engine_from_config(&config);

    let request = DidacticRequest {
        prompt,
        banned_terms: split_list(banned.as_deref()),
        instruction,
        previous: previous.map(|p| read_input(&p)).transpose()?,
    };

    let outcome = match engine.generate_didactic(&request).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::debug!("{e}");
            anyhow::bail!("{}", e.user_message());
        }
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
        OutputFormat::Text | OutputFormat::Markdown => {
            print!("{}", to_markdown(&outcome.report));
            eprintln!(
                "model {} ({}ms), {} replacement(s)",
                outcome.model, outcome.latency_ms, outcome.sanitization.replacements
            );
            for warning in &outcome.report.warnings {
                eprintln!("warning: {warning}");
            }
        }
    }
    Ok(())
}
