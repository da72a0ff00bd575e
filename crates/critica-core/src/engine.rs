//! Engine orchestrator.
//!
//! Wires the local analyzers to the optional collaborators: claim
//! verification for documents, text generation for didactic explanations
//! and a finding store for persistence. Collaborators are handed in
//! explicitly; the engine never reads configuration itself.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::answer::{AnswerAnalyzer, AnswerReport};
use crate::document::{build_document_report, has_verifiable_claims, DocumentAnalyzer};
use crate::error::EngineError;
use crate::model::{AnswerAnalysisRequest, DocumentAnalysisRequest, RelatedEntity};
use crate::parser::{parse_didactic_report, DidacticReport};
use crate::report::{AnalysisReport, VerificationStatus};
use crate::sanitize::{sanitize_generated, ReplacementTable, SanitizationReport};
use crate::traits::{ClaimVerifier, CompletionRequest, FindingStore, TextGenerator};
use crate::verification::{VerificationAugmenter, VerificationReport, VerificationSettings};

/// Document analysis result with per-sentence verification detail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReport {
    pub report: AnalysisReport,
    /// Present only when verification actually ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification: Option<VerificationReport>,
}

impl DocumentReport {
    /// The user-facing error to surface when verification was requested but
    /// could not run.
    pub fn unavailable_error(&self) -> Option<EngineError> {
        match &self.report.verification {
            VerificationStatus::Unavailable { reason } => {
                Some(EngineError::VerificationUnavailable(reason.clone()))
            }
            _ => None,
        }
    }
}

/// Request for a generated didactic explanation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DidacticRequest {
    /// Topic or question to explain.
    pub prompt: String,
    /// Vocabulary the explanation must not contain.
    #[serde(default)]
    pub banned_terms: Vec<String>,
    /// Revision instruction, e.g. "amplía el glosario".
    #[serde(default)]
    pub instruction: Option<String>,
    /// Previous version of the explanation, used to validate the instruction.
    #[serde(default)]
    pub previous: Option<String>,
}

/// Sanitized, parsed explanation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DidacticOutcome {
    pub report: DidacticReport,
    pub sanitization: SanitizationReport,
    pub model: String,
    pub latency_ms: u64,
}

/// The analysis engine.
pub struct Engine {
    document: DocumentAnalyzer,
    answer: AnswerAnalyzer,
    augmenter: Option<VerificationAugmenter>,
    generator: Option<Arc<dyn TextGenerator>>,
    store: Option<Arc<dyn FindingStore>>,
    replacements: ReplacementTable,
}

impl Default for Engine {
    fn default() -> Self {
        EngineBuilder::default().build()
    }
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn has_verifier(&self) -> bool {
        self.augmenter.is_some()
    }

    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    /// Local patterns, then verification when requested and the text has
    /// verifiable claims. Local findings are always returned.
    pub async fn analyze_document(&self, request: &DocumentAnalysisRequest) -> DocumentReport {
        let mut findings = self.document.local_findings(&request.text);

        let (status, verification) = if !request.verify {
            (VerificationStatus::NotRequested, None)
        } else if !has_verifiable_claims(&request.text) {
            (VerificationStatus::NoVerifiableClaims, None)
        } else {
            match &self.augmenter {
                None => (
                    VerificationStatus::Unavailable {
                        reason: "no claim verifier configured".to_string(),
                    },
                    None,
                ),
                Some(augmenter) => match augmenter
                    .verify(&request.text, &request.language_hint)
                    .await
                {
                    Ok(report) => {
                        findings.extend(report.findings());
                        (
                            VerificationStatus::Completed {
                                sentences_checked: report.checked_count(),
                                sentences_skipped: report.skipped().len(),
                            },
                            Some(report),
                        )
                    }
                    Err(e) => {
                        tracing::warn!("verification unavailable: {e:#}");
                        (
                            VerificationStatus::Unavailable {
                                reason: format!("{e:#}"),
                            },
                            None,
                        )
                    }
                },
            }
        };

        DocumentReport {
            report: build_document_report(findings, status),
            verification,
        }
    }

    /// Analyze, then replace the stored findings for `related`.
    pub async fn analyze_and_persist(
        &self,
        request: &DocumentAnalysisRequest,
        related: &RelatedEntity,
    ) -> Result<DocumentReport> {
        let store = self
            .store
            .as_ref()
            .context("no finding store configured")?;
        let result = self.analyze_document(request).await;
        store
            .replace_findings(related, &result.report.findings)
            .await
            .with_context(|| format!("failed to persist findings for {related}"))?;
        Ok(result)
    }

    pub fn analyze_answer(&self, request: &AnswerAnalysisRequest) -> AnswerReport {
        self.answer.analyze(request)
    }

    /// Generate, sanitize and parse a didactic explanation.
    pub async fn generate_didactic(
        &self,
        request: &DidacticRequest,
    ) -> Result<DidacticOutcome, EngineError> {
        let generator = self.generator.as_ref().ok_or_else(|| {
            EngineError::GenerationUnavailable("no text generator configured".to_string())
        })?;

        let completion = generator
            .complete(&CompletionRequest::new(didactic_prompt(request)))
            .await
            .map_err(|e| {
                tracing::warn!(generator = generator.name(), "generation failed: {e:#}");
                EngineError::GenerationUnavailable(format!("{e:#}"))
            })?;

        let sanitization = sanitize_generated(
            &completion.content,
            &request.banned_terms,
            &self.replacements,
            request.instruction.as_deref(),
            request.previous.as_deref(),
        );
        let mut report = parse_didactic_report(&sanitization.text);
        report.warnings.extend(sanitization.warnings.iter().cloned());

        tracing::info!(
            model = %completion.model,
            replacements = sanitization.replacements,
            warnings = report.warnings.len(),
            "didactic explanation generated"
        );
        Ok(DidacticOutcome {
            report,
            sanitization,
            model: completion.model,
            latency_ms: completion.latency_ms,
        })
    }
}

fn didactic_prompt(request: &DidacticRequest) -> String {
    let mut prompt = request.prompt.clone();
    if let Some(previous) = &request.previous {
        prompt.push_str("\n\nVersión anterior:\n");
        prompt.push_str(previous);
    }
    if let Some(instruction) = &request.instruction {
        prompt.push_str("\n\nInstrucción: ");
        prompt.push_str(instruction);
    }
    if !request.banned_terms.is_empty() {
        prompt.push_str("\n\nNo uses estas palabras: ");
        prompt.push_str(&request.banned_terms.join(", "));
    }
    prompt
}

/// Builder for [`Engine`].
#[derive(Default)]
pub struct EngineBuilder {
    verifier: Option<(Arc<dyn ClaimVerifier>, VerificationSettings)>,
    generator: Option<Arc<dyn TextGenerator>>,
    store: Option<Arc<dyn FindingStore>>,
    replacements: Option<ReplacementTable>,
}

impl EngineBuilder {
    pub fn verifier(
        mut self,
        verifier: Arc<dyn ClaimVerifier>,
        settings: VerificationSettings,
    ) -> Self {
        self.verifier = Some((verifier, settings));
        self
    }

    pub fn generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn store(mut self, store: Arc<dyn FindingStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn replacements(mut self, table: ReplacementTable) -> Self {
        self.replacements = Some(table);
        self
    }

    pub fn build(self) -> Engine {
        Engine {
            document: DocumentAnalyzer::default(),
            answer: AnswerAnalyzer::default(),
            augmenter: self
                .verifier
                .map(|(verifier, settings)| VerificationAugmenter::new(verifier, settings)),
            generator: self.generator,
            store: self.store,
            replacements: self.replacements.unwrap_or_default(),
        }
    }
}
