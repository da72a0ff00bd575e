//! Verification Augmenter: checks document sentences against an external
//! fact-check collaborator.
//!
//! Each sentence yields its own [`SentenceOutcome`]. A rate limit, timeout or
//! other transient failure skips that sentence only; a missing or rejected
//! credential fails the whole batch.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::error::ProviderError;
use crate::model::{Finding, FindingSource, FindingType, Severity};
use crate::text::{fold, split_sentences, truncate_chars, word_count};
use crate::traits::{ClaimMatch, ClaimVerifier};

/// Tuning knobs for the augmenter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationSettings {
    /// Maximum sentences sent for lookup.
    #[serde(default = "default_max_sentences")]
    pub max_sentences: usize,
    /// Sentences shorter than this are not worth a lookup.
    #[serde(default = "default_min_words")]
    pub min_words: usize,
    /// Lookup queries are truncated to this many characters.
    #[serde(default = "default_query_chars")]
    pub query_chars: usize,
    /// Maximum lookups in flight.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Pause after an HTTP 429 before the next lookup may proceed.
    #[serde(default = "default_rate_limit_backoff_ms")]
    pub rate_limit_backoff_ms: u64,
    /// Reviews inspected per returned claim.
    #[serde(default = "default_reviews_per_claim")]
    pub reviews_per_claim: usize,
}

fn default_max_sentences() -> usize {
    5
}
fn default_min_words() -> usize {
    5
}
fn default_query_chars() -> usize {
    250
}
fn default_concurrency() -> usize {
    3
}
fn default_rate_limit_backoff_ms() -> u64 {
    1000
}
fn default_reviews_per_claim() -> usize {
    2
}

impl Default for VerificationSettings {
    fn default() -> Self {
        Self {
            max_sentences: default_max_sentences(),
            min_words: default_min_words(),
            query_chars: default_query_chars(),
            concurrency: default_concurrency(),
            rate_limit_backoff_ms: default_rate_limit_backoff_ms(),
            reviews_per_claim: default_reviews_per_claim(),
        }
    }
}

/// Why a sentence was not checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    RateLimited,
    Timeout,
    Failed(String),
}

/// Result of looking up one sentence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SentenceOutcome {
    Checked {
        sentence: String,
        findings: Vec<Finding>,
        claims_seen: usize,
    },
    Skipped {
        sentence: String,
        reason: SkipReason,
    },
}

impl SentenceOutcome {
    pub fn sentence(&self) -> &str {
        match self {
            SentenceOutcome::Checked { sentence, .. } | SentenceOutcome::Skipped { sentence, .. } => {
                sentence
            }
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, SentenceOutcome::Skipped { .. })
    }
}

/// All sentence outcomes, in document order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub outcomes: Vec<SentenceOutcome>,
}

impl VerificationReport {
    /// Findings from every checked sentence, in sentence order.
    pub fn findings(&self) -> Vec<Finding> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                SentenceOutcome::Checked { findings, .. } => Some(findings.iter().cloned()),
                SentenceOutcome::Skipped { .. } => None,
            })
            .flatten()
            .collect()
    }

    pub fn skipped(&self) -> Vec<&SentenceOutcome> {
        self.outcomes.iter().filter(|o| o.is_skipped()).collect()
    }

    pub fn checked_count(&self) -> usize {
        self.outcomes.len() - self.skipped().len()
    }

    /// Fraction of sentences skipped; `0.0` when nothing was looked up.
    pub fn skip_rate(&self) -> f64 {
        if self.outcomes.is_empty() {
            0.0
        } else {
            self.skipped().len() as f64 / self.outcomes.len() as f64
        }
    }
}

// ---------------------------------------------------------------------------
// Verdicts
// ---------------------------------------------------------------------------

/// Normalized class of a fact-checker's textual rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerdictClass {
    False,
    Misleading,
    Unproven,
}

// Folded (lowercase, no diacritics). Misleading is checked first so
// "parcialmente falso" is not read as plain false.
const MISLEADING_VERDICTS: &[&str] = &[
    "enganos",
    "misleading",
    "parcialmente",
    "partly",
    "partially",
    "mixture",
    "mixed",
    "exagerad",
    "half true",
    "fuera de contexto",
    "out of context",
];
const FALSE_VERDICTS: &[&str] = &[
    "falso",
    "falsa",
    "false",
    "incorrect",
    "pants on fire",
    "fake",
    "bulo",
];
const UNPROVEN_VERDICTS: &[&str] = &[
    "sin pruebas",
    "sin evidencia",
    "unproven",
    "no verificable",
    "unverified",
    "unsupported",
    "inconcluso",
];

pub fn classify_verdict(verdict: &str) -> Option<VerdictClass> {
    let folded = fold(verdict);
    let has = |table: &[&str]| table.iter().any(|v| folded.contains(v));
    if has(MISLEADING_VERDICTS) {
        Some(VerdictClass::Misleading)
    } else if has(FALSE_VERDICTS) {
        Some(VerdictClass::False)
    } else if has(UNPROVEN_VERDICTS) {
        Some(VerdictClass::Unproven)
    } else {
        None
    }
}

impl VerdictClass {
    fn finding_type(self) -> FindingType {
        match self {
            VerdictClass::False => FindingType::VerifiedMisinformation,
            VerdictClass::Misleading => FindingType::MisleadingInformation,
            VerdictClass::Unproven => FindingType::UnverifiedInformation,
        }
    }

    fn severity(self) -> Severity {
        match self {
            VerdictClass::False => Severity::High,
            VerdictClass::Misleading => Severity::Medium,
            VerdictClass::Unproven => Severity::Low,
        }
    }

    fn confidence(self) -> f64 {
        match self {
            VerdictClass::False => 0.90,
            VerdictClass::Misleading => 0.75,
            VerdictClass::Unproven => 0.50,
        }
    }
}

/// Map claim reviews to findings, keeping only high and medium severities.
pub fn findings_from_claims(
    sentence: &str,
    claims: &[ClaimMatch],
    reviews_per_claim: usize,
) -> Vec<Finding> {
    claims
        .iter()
        .flat_map(|claim| {
            claim
                .reviews
                .iter()
                .take(reviews_per_claim)
                .map(move |review| (claim, review))
        })
        .filter_map(|(claim, review)| {
            let class = classify_verdict(&review.verdict_text)?;
            let finding = Finding::new(
                class.finding_type(),
                class.severity(),
                class.confidence(),
                format!(
                    "{} califica como \"{}\" la afirmación: {}",
                    review.publisher_name, review.verdict_text, claim.claim_text
                ),
            )
            .at(sentence)
            .suggest("Contrasta el dato con la fuente original y corrige o matiza la afirmación.")
            .with_source(FindingSource {
                publisher: review.publisher_name.clone(),
                url: review.url.clone(),
            });
            Some(finding)
        })
        .filter(|f| f.severity >= Severity::Medium)
        .collect()
}

// ---------------------------------------------------------------------------
// Augmenter
// ---------------------------------------------------------------------------

/// Sentences eligible for lookup.
pub fn candidate_sentences(text: &str, settings: &VerificationSettings) -> Vec<String> {
    split_sentences(text)
        .into_iter()
        .filter(|s| word_count(s) >= settings.min_words)
        .take(settings.max_sentences)
        .collect()
}

/// Runs sentence lookups against a [`ClaimVerifier`] with bounded concurrency.
pub struct VerificationAugmenter {
    verifier: Arc<dyn ClaimVerifier>,
    settings: VerificationSettings,
}

impl VerificationAugmenter {
    pub fn new(verifier: Arc<dyn ClaimVerifier>, settings: VerificationSettings) -> Self {
        Self { verifier, settings }
    }

    pub fn settings(&self) -> &VerificationSettings {
        &self.settings
    }

    /// Look up every candidate sentence of `text`.
    ///
    /// Returns an error only when the verifier rejects or lacks its
    /// credential; every other failure becomes a skipped outcome.
    pub async fn verify(&self, text: &str, language_hint: &str) -> Result<VerificationReport> {
        let sentences = candidate_sentences(text, &self.settings);
        let semaphore = Arc::new(Semaphore::new(self.settings.concurrency.max(1)));
        let mut futures = FuturesUnordered::new();

        for (index, sentence) in sentences.into_iter().enumerate() {
            let verifier = Arc::clone(&self.verifier);
            let semaphore = Arc::clone(&semaphore);
            let settings = self.settings.clone();
            let language_hint = language_hint.to_string();

            futures.push(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|_| anyhow::anyhow!("semaphore closed"))?;

                let query = truncate_chars(&sentence, settings.query_chars);
                let outcome = match verifier.search(query, &language_hint).await {
                    Ok(claims) => SentenceOutcome::Checked {
                        findings: findings_from_claims(
                            &sentence,
                            &claims,
                            settings.reviews_per_claim,
                        ),
                        claims_seen: claims.len(),
                        sentence,
                    },
                    Err(e) => {
                        let permanent = matches!(
                            e.downcast_ref::<ProviderError>(),
                            Some(pe) if pe.is_permanent()
                        );
                        if permanent {
                            return Err(e);
                        }
                        let reason = match e.downcast_ref::<ProviderError>() {
                            Some(ProviderError::RateLimited { .. }) => {
                                tokio::time::sleep(Duration::from_millis(
                                    settings.rate_limit_backoff_ms,
                                ))
                                .await;
                                SkipReason::RateLimited
                            }
                            Some(ProviderError::Timeout(_)) => SkipReason::Timeout,
                            _ => SkipReason::Failed(format!("{e:#}")),
                        };
                        tracing::warn!(?reason, "verification skipped a sentence");
                        SentenceOutcome::Skipped { sentence, reason }
                    }
                };
                Ok::<_, anyhow::Error>((index, outcome))
            });
        }

        let mut outcomes = Vec::with_capacity(futures.len());
        while let Some(result) = futures.next().await {
            outcomes.push(result?);
        }
        outcomes.sort_by_key(|(index, _)| *index);

        let report = VerificationReport {
            outcomes: outcomes.into_iter().map(|(_, o)| o).collect(),
        };
        tracing::info!(
            checked = report.checked_count(),
            skipped = report.skipped().len(),
            "verification finished"
        );
        Ok(report)
    }
}
