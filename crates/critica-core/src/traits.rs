//! Collaborator traits for claim verification, text generation and
//! finding persistence.
//!
//! The async traits are implemented by the `critica-providers` crate.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::{Finding, RelatedEntity};

// ---------------------------------------------------------------------------
// Claim verification
// ---------------------------------------------------------------------------

/// Third-party fact-check lookup.
#[async_trait]
pub trait ClaimVerifier: Send + Sync {
    /// Human-readable verifier name (e.g. "factcheck").
    fn name(&self) -> &str;

    /// Search published fact-checks for claims similar to `query`.
    ///
    /// Rate limiting and timeouts must surface as
    /// [`crate::error::ProviderError`] inside the returned `anyhow::Error`.
    async fn search(&self, query: &str, language_hint: &str) -> anyhow::Result<Vec<ClaimMatch>>;
}

/// A published claim similar to the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimMatch {
    pub claim_text: String,
    #[serde(default)]
    pub reviews: Vec<ClaimReview>,
}

/// One fact-checker's verdict on a claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimReview {
    pub publisher_name: String,
    /// Free-text rating, e.g. "Falso" or "Mostly false".
    pub verdict_text: String,
    pub url: String,
}

// ---------------------------------------------------------------------------
// Text generation
// ---------------------------------------------------------------------------

/// Generative-text backend used for didactic explanations.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Human-readable generator name (e.g. "openai").
    fn name(&self) -> &str;

    async fn complete(&self, request: &CompletionRequest) -> anyhow::Result<Completion>;
}

/// Request to the generative-text service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub prompt: String,
    #[serde(default)]
    pub system_prompt: Option<String>,
    pub max_tokens: u32,
    pub temperature: f64,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_prompt: Some(DEFAULT_SYSTEM_PROMPT.to_string()),
            max_tokens: 2048,
            temperature: 0.4,
        }
    }
}

/// Response from the generative-text service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    /// Raw generated text.
    pub content: String,
    /// Model that actually generated the response.
    pub model: String,
    /// Latency in milliseconds.
    pub latency_ms: u64,
}

/// Default system prompt for didactic explanations.
pub const DEFAULT_SYSTEM_PROMPT: &str = "Eres un asistente pedagógico. Explica con claridad y \
neutralidad. Estructura la respuesta en una explicación, una sección \"Ejemplos\" con ejemplos \
numerados, una sección \"Glosario\" con viñetas y una sección \"Preguntas de reflexión\" numerada.";

// ---------------------------------------------------------------------------
// Finding persistence
// ---------------------------------------------------------------------------

/// Storage for the findings attached to a related entity.
#[async_trait]
pub trait FindingStore: Send + Sync {
    /// Replace every stored finding for `related` with `findings`.
    async fn replace_findings(
        &self,
        related: &RelatedEntity,
        findings: &[Finding],
    ) -> anyhow::Result<()>;

    async fn findings_for(&self, related: &RelatedEntity) -> anyhow::Result<Vec<Finding>>;
}

/// Process-local [`FindingStore`].
#[derive(Default)]
pub struct InMemoryFindingStore {
    entries: Mutex<HashMap<RelatedEntity, Vec<Finding>>>,
}

impl InMemoryFindingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entities with stored findings.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl FindingStore for InMemoryFindingStore {
    async fn replace_findings(
        &self,
        related: &RelatedEntity,
        findings: &[Finding],
    ) -> anyhow::Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("finding store lock poisoned"))?;
        entries.insert(related.clone(), findings.to_vec());
        tracing::debug!(%related, count = findings.len(), "findings replaced");
        Ok(())
    }

    async fn findings_for(&self, related: &RelatedEntity) -> anyhow::Result<Vec<Finding>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("finding store lock poisoned"))?;
        Ok(entries.get(related).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FindingType, Severity};

    #[tokio::test]
    async fn replace_is_not_merge() {
        let store = InMemoryFindingStore::new();
        let reading = RelatedEntity::new("reading", "42");

        let first = vec![
            Finding::new(FindingType::Generalization, Severity::High, 0.7, "a"),
            Finding::new(FindingType::Polarization, Severity::Medium, 0.72, "b"),
        ];
        store.replace_findings(&reading, &first).await.unwrap();
        assert_eq!(store.findings_for(&reading).await.unwrap().len(), 2);

        let second = vec![Finding::new(FindingType::AdHominem, Severity::High, 0.85, "c")];
        store.replace_findings(&reading, &second).await.unwrap();
        let stored = store.findings_for(&reading).await.unwrap();
        assert_eq!(stored, second);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn unknown_entity_has_no_findings() {
        let store = InMemoryFindingStore::new();
        let found = store
            .findings_for(&RelatedEntity::new("answer", "missing"))
            .await
            .unwrap();
        assert!(found.is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn completion_request_defaults() {
        let request = CompletionRequest::new("Explica la fotosíntesis");
        assert_eq!(request.system_prompt.as_deref(), Some(DEFAULT_SYSTEM_PROMPT));
        assert_eq!(request.max_tokens, 2048);
    }
}
