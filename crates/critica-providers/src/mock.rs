//! Mock collaborators for exercising the engine without network access.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use critica_core::error::ProviderError;
use critica_core::traits::{
    ClaimMatch, ClaimReview, ClaimVerifier, Completion, CompletionRequest, TextGenerator,
};

/// Failure a mock can be told to produce on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    RateLimited,
    Timeout,
    MissingCredential,
}

impl MockFailure {
    fn to_error(self, collaborator: &str) -> ProviderError {
        match self {
            MockFailure::RateLimited => ProviderError::RateLimited {
                retry_after_ms: 1000,
            },
            MockFailure::Timeout => ProviderError::Timeout(1),
            MockFailure::MissingCredential => {
                ProviderError::MissingCredential(collaborator.to_string())
            }
        }
    }
}

/// Claim verifier answering from a table keyed by query substring.
pub struct MockVerifier {
    responses: HashMap<String, Vec<ClaimMatch>>,
    failure: Option<MockFailure>,
    call_count: AtomicU32,
    last_query: Mutex<Option<String>>,
}

impl MockVerifier {
    /// A verifier that never finds any claim.
    pub fn empty() -> Self {
        Self::new(HashMap::new())
    }

    pub fn new(responses: HashMap<String, Vec<ClaimMatch>>) -> Self {
        Self {
            responses,
            failure: None,
            call_count: AtomicU32::new(0),
            last_query: Mutex::new(None),
        }
    }

    /// A verifier whose every call fails with `failure`.
    pub fn failing(failure: MockFailure) -> Self {
        Self {
            failure: Some(failure),
            ..Self::empty()
        }
    }

    /// Register one claim reviewed by a single publisher.
    pub fn with_verdict(mut self, key: &str, claim_text: &str, verdict: &str) -> Self {
        self.responses
            .entry(key.to_string())
            .or_default()
            .push(ClaimMatch {
                claim_text: claim_text.to_string(),
                reviews: vec![ClaimReview {
                    publisher_name: "Mock Checker".to_string(),
                    verdict_text: verdict.to_string(),
                    url: format!("https://checks.example/{}", key.replace(' ', "-")),
                }],
            });
        self
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn last_query(&self) -> Option<String> {
        self.last_query.lock().ok().and_then(|q| q.clone())
    }
}

#[async_trait]
impl ClaimVerifier for MockVerifier {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search(&self, query: &str, _language_hint: &str) -> anyhow::Result<Vec<ClaimMatch>> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut last) = self.last_query.lock() {
            *last = Some(query.to_string());
        }

        if let Some(failure) = self.failure {
            return Err(failure.to_error("mock verifier").into());
        }

        Ok(self
            .responses
            .iter()
            .filter(|(key, _)| query.contains(key.as_str()))
            .flat_map(|(_, claims)| claims.iter().cloned())
            .collect())
    }
}

/// Text generator returning canned explanations.
pub struct MockGenerator {
    /// Map of prompt substring to response.
    responses: HashMap<String, String>,
    default_response: String,
    failure: Option<MockFailure>,
    call_count: AtomicU32,
    last_request: Mutex<Option<CompletionRequest>>,
}

impl MockGenerator {
    pub fn new(responses: HashMap<String, String>) -> Self {
        Self {
            responses,
            default_response: "Explicación de prueba.".to_string(),
            failure: None,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// A generator that always returns `response`.
    pub fn with_fixed_response(response: &str) -> Self {
        Self {
            default_response: response.to_string(),
            ..Self::new(HashMap::new())
        }
    }

    pub fn failing(failure: MockFailure) -> Self {
        Self {
            failure: Some(failure),
            ..Self::new(HashMap::new())
        }
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.last_request.lock().ok().and_then(|r| r.clone())
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &CompletionRequest) -> anyhow::Result<Completion> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request.clone());
        }

        if let Some(failure) = self.failure {
            return Err(failure.to_error("mock generator").into());
        }

        let content = self
            .responses
            .iter()
            .find(|(key, _)| request.prompt.contains(key.as_str()))
            .map(|(_, v)| v.clone())
            .unwrap_or_else(|| self.default_response.clone());

        Ok(Completion {
            content,
            model: "mock-model".to_string(),
            latency_ms: 1,
        })
    }
}
