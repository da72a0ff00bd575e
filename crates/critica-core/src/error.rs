//! Error types for collaborators and the engine.
//!
//! `ProviderError` is defined here rather than in `critica-providers` so the
//! engine can downcast and classify collaborator failures (rate limits,
//! timeouts) without string matching.

use thiserror::Error;

/// Errors that can occur when talking to an external collaborator.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (invalid API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// No credential was configured for a collaborator that requires one.
    #[error("missing credential for {0}")]
    MissingCredential(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),
}

impl ProviderError {
    /// Returns `true` if this error is permanent and retrying cannot help.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            ProviderError::AuthenticationFailed(_) | ProviderError::MissingCredential(_)
        )
    }

    /// Returns the retry-after delay in milliseconds, if applicable.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            ProviderError::RateLimited { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        }
    }
}

/// The two failure kinds the surrounding application must be able to tell
/// apart when it talks to the user.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The claim-verification collaborator is absent or failed as a whole.
    /// Local pattern analysis is still valid.
    #[error("verification unavailable: {0}")]
    VerificationUnavailable(String),

    /// The generative-text collaborator is absent or failed.
    #[error("generation service unavailable: {0}")]
    GenerationUnavailable(String),
}

impl EngineError {
    /// Message suitable for showing to an end user.
    pub fn user_message(&self) -> &'static str {
        match self {
            EngineError::VerificationUnavailable(_) => {
                "Análisis incompleto: la verificación de datos no está disponible, se muestran solo los patrones locales."
            }
            EngineError::GenerationUnavailable(_) => {
                "Servicio de IA no disponible, inténtalo más tarde."
            }
        }
    }
}
