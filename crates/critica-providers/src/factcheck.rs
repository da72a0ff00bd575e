//! Google Fact Check Tools claim-search client.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

use critica_core::traits::{ClaimMatch, ClaimReview, ClaimVerifier};

use crate::error::{check_status, from_send_error, ProviderError};

pub const DEFAULT_BASE_URL: &str = "https://factchecktools.googleapis.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 8;
const PAGE_SIZE: &str = "10";

/// Claim verifier backed by the `claims:search` endpoint.
pub struct FactCheckClient {
    api_key: String,
    base_url: String,
    default_language: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl std::fmt::Debug for FactCheckClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactCheckClient")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .field("default_language", &self.default_language)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl FactCheckClient {
    /// Fails with [`ProviderError::MissingCredential`] when `api_key` is blank.
    pub fn new(
        api_key: &str,
        base_url: Option<String>,
        default_language: &str,
        timeout_secs: u64,
    ) -> Result<Self, ProviderError> {
        if api_key.trim().is_empty() {
            return Err(ProviderError::MissingCredential("fact_check".into()));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ProviderError::NetworkError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_key: api_key.to_string(),
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            default_language: default_language.to_string(),
            timeout_secs,
            client,
        })
    }
}

#[derive(Deserialize, Default)]
struct SearchResponse {
    #[serde(default)]
    claims: Vec<ApiClaim>,
}

#[derive(Deserialize)]
struct ApiClaim {
    #[serde(default)]
    text: String,
    #[serde(default, rename = "claimReview")]
    claim_review: Vec<ApiReview>,
}

#[derive(Deserialize)]
struct ApiReview {
    #[serde(default)]
    publisher: ApiPublisher,
    #[serde(default)]
    url: String,
    #[serde(default, rename = "textualRating")]
    textual_rating: String,
}

#[derive(Deserialize, Default)]
struct ApiPublisher {
    #[serde(default)]
    name: String,
    #[serde(default)]
    site: String,
}

impl From<ApiClaim> for ClaimMatch {
    fn from(claim: ApiClaim) -> Self {
        ClaimMatch {
            claim_text: claim.text,
            reviews: claim
                .claim_review
                .into_iter()
                .map(|r| ClaimReview {
                    publisher_name: if r.publisher.name.is_empty() {
                        r.publisher.site
                    } else {
                        r.publisher.name
                    },
                    verdict_text: r.textual_rating,
                    url: r.url,
                })
                .collect(),
        }
    }
}

#[async_trait]
impl ClaimVerifier for FactCheckClient {
    fn name(&self) -> &str {
        "factcheck"
    }

    #[instrument(skip(self, query), fields(query_len = query.len()))]
    async fn search(&self, query: &str, language_hint: &str) -> anyhow::Result<Vec<ClaimMatch>> {
        let language = if language_hint.trim().is_empty() {
            self.default_language.as_str()
        } else {
            language_hint
        };

        let response = self
            .client
            .get(format!("{}/v1alpha1/claims:search", self.base_url))
            .query(&[
                ("query", query),
                ("languageCode", language),
                ("pageSize", PAGE_SIZE),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| from_send_error(e, self.timeout_secs))?;

        let response = check_status(response).await?;
        let body: SearchResponse = response.json().await.map_err(|e| ProviderError::ApiError {
            status: 0,
            message: format!("failed to parse response: {e}"),
        })?;

        let claims: Vec<ClaimMatch> = body.claims.into_iter().map(ClaimMatch::from).collect();
        tracing::debug!(claims = claims.len(), "fact-check search finished");
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> FactCheckClient {
        FactCheckClient::new("test-key", Some(server.uri()), "es", 2).unwrap()
    }

    #[tokio::test]
    async fn maps_claims_and_reviews() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "claims": [{
                "text": "El 90% de los alumnos abandona la escuela",
                "claimant": "Redes sociales",
                "claimReview": [
                    {
                        "publisher": {"name": "Chequeado", "site": "chequeado.com"},
                        "url": "https://chequeado.com/abandono",
                        "textualRating": "Falso",
                        "languageCode": "es"
                    },
                    {
                        "publisher": {"site": "maldita.es"},
                        "url": "https://maldita.es/abandono",
                        "textualRating": "Engañoso"
                    }
                ]
            }]
        });

        Mock::given(method("GET"))
            .and(path("/v1alpha1/claims:search"))
            .and(query_param("key", "test-key"))
            .and(query_param("languageCode", "es"))
            .and(query_param("query", "abandono escolar"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let claims = client(&server).search("abandono escolar", "").await.unwrap();
        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].reviews.len(), 2);
        assert_eq!(claims[0].reviews[0].publisher_name, "Chequeado");
        assert_eq!(claims[0].reviews[0].verdict_text, "Falso");
        assert_eq!(claims[0].reviews[1].publisher_name, "maldita.es");
    }

    #[tokio::test]
    async fn empty_body_means_no_claims() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1alpha1/claims:search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let claims = client(&server).search("nada", "en").await.unwrap();
        assert!(claims.is_empty());
    }

    #[tokio::test]
    async fn rate_limit_is_distinct() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1alpha1/claims:search"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "2"))
            .mount(&server)
            .await;

        let err = client(&server).search("consulta", "es").await.unwrap_err();
        match err.downcast_ref::<ProviderError>() {
            Some(ProviderError::RateLimited { retry_after_ms }) => assert_eq!(*retry_after_ms, 2000),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn forbidden_key_is_authentication_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1alpha1/claims:search"))
            .respond_with(ResponseTemplate::new(403).set_body_string("API key not valid"))
            .mount(&server)
            .await;

        let err = client(&server).search("consulta", "es").await.unwrap_err();
        let provider_err = err.downcast_ref::<ProviderError>().unwrap();
        assert!(provider_err.is_permanent());
    }

    #[tokio::test]
    async fn server_error_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1alpha1/claims:search"))
            .respond_with(ResponseTemplate::new(500).set_body_string("backend error"))
            .mount(&server)
            .await;

        let err = client(&server).search("consulta", "es").await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1alpha1/claims:search"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({}))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let slow = FactCheckClient::new("test-key", Some(server.uri()), "es", 1).unwrap();
        let err = slow.search("consulta", "es").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ProviderError>(),
            Some(ProviderError::Timeout(1))
        ));
    }

    #[test]
    fn blank_key_is_missing_credential() {
        let err = FactCheckClient::new("  ", None, "es", 8).unwrap_err();
        assert!(matches!(err, ProviderError::MissingCredential(_)));
    }

    #[test]
    fn debug_masks_key() {
        let client = FactCheckClient::new("secret-key", None, "es", 8).unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains(DEFAULT_BASE_URL));
    }
}
