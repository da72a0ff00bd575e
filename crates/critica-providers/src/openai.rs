//! OpenAI-compatible chat completions generator.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use critica_core::traits::{Completion, CompletionRequest, TextGenerator, DEFAULT_SYSTEM_PROMPT};

use crate::error::{check_status, from_send_error, ProviderError};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Generator for any endpoint speaking the OpenAI chat completions protocol.
pub struct OpenAiGenerator {
    api_key: String,
    base_url: String,
    model: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiGenerator")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl OpenAiGenerator {
    pub fn new(
        api_key: &str,
        base_url: Option<String>,
        model: &str,
        timeout_secs: u64,
    ) -> Result<Self, ProviderError> {
        if api_key.trim().is_empty() {
            return Err(ProviderError::MissingCredential("openai".into()));
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
            model: model.to_string(),
            timeout_secs,
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    model: String,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: String,
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    fn name(&self) -> &str {
        "openai"
    }

    #[instrument(skip(self, request), fields(model = %self.model))]
    async fn complete(&self, request: &CompletionRequest) -> anyhow::Result<Completion> {
        let start = Instant::now();

        let system_prompt = request
            .system_prompt
            .as_deref()
            .unwrap_or(DEFAULT_SYSTEM_PROMPT);
        let body = ChatRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| from_send_error(e, self.timeout_secs))?;

        let response = check_status(response).await?;
        let api_response: ChatResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status: 0,
                message: format!("failed to parse response: {e}"),
            })?;

        let content = api_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();
        if content.trim().is_empty() {
            return Err(ProviderError::ApiError {
                status: 0,
                message: "response contained no content".to_string(),
            }
            .into());
        }

        let model = if api_response.model.is_empty() {
            self.model.clone()
        } else {
            api_response.model
        };

        Ok(Completion {
            content,
            model,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn chat_body(content: &str, model: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [{"message": {"content": content, "role": "assistant"}, "index": 0}],
            "model": model,
            "usage": {"prompt_tokens": 40, "completion_tokens": 15, "total_tokens": 55}
        })
    }

    #[tokio::test]
    async fn successful_completion() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({"model": "gpt-4.1-mini"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(chat_body("La fotosíntesis es...", "gpt-4.1-mini-2025")),
            )
            .mount(&server)
            .await;

        let generator =
            OpenAiGenerator::new("test-key", Some(server.uri()), DEFAULT_MODEL, 5).unwrap();
        let completion = generator
            .complete(&CompletionRequest::new("Explica la fotosíntesis"))
            .await
            .unwrap();
        assert!(completion.content.starts_with("La fotosíntesis"));
        assert_eq!(completion.model, "gpt-4.1-mini-2025");
    }

    #[tokio::test]
    async fn sends_system_prompt_first() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("ok", "m")))
            .mount(&server)
            .await;

        let generator = OpenAiGenerator::new("key", Some(server.uri()), "m", 5).unwrap();
        let mut request = CompletionRequest::new("tema");
        request.system_prompt = Some("Sé breve.".into());
        generator.complete(&request).await.unwrap();

        let received = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "Sé breve.");
        assert_eq!(body["messages"][1]["content"], "tema");
        assert_eq!(body["max_tokens"], 2048);
    }

    #[tokio::test]
    async fn empty_content_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [],
                "model": "m"
            })))
            .mount(&server)
            .await;

        let generator = OpenAiGenerator::new("key", Some(server.uri()), "m", 5).unwrap();
        let err = generator
            .complete(&CompletionRequest::new("tema"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no content"));
    }

    #[tokio::test]
    async fn error_response() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .mount(&server)
            .await;

        let generator = OpenAiGenerator::new("key", Some(server.uri()), "m", 5).unwrap();
        let err = generator
            .complete(&CompletionRequest::new("tema"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn unauthorized_is_permanent() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let generator = OpenAiGenerator::new("key", Some(server.uri()), "m", 5).unwrap();
        let err = generator
            .complete(&CompletionRequest::new("tema"))
            .await
            .unwrap_err();
        assert!(err
            .downcast_ref::<ProviderError>()
            .is_some_and(ProviderError::is_permanent));
    }

    #[test]
    fn blank_key_is_missing_credential() {
        let err = OpenAiGenerator::new("", None, DEFAULT_MODEL, 5).unwrap_err();
        assert!(matches!(err, ProviderError::MissingCredential(_)));
    }
}
