use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use finq_core::{
    CompletionRequest, CompletionResponse, Error, FinishReason, Message, Provider, Role, Usage,
};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Client for any OpenAI-compatible `/chat/completions` endpoint.
///
/// `reqwest::Client` is internally pooled, so one provider serves every
/// concurrent analyzer.
pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    base_url: String,
    default_model: Option<String>,
}

// Manual impl keeps the API key out of logs and test output.
impl std::fmt::Debug for OpenAIProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIProvider")
            .field("base_url", &self.base_url)
            .field("default_model", &self.default_model)
            .finish_non_exhaustive()
    }
}

impl OpenAIProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            default_model: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    /// Transport-level timeout per request.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = Client::builder()
            .user_agent("finq/0.1.0")
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        self
    }

    fn build_request(&self, request: &CompletionRequest) -> OpenAIChatRequest {
        // Model priority: request > provider default
        // If neither is set, don't send model field (let API use its default)
        let model = request
            .model
            .clone()
            .or_else(|| self.default_model.clone());

        OpenAIChatRequest {
            model,
            messages: request.messages.iter().map(convert_message).collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: false,
        }
    }

    fn parse_response(&self, response: OpenAIChatResponse) -> Result<CompletionResponse, Error> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::malformed_output("No choices in response"))?;

        let finish_reason = match choice.finish_reason.as_deref() {
            Some("length") => FinishReason::Length,
            Some("content_filter") => {
                return Err(Error::refused("Response blocked by content filter"));
            }
            _ => FinishReason::Stop,
        };

        let text = choice.message.content.unwrap_or_default();
        if text.trim().is_empty() {
            return Err(Error::malformed_output("Response has no text content"));
        }

        let usage = response
            .usage
            .map(|u| Usage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        Ok(CompletionResponse {
            text,
            usage,
            model: response.model,
            finish_reason,
        })
    }

    fn parse_error(&self, status: u16, body: &str) -> Error {
        #[derive(Deserialize)]
        struct ErrorResponse {
            error: ErrorDetail,
        }

        #[derive(Deserialize)]
        struct ErrorDetail {
            message: String,
        }

        let message = serde_json::from_str::<ErrorResponse>(body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| body.to_string());

        match status {
            401 | 403 => Error::auth(message),
            408 | 504 => Error::timeout(message),
            429 => Error::rate_limit(message),
            400 => Error::invalid_request(message),
            _ => Error::api(status, message),
        }
    }
}

fn convert_message(message: &Message) -> OpenAIMessage {
    let role = match message.role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
    };
    OpenAIMessage {
        role: role.to_string(),
        content: Some(message.content.clone()),
    }
}

#[async_trait]
impl Provider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn default_model(&self) -> Option<&str> {
        self.default_model.as_deref()
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, Error> {
        let api_request = self.build_request(&request);
        debug!(
            model = ?api_request.model,
            messages = api_request.messages.len(),
            "OpenAI request"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&api_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::timeout(e.to_string())
                } else {
                    Error::network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(self.parse_error(status.as_u16(), &error_text));
        }

        let api_response: OpenAIChatResponse = response
            .json()
            .await
            .map_err(|e| Error::malformed_output(e.to_string()))?;

        self.parse_response(api_response)
    }
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct OpenAIChatRequest {
    /// Model to use. Optional for servers that have a default model.
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChatResponse {
    model: String,
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use finq_core::MessagePair;

    fn response(json: serde_json::Value) -> OpenAIChatResponse {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_provider_creation() {
        let provider = OpenAIProvider::new("test-key");
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.default_model(), None);
    }

    #[test]
    fn test_debug_hides_api_key() {
        let provider = OpenAIProvider::new("sk-secret").with_default_model("gpt-4o-mini");
        let debug = format!("{:?}", provider);
        assert!(debug.contains("gpt-4o-mini"));
        assert!(!debug.contains("sk-secret"));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let provider = OpenAIProvider::new("k").with_base_url("http://localhost:8080/v1/");
        assert_eq!(provider.base_url, "http://localhost:8080/v1");
    }

    #[test]
    fn test_build_request_from_pair() {
        let provider = OpenAIProvider::new("test-key").with_default_model("gpt-4o-mini");
        let request = CompletionRequest::from_pair(MessagePair::new("lens", "question"));
        let api_request = provider.build_request(&request);

        assert_eq!(api_request.model, Some("gpt-4o-mini".to_string()));
        assert_eq!(api_request.messages.len(), 2);
        assert_eq!(api_request.messages[0].role, "system");
        assert_eq!(api_request.messages[1].role, "user");
        assert!(!api_request.stream);
    }

    #[test]
    fn test_build_request_no_model() {
        let provider = OpenAIProvider::new("test-key");
        let request = CompletionRequest::new(vec![Message::user("Hello")]);
        let json = serde_json::to_value(provider.build_request(&request)).unwrap();
        assert!(json.get("model").is_none());
    }

    #[test]
    fn test_parse_response() {
        let provider = OpenAIProvider::new("k");
        let parsed = provider
            .parse_response(response(serde_json::json!({
                "model": "gpt-4o-mini",
                "choices": [{"message": {"role": "assistant", "content": "Repo rate is 6.5%"}, "finish_reason": "stop"}],
                "usage": {"prompt_tokens": 12, "completion_tokens": 5}
            })))
            .unwrap();
        assert_eq!(parsed.text, "Repo rate is 6.5%");
        assert_eq!(parsed.usage.total_tokens, 17);
        assert_eq!(parsed.finish_reason, FinishReason::Stop);
    }

    #[test]
    fn test_parse_response_failures() {
        let provider = OpenAIProvider::new("k");
        let empty = provider.parse_response(response(serde_json::json!({
            "model": "m", "choices": []
        })));
        assert!(matches!(empty, Err(Error::MalformedOutput(_))));

        let filtered = provider.parse_response(response(serde_json::json!({
            "model": "m",
            "choices": [{"message": {"role": "assistant", "content": ""}, "finish_reason": "content_filter"}]
        })));
        assert!(matches!(filtered, Err(Error::Refused(_))));

        let blank = provider.parse_response(response(serde_json::json!({
            "model": "m",
            "choices": [{"message": {"role": "assistant", "content": null}, "finish_reason": "stop"}]
        })));
        assert!(matches!(blank, Err(Error::MalformedOutput(_))));
    }

    #[test]
    fn test_parse_error_status_mapping() {
        let provider = OpenAIProvider::new("k");
        let body = r#"{"error": {"message": "slow down", "type": "rate_limit"}}"#;
        assert!(matches!(provider.parse_error(429, body), Error::RateLimit(m) if m == "slow down"));
        assert!(matches!(provider.parse_error(401, body), Error::Auth(_)));
        assert!(matches!(provider.parse_error(504, "gateway"), Error::Timeout(_)));
        assert!(matches!(
            provider.parse_error(500, "oops"),
            Error::Api { status: 500, .. }
        ));
    }
}
