use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::debug;

use crate::{
    core::{Embedder, PromptPayload, StructuredModel},
    error::{PlannerError, Result},
    schemas::{response_format, SchemaHandle},
    types::response::parse_model_content,
};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
const MAX_RETRIES: usize = 3;

/// Client for an OpenAI-compatible API, used for both chat completions and
/// embeddings so that ingestion and querying share one embedding model.
#[derive(Clone, Debug)]
pub struct OpenAIClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    chat_model: String,
    embedding_model: String,
    temperature: f64,
    max_tokens: Option<u32>,
    timeout: Duration,
    initial_backoff: Duration,
}

impl OpenAIClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            temperature: 0.2,
            max_tokens: None,
            timeout: Duration::from_secs(120),
            initial_backoff: Duration::from_millis(250),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_chat_model(mut self, model: impl Into<String>) -> Self {
        self.chat_model = model.into();
        self
    }

    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// First wait between retries of a 429 or 5xx response; doubles each time.
    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    pub fn chat_model(&self) -> &str {
        &self.chat_model
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    pub async fn chat_completion(&self, body: &Value) -> Result<Value> {
        self.post_json(&endpoint_url(&self.base_url, "chat/completions"), body)
            .await
    }

    pub async fn create_embedding(&self, input: &str) -> Result<Vec<f32>> {
        let body = json!({
            "model": self.embedding_model,
            "input": input,
        });
        let response = self
            .post_json(&endpoint_url(&self.base_url, "embeddings"), &body)
            .await?;

        let vector = response
            .pointer("/data/0/embedding")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                PlannerError::Upstream("embedding response missing `data[0].embedding`".to_string())
            })?;

        vector
            .iter()
            .map(|value| {
                value.as_f64().map(|v| v as f32).ok_or_else(|| {
                    PlannerError::Upstream("embedding contains a non-numeric value".to_string())
                })
            })
            .collect()
    }

    // Retries cover 429 and 5xx only: no model output exists for those, so a
    // retry is not a second generation attempt.
    async fn post_json(&self, url: &str, body: &Value) -> Result<Value> {
        let mut attempt = 0;
        let mut backoff = self.initial_backoff;

        loop {
            let response = self
                .http
                .post(url)
                .timeout(self.timeout)
                .bearer_auth(&self.api_key)
                .header("Content-Type", "application/json")
                .header("X-Title", "trip-planner-rs")
                .json(body)
                .send()
                .await
                .map_err(transport_error)?;

            let status = response.status();
            let headers = response.headers().clone();
            let response_text = response.text().await.map_err(transport_error)?;

            if status == StatusCode::TOO_MANY_REQUESTS {
                let retry_after = headers
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|value| value.to_str().ok())
                    .and_then(|value| value.parse::<u64>().ok())
                    .map(Duration::from_secs)
                    .unwrap_or(backoff);

                // A server-requested wait longer than the request budget is
                // reported instead of slept through.
                if attempt < MAX_RETRIES && retry_after <= self.timeout {
                    debug!(target: "trip_planner::http", url, attempt, "rate limited; retrying");
                    tokio::time::sleep(retry_after).await;
                    attempt += 1;
                    backoff *= 2;
                    continue;
                }

                return Err(PlannerError::RateLimit {
                    retry_after: retry_after.as_secs().max(1),
                });
            }

            if status.is_server_error() && attempt < MAX_RETRIES {
                debug!(
                    target: "trip_planner::http",
                    url,
                    attempt,
                    %status,
                    "server error; retrying"
                );
                tokio::time::sleep(backoff).await;
                attempt += 1;
                backoff *= 2;
                continue;
            }

            let response_json: Value = serde_json::from_str(&response_text).map_err(|err| {
                PlannerError::Upstream(format!("HTTP {status}: response is not JSON: {err}"))
            })?;

            if !status.is_success() {
                let api_message = response_json
                    .pointer("/error/message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or(response_text);

                return Err(PlannerError::Upstream(format!(
                    "HTTP {} error: {}",
                    status, api_message
                )));
            }

            if let Some(error) = response_json.get("error") {
                let error_message = error
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| error.to_string());
                return Err(PlannerError::Upstream(format!("API error: {}", error_message)));
            }

            return Ok(response_json);
        }
    }
}

fn transport_error(err: reqwest::Error) -> PlannerError {
    if err.is_timeout() {
        PlannerError::Timeout(format!("request timed out: {err}"))
    } else {
        PlannerError::Upstream(format!("HTTP request failed: {err}"))
    }
}

fn endpoint_url(base_url: &str, path: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    if trimmed.ends_with(path) {
        trimmed.to_string()
    } else {
        format!("{}/{}", trimmed, path)
    }
}

#[async_trait]
impl Embedder for OpenAIClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.create_embedding(text).await
    }
}

#[async_trait]
impl StructuredModel for OpenAIClient {
    async fn generate(&self, prompt: &PromptPayload, schema: &SchemaHandle) -> Result<Value> {
        let request = ChatCompletionRequest::new(self.chat_model.clone(), prompt.to_messages())
            .with_temperature(Some(self.temperature))
            .with_max_tokens(self.max_tokens)
            .with_response_format(response_format(schema));

        let response = self.chat_completion(&request.into_value()).await?;

        let message = response.pointer("/choices/0/message").ok_or_else(|| {
            PlannerError::Upstream("completion response contained no choices".to_string())
        })?;

        if let Some(refusal) = message.get("refusal").and_then(Value::as_str) {
            return Err(PlannerError::Upstream(format!("model refused: {refusal}")));
        }

        let content = message
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default();
        parse_model_content(content, schema)
    }
}

#[derive(Clone, Debug)]
pub struct ChatCompletionRequest {
    model: String,
    messages: Vec<Value>,
    temperature: Option<f64>,
    max_tokens: Option<u32>,
    response_format: Option<Value>,
}

impl ChatCompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Value>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            max_tokens: None,
            response_format: None,
        }
    }

    pub fn with_temperature(mut self, temperature: Option<f64>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_response_format(mut self, response_format: Value) -> Self {
        self.response_format = Some(response_format);
        self
    }

    pub fn into_value(self) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": self.messages,
        });

        if let Some(temperature) = self.temperature {
            body["temperature"] = json!(temperature);
        }

        if let Some(max_tokens) = self.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }

        if let Some(response_format) = self.response_format {
            body["response_format"] = response_format;
        }

        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url() {
        assert_eq!(
            endpoint_url("https://api.openai.com/v1/", "embeddings"),
            "https://api.openai.com/v1/embeddings"
        );
        assert_eq!(
            endpoint_url("http://proxy/v1/chat/completions", "chat/completions"),
            "http://proxy/v1/chat/completions"
        );
    }

    #[test]
    fn test_request_body_omits_unset_fields() {
        let body = ChatCompletionRequest::new("m", vec![json!({"role": "user", "content": "hi"})])
            .into_value();
        assert_eq!(body["model"], "m");
        assert!(body.get("temperature").is_none());
        assert!(body.get("response_format").is_none());
    }
}
