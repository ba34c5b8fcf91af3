use super::{GenerationOutput, GenerationRequest, LLMClient};
use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::LLMConfig;
use async_trait::async_trait;
use serde_json::{json, Value};

pub struct OpenRouterClient {
    client: reqwest::Client,
}

impl OpenRouterClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    fn api_key(config: &LLMConfig) -> Result<String> {
        config.api_key.clone().ok_or_else(|| {
            AppError::ExternalServiceError("Missing API key for OpenRouter".to_string())
        })
    }

    fn build_body(config: &LLMConfig, request: &GenerationRequest) -> Value {
        let mut body = json!({
            "model": config.model,
            "messages": [
                {
                    "role": "system",
                    "content": request.system
                },
                {
                    "role": "user",
                    "content": request.user
                }
            ],
            "max_tokens": config.max_tokens,
            "temperature": config.temperature,
        });

        if let Some(schema) = &request.response_schema {
            body["response_format"] = json!({
                "type": "json_schema",
                "json_schema": {
                    "name": "pricing_analysis",
                    "strict": true,
                    "schema": schema,
                }
            });
        }

        body
    }
}

impl Default for OpenRouterClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LLMClient for OpenRouterClient {
    async fn generate(
        &self,
        config: &LLMConfig,
        request: &GenerationRequest,
    ) -> Result<GenerationOutput> {
        let api_key = Self::api_key(config)?;
        let url = if config.base_url.ends_with('/') {
            format!("{}chat/completions", config.base_url)
        } else {
            format!("{}/chat/completions", config.base_url)
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&Self::build_body(config, request))
            .send()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalServiceError(format!(
                "API error ({}): {}",
                status, text
            )));
        }

        let json: Value = response.json().await.map_err(|e| {
            AppError::ExternalServiceError(format!("Failed to parse JSON: {}", e))
        })?;

        let text = json["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| {
                AppError::ExternalServiceError("Invalid response format".to_string())
            })?;

        Ok(GenerationOutput {
            text,
            sources: Vec::new(),
        })
    }
}
