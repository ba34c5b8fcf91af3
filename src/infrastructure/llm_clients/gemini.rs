use super::{GenerationOutput, GenerationRequest, LLMClient};
use crate::domain::analysis::{GroundingSource, WebSource};
use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::LLMConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<GeminiTool>,
}

#[derive(Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
}

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize)]
struct GeminiTool {
    #[serde(rename = "googleSearch")]
    google_search: Value,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f64,
    #[serde(rename = "maxOutputTokens", skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(rename = "responseMimeType", skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(rename = "responseSchema", skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(rename = "promptFeedback")]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct PromptFeedback {
    #[serde(rename = "blockReason")]
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
    #[serde(rename = "groundingMetadata")]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiCandidatePart>,
}

#[derive(Deserialize)]
struct GeminiCandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct GroundingMetadata {
    #[serde(rename = "groundingChunks", default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Deserialize)]
struct GroundingChunk {
    web: Option<GroundingWeb>,
}

#[derive(Deserialize)]
struct GroundingWeb {
    uri: Option<String>,
    title: Option<String>,
}

pub struct GeminiClient {
    client: reqwest::Client,
}

impl GeminiClient {
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
            AppError::ExternalServiceError("Missing API key for Google provider".to_string())
        })
    }

    fn build_body(config: &LLMConfig, request: &GenerationRequest) -> GeminiRequest {
        let system_instruction = if request.system.trim().is_empty() {
            None
        } else {
            Some(GeminiContent {
                parts: vec![GeminiPart {
                    text: request.system.clone(),
                }],
                role: None,
            })
        };

        // Gemini rejects a response schema combined with tool use
        let grounded = request.search_grounding && config.search_grounding;
        let response_schema = if grounded {
            None
        } else {
            request.response_schema.as_ref().map(to_gemini_schema)
        };

        GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: request.user.clone(),
                }],
                role: Some("user".to_string()),
            }],
            system_instruction,
            generation_config: Some(GenerationConfig {
                temperature: config.temperature.unwrap_or(0.2) as f64,
                max_output_tokens: config.max_tokens,
                response_mime_type: response_schema
                    .as_ref()
                    .map(|_| "application/json".to_string()),
                response_schema,
            }),
            tools: if grounded {
                vec![GeminiTool {
                    google_search: serde_json::json!({}),
                }]
            } else {
                Vec::new()
            },
        }
    }

    fn into_output(response: GeminiResponse) -> Result<GenerationOutput> {
        let Some(candidate) = response.candidates.into_iter().next() else {
            let reason = response
                .prompt_feedback
                .and_then(|feedback| feedback.block_reason)
                .unwrap_or_else(|| "no candidates returned".to_string());
            return Err(AppError::ExternalServiceError(format!(
                "Gemini returned no answer ({})",
                reason
            )));
        };

        let text = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            debug!(finish_reason = ?candidate.finish_reason, "Gemini candidate had no text");
        }

        let sources = candidate
            .grounding_metadata
            .map(|metadata| {
                metadata
                    .grounding_chunks
                    .into_iter()
                    .filter_map(|chunk| chunk.web)
                    .filter_map(|web| {
                        let uri = web.uri?;
                        Some(GroundingSource {
                            web: WebSource {
                                title: web.title.unwrap_or_else(|| uri.clone()),
                                uri,
                            },
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(GenerationOutput { text, sources })
    }
}

impl Default for GeminiClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Gemini's schema dialect spells primitive types in upper case and has no
/// `additionalProperties`.
fn to_gemini_schema(schema: &Value) -> Value {
    match schema {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(key, _)| key.as_str() != "additionalProperties")
                .map(|(key, value)| {
                    let converted = match (key.as_str(), value) {
                        ("type", Value::String(kind)) => Value::String(kind.to_uppercase()),
                        _ => to_gemini_schema(value),
                    };
                    (key.clone(), converted)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(to_gemini_schema).collect()),
        other => other.clone(),
    }
}

#[async_trait]
impl LLMClient for GeminiClient {
    async fn generate(
        &self,
        config: &LLMConfig,
        request: &GenerationRequest,
    ) -> Result<GenerationOutput> {
        let api_key = Self::api_key(config)?;
        let model_id = config.model.trim();
        let base_url = config.base_url.trim_end_matches('/');
        let url = format!("{}/{}:generateContent", base_url, model_id);

        let body = Self::build_body(config, request);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
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

        let json: GeminiResponse = response.json().await.map_err(|e| {
            AppError::ExternalServiceError(format!("Failed to parse JSON: {}", e))
        })?;

        Self::into_output(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(search: bool) -> GenerationRequest {
        GenerationRequest {
            system: "system".to_string(),
            user: "user".to_string(),
            response_schema: Some(json!({
                "type": "object",
                "additionalProperties": false,
                "properties": {"price": {"type": "number"}}
            })),
            search_grounding: search,
        }
    }

    #[test]
    fn test_schema_request_uses_json_mode() {
        let body = GeminiClient::build_body(&LLMConfig::default(), &request(false));
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(
            value["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(value["generationConfig"]["responseSchema"]["type"], "OBJECT");
        assert_eq!(
            value["generationConfig"]["responseSchema"]["properties"]["price"]["type"],
            "NUMBER"
        );
        assert!(value["generationConfig"]["responseSchema"]
            .get("additionalProperties")
            .is_none());
        assert!(value.get("tools").is_none());
        assert_eq!(value["systemInstruction"]["parts"][0]["text"], "system");
    }

    #[test]
    fn test_grounded_request_drops_schema() {
        let body = GeminiClient::build_body(&LLMConfig::default(), &request(true));
        let value = serde_json::to_value(&body).unwrap();

        assert!(value["tools"][0].get("googleSearch").is_some());
        assert!(value["generationConfig"].get("responseSchema").is_none());
    }

    #[test]
    fn test_grounding_disabled_in_config() {
        let config = LLMConfig {
            search_grounding: false,
            ..LLMConfig::default()
        };
        let value = serde_json::to_value(GeminiClient::build_body(&config, &request(true))).unwrap();
        assert!(value.get("tools").is_none());
    }

    #[test]
    fn test_output_collects_text_and_sources() {
        let response: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"parts": [{"text": "{\"results\":"}, {"text": "[]}"}]},
                "finishReason": "STOP",
                "groundingMetadata": {"groundingChunks": [
                    {"web": {"uri": "https://a.example", "title": "A"}},
                    {"web": {"uri": "https://b.example"}},
                    {}
                ]}
            }]
        }))
        .unwrap();

        let output = GeminiClient::into_output(response).unwrap();
        assert_eq!(output.text, "{\"results\":[]}");
        assert_eq!(output.sources.len(), 2);
        assert_eq!(output.sources[1].web.title, "https://b.example");
    }

    #[test]
    fn test_blocked_prompt_is_external_error() {
        let response: GeminiResponse = serde_json::from_value(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();

        match GeminiClient::into_output(response) {
            Err(AppError::ExternalServiceError(msg)) => assert!(msg.contains("SAFETY")),
            other => panic!("unexpected result: {:?}", other.map(|o| o.text)),
        }
    }
}
