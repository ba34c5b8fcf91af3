pub mod gemini;
pub mod openrouter;

use crate::domain::analysis::GroundingSource;
use crate::domain::error::Result;
use crate::domain::llm_config::LLMConfig;
use crate::domain::llm_config::LLMProvider;
use async_trait::async_trait;
use gemini::GeminiClient;
use openrouter::OpenRouterClient;

/// One prompt sent to a provider
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    pub system: String,
    pub user: String,
    /// JSON Schema (lowercase draft style) the answer must follow
    pub response_schema: Option<serde_json::Value>,
    /// Ask the provider to search the web before answering
    pub search_grounding: bool,
}

#[derive(Debug, Clone, Default)]
pub struct GenerationOutput {
    pub text: String,
    pub sources: Vec<GroundingSource>,
}

#[async_trait]
pub trait LLMClient {
    async fn generate(
        &self,
        config: &LLMConfig,
        request: &GenerationRequest,
    ) -> Result<GenerationOutput>;
}

pub struct RouterClient {
    openrouter: OpenRouterClient,
    gemini: GeminiClient,
}

impl RouterClient {
    pub fn new() -> Self {
        Self {
            openrouter: OpenRouterClient::new(),
            gemini: GeminiClient::new(),
        }
    }
}

impl Default for RouterClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LLMClient for RouterClient {
    async fn generate(
        &self,
        config: &LLMConfig,
        request: &GenerationRequest,
    ) -> Result<GenerationOutput> {
        match config.provider {
            LLMProvider::Google => self.gemini.generate(config, request).await,
            LLMProvider::OpenRouter => self.openrouter.generate(config, request).await,
        }
    }
}
