//! Test doubles shared by the use-case and HTTP tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::analysis::GroundingSource;
use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::LLMConfig;
use crate::infrastructure::llm_clients::{GenerationOutput, GenerationRequest, LLMClient};

/// LLM client that answers every call with the same canned reply
pub struct ScriptedClient {
    reply: std::result::Result<String, String>,
    sources: Vec<GroundingSource>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedClient {
    pub fn replying(text: impl Into<String>) -> Self {
        Self {
            reply: Ok(text.into()),
            sources: Vec::new(),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: Err(message.into()),
            ..Self::replying("")
        }
    }

    pub fn with_sources(mut self, sources: Vec<GroundingSource>) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LLMClient for ScriptedClient {
    async fn generate(
        &self,
        _config: &LLMConfig,
        _request: &GenerationRequest,
    ) -> Result<GenerationOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.reply {
            Ok(text) => Ok(GenerationOutput {
                text: text.clone(),
                sources: self.sources.clone(),
            }),
            Err(message) => Err(AppError::ExternalServiceError(message.clone())),
        }
    }
}

/// A well-formed single-product analysis as the model would return it
pub fn analysis_json(product_name: &str) -> String {
    serde_json::json!({
        "userProduct": {"productName": product_name, "currentPrice": 19.99},
        "competitors": [{
            "url": "https://a.example/widget",
            "productName": format!("{} (rival)", product_name),
            "price": 18.99,
            "stockStatus": "In Stock",
            "priceTrend": "stable"
        }],
        "suggestedPrice": 18.49,
        "reasoning": "Slightly undercut the only in-stock competitor.",
        "marketSummary": "Stable prices with one main rival."
    })
    .to_string()
}
