use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum LLMProvider {
    Google,
    OpenRouter,
}

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct LLMConfig {
    pub provider: LLMProvider,
    #[validate(length(min = 1, message = "base_url must not be empty"))]
    pub base_url: String,
    #[validate(length(min = 1, message = "model must not be empty"))]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[validate(range(min = 1))]
    pub max_tokens: Option<u32>,
    #[validate(range(min = 0.0, max = 2.0))]
    pub temperature: Option<f32>,
    /// Let the provider browse the web for batch analyses (Gemini only)
    #[serde(default = "default_search_grounding")]
    pub search_grounding: bool,
}

fn default_search_grounding() -> bool {
    true
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::Google,
            base_url: "https://generativelanguage.googleapis.com/v1beta/models".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key: None,
            max_tokens: Some(8192),
            temperature: Some(0.2),
            search_grounding: default_search_grounding(),
        }
    }
}

impl LLMConfig {
    pub fn api_key_env_var(&self) -> &'static str {
        match self.provider {
            LLMProvider::Google => "GEMINI_API_KEY",
            LLMProvider::OpenRouter => "OPENROUTER_API_KEY",
        }
    }
}
