use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::LLMConfig;

pub const CONFIG_FILE: &str = "pricewise.toml";
pub const ENV_PREFIX: &str = "PRICEWISE_";

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    #[validate(length(min = 1))]
    pub host: String,
    #[validate(range(min = 1))]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    #[validate(nested)]
    pub server: ServerConfig,
    #[validate(nested)]
    pub llm: LLMConfig,
    /// Default tracing filter; `RUST_LOG` takes precedence
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            llm: LLMConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

pub struct ConfigService;

impl ConfigService {
    /// Defaults, then `pricewise.toml`, then `PRICEWISE_*` variables
    /// (`__` separates nested keys, e.g. `PRICEWISE_LLM__MODEL`).
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn load() -> Result<AppConfig> {
        Self::load_from(Self::figment())
    }

    pub fn load_from(figment: Figment) -> Result<AppConfig> {
        let mut config: AppConfig = figment.extract()?;

        if config.llm.api_key.as_deref().map_or(true, |key| key.trim().is_empty()) {
            config.llm.api_key = std::env::var(config.llm.api_key_env_var())
                .ok()
                .filter(|key| !key.trim().is_empty());
        }

        config
            .validate()
            .map_err(|e| AppError::ConfigError(e.to_string()))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::llm_config::LLMProvider;
    use figment::Jail;

    #[test]
    fn test_defaults_without_sources() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            let config = ConfigService::load().expect("defaults load");
            assert_eq!(config.server.port, 3001);
            assert_eq!(config.llm.provider, LLMProvider::Google);
            assert!(config.llm.api_key.is_none());
            Ok(())
        });
    }

    #[test]
    fn test_file_then_env_precedence() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file(
                CONFIG_FILE,
                r#"
                log_level = "debug"

                [server]
                port = 8080

                [llm]
                provider = "OpenRouter"
                base_url = "https://openrouter.ai/api/v1"
                model = "openai/gpt-4o-mini"
                "#,
            )?;
            jail.set_env("PRICEWISE_SERVER__PORT", "9090");
            jail.set_env("OPENROUTER_API_KEY", "sk-test");

            let config = ConfigService::load().expect("config load");
            assert_eq!(config.log_level, "debug");
            assert_eq!(config.server.port, 9090);
            assert_eq!(config.llm.provider, LLMProvider::OpenRouter);
            assert_eq!(config.llm.api_key.as_deref(), Some("sk-test"));
            Ok(())
        });
    }

    #[test]
    fn test_invalid_temperature_is_rejected() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("PRICEWISE_LLM__TEMPERATURE", "3.5");
            assert!(matches!(
                ConfigService::load(),
                Err(AppError::ConfigError(_))
            ));
            Ok(())
        });
    }
}
