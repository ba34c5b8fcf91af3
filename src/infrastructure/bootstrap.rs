use std::sync::{Arc, Mutex};

use actix_web::web;
use tracing::warn;

use crate::application::{CsvImportUseCase, PriceAnalysisUseCase};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::llm_clients::{LLMClient, RouterClient};
use crate::interfaces::http::{add_log, HttpState, LogEntry};

/// Wire the use cases behind the HTTP state
pub fn build_state(config: &AppConfig) -> web::Data<HttpState> {
    let logs: Arc<Mutex<Vec<LogEntry>>> = Arc::new(Mutex::new(Vec::new()));

    if config.llm.api_key.is_none() {
        let message = format!(
            "No API key configured for {:?}; set {} before running an analysis",
            config.llm.provider,
            config.llm.api_key_env_var()
        );
        warn!("{}", message);
        add_log(&logs, "WARN", "System", &message);
    }

    let llm_client: Arc<dyn LLMClient + Send + Sync> = Arc::new(RouterClient::new());
    let analysis = PriceAnalysisUseCase::new(llm_client, config.llm.clone());

    web::Data::new(HttpState {
        analysis: Arc::new(analysis),
        csv_import: CsvImportUseCase::new(),
        logs,
    })
}
