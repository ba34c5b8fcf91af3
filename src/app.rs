use std::io;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::infrastructure::bootstrap::build_state;
use crate::infrastructure::config::ConfigService;
use crate::interfaces::http::{add_log, start_server};

pub async fn run() -> io::Result<()> {
    let _ = dotenvy::dotenv();

    let config = ConfigService::load()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let state = build_state(&config);
    let server = start_server(state.clone(), &config.server)?;

    let message = format!(
        "HTTP server started on {}:{}",
        config.server.host, config.server.port
    );
    info!(provider = ?config.llm.provider, model = %config.llm.model, "{}", message);
    add_log(&state.logs, "INFO", "System", &message);

    server.await
}
