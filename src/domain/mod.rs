pub mod analysis;
pub mod error;
pub mod llm_config;

// CSV ingestion module
pub mod csv;
