use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::csv::RowError;

#[derive(Debug, Serialize, Deserialize)]
pub enum AppError {
    Internal(String),
    ValidationError(String),
    ConfigError(String),
    /// Malformed CSV structure: missing header or data rows.
    FormatError(String),
    /// Required column roles that have not been assigned yet.
    MappingIncomplete(Vec<String>),
    /// Every data row was skipped or rejected.
    NoValidRows {
        message: String,
        row_errors: Vec<RowError>,
    },
    /// The generative model call failed or produced an unusable payload.
    ExternalServiceError(String),
    Busy(String),
    IoError(String),
}

impl AppError {
    /// Stable identifier surfaced to API clients.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Internal(_) => "internal",
            AppError::ValidationError(_) => "validation",
            AppError::ConfigError(_) => "config",
            AppError::FormatError(_) => "format",
            AppError::MappingIncomplete(_) => "mapping_incomplete",
            AppError::NoValidRows { .. } => "no_valid_rows",
            AppError::ExternalServiceError(_) => "external_service",
            AppError::Busy(_) => "busy",
            AppError::IoError(_) => "io",
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::ConfigError(msg) => write!(f, "Config error: {}", msg),
            AppError::FormatError(msg) => write!(f, "{}", msg),
            AppError::MappingIncomplete(fields) => write!(
                f,
                "Please map the required columns: {}.",
                fields.join(" and ")
            ),
            AppError::NoValidRows { message, .. } => write!(f, "{}", message),
            AppError::ExternalServiceError(msg) => write!(f, "Analysis Failed: {}", msg),
            AppError::Busy(msg) => write!(f, "{}", msg),
            AppError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

impl From<figment::Error> for AppError {
    fn from(err: figment::Error) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
