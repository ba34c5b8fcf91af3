// ============================================================
// NORMALIZED PRODUCT TYPES
// ============================================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// A CSV row that passed normalization and is ready for price analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedProduct {
    pub product_name: String,
    pub current_price: f64,
    pub user_product_url: String,
    pub competitor_urls: Vec<String>,
}

/// Data-quality problem on a single row, reported without aborting the batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    /// 1-based line number as the user sees it in a spreadsheet (header is 1)
    pub row: usize,
    pub message: String,
}

impl RowError {
    pub fn new(row: usize, message: impl Into<String>) -> Self {
        Self {
            row,
            message: message.into(),
        }
    }
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Row {}: {}", self.row, self.message)
    }
}

/// Output of the row normalizer when at least one product validated
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedBatch {
    pub products: Vec<ValidatedProduct>,
    pub row_errors: Vec<RowError>,
}

impl NormalizedBatch {
    pub fn is_partial(&self) -> bool {
        !self.row_errors.is_empty()
    }

    /// Summary of skipped rows for a partial batch, `None` when nothing was skipped
    pub fn warning(&self) -> Option<String> {
        if !self.is_partial() {
            return None;
        }

        let details = self
            .row_errors
            .iter()
            .map(|err| err.to_string())
            .collect::<Vec<_>>()
            .join("; ");

        Some(format!(
            "Skipped {} row(s): {}",
            self.row_errors.len(),
            details
        ))
    }
}
