// ============================================================
// CSV IMPORT USE CASE
// ============================================================
// Parse an uploaded product file, suggest a mapping, normalize rows

use serde::Serialize;
use std::time::Instant;
use tracing::info;

use crate::application::use_cases::row_normalizer::normalize_rows;
use crate::domain::csv::{FieldMapping, NormalizedBatch, RawCsvTable};
use crate::domain::error::Result;
use crate::infrastructure::csv::CsvParser;

/// Parsed upload returned to the mapping form
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvPreview {
    #[serde(flatten)]
    pub table: RawCsvTable,
    pub row_count: usize,
    pub suggested_mapping: FieldMapping,
    pub processing_time_ms: u64,
}

/// Normalization result with the user-facing partial-batch warning
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizationSummary {
    #[serde(flatten)]
    pub batch: NormalizedBatch,
    pub warning: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct CsvImportUseCase {
    parser: CsvParser,
}

impl CsvImportUseCase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode and parse an uploaded file
    pub fn preview(&self, bytes: &[u8]) -> Result<CsvPreview> {
        let start = Instant::now();
        let table = self.parser.parse_bytes(bytes)?;
        let suggested_mapping = FieldMapping::suggest(&table.headers);

        info!(
            columns = table.headers.len(),
            rows = table.row_count(),
            mapping_ready = suggested_mapping.is_ready(),
            "CSV upload parsed"
        );

        Ok(CsvPreview {
            row_count: table.row_count(),
            table,
            suggested_mapping,
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Apply the user's mapping without contacting the model
    pub fn normalize(&self, content: &str, mapping: &FieldMapping) -> Result<NormalizationSummary> {
        mapping.require_ready()?;
        let table = self.parser.parse_content(content)?;
        let batch = normalize_rows(&table, mapping)?;
        let warning = batch.warning();

        Ok(NormalizationSummary { batch, warning })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::AppError;
    use crate::infrastructure::csv::sample_csv;

    #[test]
    fn test_preview_sample_suggests_full_mapping() {
        let sample = sample_csv().unwrap();
        let preview = CsvImportUseCase::new().preview(sample.as_bytes()).unwrap();

        assert_eq!(preview.row_count, 3);
        assert_eq!(preview.table.headers.len(), 5);
        assert!(preview.suggested_mapping.is_ready());
        assert_eq!(preview.suggested_mapping.competitor_url_columns.len(), 2);
    }

    #[test]
    fn test_preview_serializes_flat() {
        let preview = CsvImportUseCase::new()
            .preview(b"name,price\nWidget,1")
            .unwrap();
        let json = serde_json::to_value(&preview).unwrap();

        assert_eq!(json["headers"][0], "name");
        assert_eq!(json["rows"][0]["price"], "1");
        assert_eq!(json["suggestedMapping"]["productNameColumn"], "name");
    }

    #[test]
    fn test_preview_rejects_header_only_file() {
        assert!(matches!(
            CsvImportUseCase::new().preview(b"name,price\n"),
            Err(AppError::FormatError(_))
        ));
    }

    #[test]
    fn test_normalize_sample_with_suggested_mapping() {
        let sample = sample_csv().unwrap();
        let use_case = CsvImportUseCase::new();
        let mapping = use_case.preview(sample.as_bytes()).unwrap().suggested_mapping;

        let summary = use_case.normalize(&sample, &mapping).unwrap();
        assert_eq!(summary.batch.products.len(), 3);
        assert_eq!(summary.batch.products[0].product_name, "Pro Camera X1, with stand");
        assert_eq!(summary.batch.products[0].competitor_urls.len(), 2);
        assert_eq!(summary.batch.products[1].competitor_urls.len(), 1);
        assert!(summary.warning.is_none());
    }

    #[test]
    fn test_normalize_without_mapping_is_blocked() {
        let err = CsvImportUseCase::new()
            .normalize("name,price\nWidget,1", &FieldMapping::new())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Please map the required columns: Product Name and Price."
        );
    }
}
