// ============================================================
// RAW CSV TABLE
// ============================================================
// Header list plus one header -> cell mapping per data line

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Association from a header to the cell value for one data row
pub type RowMap = HashMap<String, String>;

/// Parsed CSV content before any column roles are applied
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCsvTable {
    /// Column headers in file order
    pub headers: Vec<String>,

    /// One mapping per data line, keyed by header
    pub rows: Vec<RowMap>,
}

impl RawCsvTable {
    /// Build a table from split values; short rows are padded with empty cells
    pub fn from_records(headers: Vec<String>, records: Vec<Vec<String>>) -> Self {
        let rows = records
            .into_iter()
            .map(|values| {
                headers
                    .iter()
                    .enumerate()
                    .map(|(idx, header)| {
                        let value = values.get(idx).cloned().unwrap_or_default();
                        (header.clone(), value)
                    })
                    .collect()
            })
            .collect();

        Self { headers, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn has_header(&self, header: &str) -> bool {
        self.headers.iter().any(|h| h == header)
    }

    /// Cell lookup that treats a missing column as an empty cell
    pub fn cell<'a>(row: &'a RowMap, header: &str) -> &'a str {
        row.get(header).map(String::as_str).unwrap_or("")
    }
}
