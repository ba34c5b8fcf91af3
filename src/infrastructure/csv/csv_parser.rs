// ============================================================
// CSV PARSER
// ============================================================
// Line-oriented product CSV parsing with quote-aware field splitting

use encoding_rs::{UTF_8, WINDOWS_1252};
use tracing::{debug, warn};

use crate::domain::csv::RawCsvTable;
use crate::domain::error::{AppError, Result};

const DELIMITER: char = ',';
const QUOTE: char = '"';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuoteState {
    Outside,
    Inside,
}

impl QuoteState {
    fn flip(self) -> Self {
        match self {
            QuoteState::Outside => QuoteState::Inside,
            QuoteState::Inside => QuoteState::Outside,
        }
    }
}

/// Product CSV parser
///
/// Quoted fields may contain commas but not line breaks, and escaped quotes
/// (`""`) are not interpreted.
#[derive(Debug, Default, Clone)]
pub struct CsvParser;

impl CsvParser {
    /// Create a new CSV parser
    pub fn new() -> Self {
        Self
    }

    /// Decode uploaded bytes and parse them
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<RawCsvTable> {
        let content = Self::decode_text(bytes);
        self.parse_content(&content)
    }

    /// Parse CSV content from string
    pub fn parse_content(&self, content: &str) -> Result<RawCsvTable> {
        let normalized = content.replace("\r\n", "\n");
        let lines: Vec<&str> = normalized
            .split('\n')
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        if lines.len() < 2 {
            return Err(AppError::FormatError(
                "CSV file must contain a header row and at least one data row.".to_string(),
            ));
        }

        let headers: Vec<String> = lines[0]
            .split(DELIMITER)
            .map(|header| header.trim().to_string())
            .collect();

        let records: Vec<Vec<String>> = lines[1..]
            .iter()
            .map(|line| Self::split_line(line))
            .collect();

        debug!(
            columns = headers.len(),
            rows = records.len(),
            "Parsed CSV content"
        );

        Ok(RawCsvTable::from_records(headers, records))
    }

    /// Split one data line on delimiters that sit outside a quoted section
    pub fn split_line(line: &str) -> Vec<String> {
        let mut fields = Vec::new();
        let mut current = String::new();
        let mut state = QuoteState::Outside;

        for ch in line.chars() {
            match (state, ch) {
                (_, QUOTE) => {
                    state = state.flip();
                    current.push(ch);
                }
                (QuoteState::Outside, DELIMITER) => {
                    fields.push(Self::clean_value(&current));
                    current.clear();
                }
                _ => current.push(ch),
            }
        }
        fields.push(Self::clean_value(&current));

        fields
    }

    /// Trim, then drop one leading and one trailing quote if present
    fn clean_value(raw: &str) -> String {
        let trimmed = raw.trim();
        let trimmed = trimmed.strip_prefix(QUOTE).unwrap_or(trimmed);
        let trimmed = trimmed.strip_suffix(QUOTE).unwrap_or(trimmed);
        trimmed.to_string()
    }

    /// UTF-8 (BOM tolerated) with a Windows-1252 fallback for spreadsheet exports
    pub fn decode_text(bytes: &[u8]) -> String {
        let (text, had_errors) = UTF_8.decode_with_bom_removal(bytes);
        if !had_errors {
            return text.into_owned();
        }

        warn!("CSV upload is not valid UTF-8, decoding as Windows-1252");
        let (text, _, _) = WINDOWS_1252.decode(bytes);
        text.into_owned()
    }
}
