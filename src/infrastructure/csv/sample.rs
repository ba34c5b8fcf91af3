// ============================================================
// SAMPLE CSV
// ============================================================
// Downloadable template showing the expected columns

use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::domain::error::{AppError, Result};

pub const SAMPLE_FILE_NAME: &str = "pricewise_sample.csv";

const SAMPLE_HEADERS: [&str; 5] = [
    "productName",
    "currentPrice",
    "userProductUrl",
    "competitorUrl_1",
    "competitorUrl_2",
];

const SAMPLE_ROWS: [[&str; 5]; 3] = [
    [
        "Pro Camera X1, with stand",
        "499.99",
        "https://www.example-store.com/products/pro-camera-x1",
        "https://www.competitor-one.com/cameras/x1-pro",
        "https://www.competitor-two.com/item/pro-camera-x1",
    ],
    [
        "Wireless Noise-Cancelling Headphones",
        "199.00",
        "https://www.example-store.com/products/anc-headphones",
        "https://www.competitor-one.com/audio/anc-200",
        "",
    ],
    [
        "Smart Fitness Watch",
        "129.50",
        "https://www.example-store.com/products/fitness-watch",
        "https://www.competitor-two.com/item/fit-watch",
        "https://www.competitor-three.com/wearables/smart-fit",
    ],
];

/// Render the sample file; fields containing commas come out quoted
pub fn sample_csv() -> Result<String> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(SAMPLE_HEADERS)
        .map_err(|e| AppError::Internal(format!("Failed to write sample header: {}", e)))?;

    for row in SAMPLE_ROWS {
        writer
            .write_record(row)
            .map_err(|e| AppError::Internal(format!("Failed to write sample row: {}", e)))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("Failed to flush sample CSV: {}", e)))?;

    String::from_utf8(bytes)
        .map_err(|e| AppError::Internal(format!("Sample CSV is not UTF-8: {}", e)))
}
