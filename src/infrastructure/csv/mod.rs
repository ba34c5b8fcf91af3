// ============================================================
// CSV INFRASTRUCTURE LAYER
// ============================================================
// CSV text decoding, parsing, and the downloadable sample file

mod csv_parser;
mod sample;

pub use csv_parser::CsvParser;
pub use sample::{sample_csv, SAMPLE_FILE_NAME};
