// ============================================================
// CSV DOMAIN LAYER
// ============================================================
// Core types for product CSV ingestion
// No I/O, no async

mod field_mapping;
mod product;
mod raw_table;

pub use field_mapping::{FieldMapping, FieldRole};
pub use product::{NormalizedBatch, RowError, ValidatedProduct};
pub use raw_table::{RawCsvTable, RowMap};
