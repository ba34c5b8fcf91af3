pub mod csv_import;
pub mod price_analysis;
pub mod request_builder;
pub mod row_normalizer;

#[cfg(test)]
pub mod testing;
