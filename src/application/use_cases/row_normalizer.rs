// ============================================================
// ROW NORMALIZER
// ============================================================
// Turn mapped CSV rows into validated products, collecting per-row errors

use tracing::{debug, info};

use crate::domain::csv::{
    FieldMapping, FieldRole, NormalizedBatch, RawCsvTable, RowError, ValidatedProduct,
};
use crate::domain::error::{AppError, Result};

/// Spreadsheet line number of the first data row (the header is line 1)
const FIRST_DATA_ROW: usize = 2;

const NO_VALID_ROWS: &str = "No valid products found in the CSV file.";

/// Normalize every data row of `table` according to `mapping`.
///
/// Rows with a blank product name are skipped silently. Rows with a missing
/// or unparseable price become `RowError`s. Fails with `NoValidRows` when no
/// product survives.
pub fn normalize_rows(table: &RawCsvTable, mapping: &FieldMapping) -> Result<NormalizedBatch> {
    mapping.require_ready()?;
    ensure_columns_exist(table, mapping)?;

    let name_column = mapping.product_name_column.as_deref().unwrap_or_default();
    let price_column = mapping.price_column.as_deref().unwrap_or_default();
    let url_column = mapping.user_url_column.as_deref();
    let competitor_columns = mapping.competitor_columns_in(&table.headers);

    let mut batch = NormalizedBatch::default();

    for (idx, row) in table.rows.iter().enumerate() {
        let row_number = idx + FIRST_DATA_ROW;

        let product_name = RawCsvTable::cell(row, name_column).trim();
        if product_name.is_empty() {
            continue;
        }

        let current_price = match parse_price(RawCsvTable::cell(row, price_column)) {
            Ok(price) => price,
            Err(message) => {
                debug!(row = row_number, %message, "Rejected CSV row");
                batch.row_errors.push(RowError::new(row_number, message));
                continue;
            }
        };

        let user_product_url = url_column
            .map(|column| RawCsvTable::cell(row, column).to_string())
            .unwrap_or_default();

        let competitor_urls = competitor_columns
            .iter()
            .map(|column| RawCsvTable::cell(row, column))
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .collect();

        batch.products.push(ValidatedProduct {
            product_name: product_name.to_string(),
            current_price,
            user_product_url,
            competitor_urls,
        });
    }

    info!(
        products = batch.products.len(),
        rejected = batch.row_errors.len(),
        "Normalized CSV rows"
    );

    if batch.products.is_empty() {
        return Err(no_valid_rows(batch.row_errors));
    }

    Ok(batch)
}

/// Keep digits, `.` and `-`, then parse what is left
fn parse_price(cell: &str) -> std::result::Result<f64, String> {
    let price_string: String = cell
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    if price_string.is_empty() {
        return Err("Price is missing.".to_string());
    }

    match price_string.parse::<f64>() {
        Ok(price) if !price.is_finite() => Err(format!("Invalid price format: \"{}\".", cell)),
        Ok(price) if price < 0.0 => Err(format!("Price cannot be negative: \"{}\".", cell)),
        Ok(price) => Ok(price),
        Err(_) => Err(format!("Invalid price format: \"{}\".", cell)),
    }
}

fn ensure_columns_exist(table: &RawCsvTable, mapping: &FieldMapping) -> Result<()> {
    let selected = [
        (FieldRole::ProductName, mapping.product_name_column.as_deref()),
        (FieldRole::Price, mapping.price_column.as_deref()),
        (FieldRole::UserUrl, mapping.user_url_column.as_deref()),
    ];
    let competitors = mapping
        .competitor_url_columns
        .iter()
        .map(|column| (FieldRole::CompetitorUrl, Some(column.as_str())));

    for (role, column) in selected.into_iter().chain(competitors) {
        let Some(column) = column else { continue };
        if !table.has_header(column) {
            return Err(AppError::ValidationError(format!(
                "{} column \"{}\" is not present in the uploaded file.",
                role.label(),
                column
            )));
        }
    }

    Ok(())
}

fn no_valid_rows(row_errors: Vec<RowError>) -> AppError {
    let message = if row_errors.is_empty() {
        format!("{} Check that the mapped columns contain data.", NO_VALID_ROWS)
    } else {
        let details = row_errors
            .iter()
            .map(|err| err.to_string())
            .collect::<Vec<_>>()
            .join("\n");
        format!("{}\n{}", NO_VALID_ROWS, details)
    };

    AppError::NoValidRows {
        message,
        row_errors,
    }
}
