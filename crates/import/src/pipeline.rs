use csv::ReaderBuilder;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use florin_core::{Money, NewTransaction, UserId};

use crate::categorize::Classifier;
use crate::detect::detect_format;
use crate::parse::{parse_amount, parse_date};

/// Roles a statement must provide before any rows are processed.
pub const REQUIRED_ROLES: &[&str] = &["date", "amount", "description"];

/// Pipeline-level failures. These are terminal for the whole call; row-level
/// problems never surface here, they land in `ImportReport::row_errors`.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Could not detect CSV format. Please ensure your CSV has columns for date, amount, and description.")]
    UnrecognizedFormat,
    #[error("Missing required columns. Found: [{found}], Required: [{required}]")]
    MissingColumns { found: String, required: String },
}

/// Outcome of a successful pipeline run. `total_rows` counts every data row
/// seen; `processed_rows` counts the ones that became transactions; the
/// difference is accounted for in `row_errors`, one message per skipped row.
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub transactions: Vec<NewTransaction>,
    pub row_errors: Vec<String>,
    pub total_rows: usize,
    pub processed_rows: usize,
}

impl ImportReport {
    pub fn error_count(&self) -> usize {
        self.row_errors.len()
    }
}

/// Run the full ingestion pipeline over raw CSV text: detect the format,
/// verify the required roles, then parse, classify, and normalize row by
/// row. One row's failure never aborts the batch — the row is skipped and
/// its error recorded, 1-indexed to match what the user sees in a
/// spreadsheet.
///
/// Emitted amounts are absolute values; the sign of the parsed amount is
/// captured in `is_income`. The category column is used verbatim when
/// present and non-empty, otherwise the classifier decides.
pub fn process_csv(
    csv_content: &str,
    user_id: UserId,
    classifier: &Classifier,
) -> Result<ImportReport, ImportError> {
    let format = detect_format(csv_content).ok_or(ImportError::UnrecognizedFormat)?;
    if format.columns.is_empty() {
        return Err(ImportError::UnrecognizedFormat);
    }

    let columns = format.columns;
    let (date_col, amount_col, description_col) =
        match (columns.date, columns.amount, columns.description) {
            (Some(date), Some(amount), Some(description)) => (date, amount, description),
            _ => {
                return Err(ImportError::MissingColumns {
                    found: columns.found_roles().join(", "),
                    required: REQUIRED_ROLES.join(", "),
                })
            }
        };

    let mut reader = ReaderBuilder::new()
        .delimiter(format.delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_content.trim().as_bytes());

    let mut transactions = Vec::new();
    let mut row_errors: Vec<String> = Vec::new();
    let mut total_rows = 0usize;

    for (index, result) in reader.records().enumerate() {
        let row = index + 1;
        total_rows += 1;

        let record = match result {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(row, error = %e, "skipping unreadable CSV row");
                row_errors.push(format!("Row {row}: {e}"));
                continue;
            }
        };

        let Some(date) = record.get(date_col).and_then(parse_date) else {
            tracing::warn!(row, "skipping CSV row with unparseable date");
            row_errors.push(format!("Row {row}: Invalid date format"));
            continue;
        };

        let Some(amount) = record.get(amount_col).and_then(parse_amount) else {
            tracing::warn!(row, "skipping CSV row with unparseable amount");
            row_errors.push(format!("Row {row}: Invalid amount format"));
            continue;
        };

        let description = record.get(description_col).map(str::trim).unwrap_or("");
        if description.is_empty() {
            tracing::warn!(row, "skipping CSV row with no description");
            row_errors.push(format!("Row {row}: Missing description"));
            continue;
        }

        let is_income = amount > Decimal::ZERO;

        let category = columns
            .category
            .and_then(|col| record.get(col))
            .map(str::trim)
            .filter(|cell| !cell.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| classifier.categorize(description, amount));

        transactions.push(NewTransaction {
            user_id,
            date,
            amount: Money::from_decimal(amount.abs()),
            category,
            description: description.to_string(),
            is_income,
        });
    }

    let processed_rows = transactions.len();
    Ok(ImportReport {
        transactions,
        row_errors,
        total_rows,
        processed_rows,
    })
}
