use serde::{Deserialize, Serialize};

/// Acceptable header-name substrings per column role, scanned
/// case-insensitively. A header cell binds to the first role list that
/// contains any of its substrings, leftmost cell wins per role.
const DATE_HEADERS: &[&str] = &["date", "transaction_date", "trans_date", "posted_date", "timestamp"];
const AMOUNT_HEADERS: &[&str] = &["amount", "value", "sum", "total", "debit", "credit"];
const DESCRIPTION_HEADERS: &[&str] = &["description", "desc", "memo", "details", "narration", "reference"];
const CATEGORY_HEADERS: &[&str] = &["category", "cat", "type", "classification"];

/// Number of data rows included in the detection preview.
const SAMPLE_ROWS: usize = 2;

/// Column indices bound to each role. A role the header never matched is
/// simply absent; whether that matters is the pipeline's call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnMap {
    pub date: Option<usize>,
    pub amount: Option<usize>,
    pub description: Option<usize>,
    pub category: Option<usize>,
}

impl ColumnMap {
    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.amount.is_none()
            && self.description.is_none()
            && self.category.is_none()
    }

    /// Role names that were bound, in fixed role order.
    pub fn found_roles(&self) -> Vec<&'static str> {
        let mut roles = Vec::new();
        if self.date.is_some() {
            roles.push("date");
        }
        if self.amount.is_some() {
            roles.push("amount");
        }
        if self.description.is_some() {
            roles.push("description");
        }
        if self.category.is_some() {
            roles.push("category");
        }
        roles
    }
}

/// What format detection produced: the inferred delimiter, the header row,
/// the role bindings, and a couple of parsed rows for previewing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvFormat {
    pub delimiter: u8,
    pub headers: Vec<String>,
    pub columns: ColumnMap,
    pub sample_rows: Vec<Vec<String>>,
}

/// Infer delimiter and column roles from raw CSV text.
///
/// Delimiter: comma unless the header line carries semicolons and no commas,
/// or tabs (checked in that order). Returns `None` for blank input or an
/// unreadable header.
pub fn detect_format(csv_content: &str) -> Option<CsvFormat> {
    let header_line = csv_content.trim().lines().next()?;

    let delimiter = if header_line.contains(';') && !header_line.contains(',') {
        b';'
    } else if header_line.contains('\t') {
        b'\t'
    } else {
        b','
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_content.as_bytes());

    let headers: Vec<String> = reader.headers().ok()?.iter().map(|h| h.to_string()).collect();

    let columns = ColumnMap {
        date: bind_role(&headers, DATE_HEADERS),
        amount: bind_role(&headers, AMOUNT_HEADERS),
        description: bind_role(&headers, DESCRIPTION_HEADERS),
        category: bind_role(&headers, CATEGORY_HEADERS),
    };

    let sample_rows = reader
        .records()
        .take(SAMPLE_ROWS)
        .filter_map(|r| r.ok())
        .map(|record| record.iter().map(|cell| cell.to_string()).collect())
        .collect();

    Some(CsvFormat {
        delimiter,
        headers,
        columns,
        sample_rows,
    })
}

fn bind_role(headers: &[String], candidates: &[&str]) -> Option<usize> {
    headers.iter().position(|header| {
        let header = header.to_lowercase();
        candidates.iter().any(|candidate| header.contains(candidate))
    })
}
