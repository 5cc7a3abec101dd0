pub mod categorize;
pub mod detect;
pub mod duplicate;
pub mod parse;
pub mod pipeline;

pub use categorize::{CategoryKeywords, Classifier, DEFAULT_KEYWORDS, INCOME_CATEGORY, UNCATEGORIZED};
pub use detect::{detect_format, ColumnMap, CsvFormat};
pub use duplicate::{find_duplicates, DuplicateCandidate, DEFAULT_TOLERANCE_DAYS};
pub use parse::{parse_amount, parse_date};
pub use pipeline::{process_csv, ImportError, ImportReport, REQUIRED_ROLES};
