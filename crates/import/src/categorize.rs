use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const UNCATEGORIZED: &str = "Uncategorized";
pub const INCOME_CATEGORY: &str = "Income";

/// Built-in keyword table. Scan order is a behavioral contract: categories
/// are checked top to bottom and the first keyword hit wins, so e.g. a
/// "gas bill" description is claimed by Transportation ("gas") before
/// Utilities ("gas bill") ever gets a look.
pub const DEFAULT_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "Food",
        &[
            "restaurant",
            "food",
            "grocery",
            "supermarket",
            "dining",
            "cafe",
            "coffee",
            "lunch",
            "dinner",
            "breakfast",
        ],
    ),
    (
        "Transportation",
        &[
            "gas", "fuel", "uber", "lyft", "taxi", "bus", "train", "metro", "parking", "toll",
        ],
    ),
    (
        "Entertainment",
        &[
            "movie",
            "cinema",
            "netflix",
            "spotify",
            "game",
            "concert",
            "theater",
            "entertainment",
        ],
    ),
    (
        "Shopping",
        &[
            "amazon",
            "store",
            "shop",
            "clothing",
            "fashion",
            "electronics",
            "retail",
        ],
    ),
    (
        "Healthcare",
        &[
            "doctor", "hospital", "pharmacy", "medical", "health", "dental", "clinic",
        ],
    ),
    (
        "Utilities",
        &[
            "electric", "water", "gas bill", "internet", "phone", "utility", "cable",
        ],
    ),
    ("Rent", &["rent", "housing", "apartment", "mortgage", "lease"]),
    ("Insurance", &["insurance", "premium", "policy"]),
    (
        "Education",
        &["school", "education", "tuition", "book", "course", "university"],
    ),
    (
        INCOME_CATEGORY,
        &[
            "salary", "wage", "bonus", "income", "payroll", "deposit", "refund",
        ],
    ),
];

/// One row of the keyword table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryKeywords {
    pub category: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct KeywordTable {
    categories: Vec<CategoryKeywords>,
}

/// Keyword-based transaction categorizer.
///
/// Matching is case-insensitive substring containment against the
/// description. Income keywords are consulted first, and only when the
/// signed amount is positive; expense categories are then scanned in table
/// order, first match wins.
pub struct Classifier {
    table: Vec<CategoryKeywords>,
}

impl Default for Classifier {
    fn default() -> Self {
        Classifier::new(
            DEFAULT_KEYWORDS
                .iter()
                .map(|(category, keywords)| CategoryKeywords {
                    category: category.to_string(),
                    keywords: keywords.iter().map(|k| k.to_string()).collect(),
                })
                .collect(),
        )
    }
}

impl Classifier {
    pub fn new(table: Vec<CategoryKeywords>) -> Self {
        let table = table
            .into_iter()
            .map(|mut entry| {
                for keyword in &mut entry.keywords {
                    *keyword = keyword.to_lowercase();
                }
                entry
            })
            .collect();
        Self { table }
    }

    /// Load a keyword table from TOML, preserving declaration order:
    ///
    /// ```toml
    /// [[categories]]
    /// category = "Food"
    /// keywords = ["grocery", "restaurant"]
    /// ```
    pub fn from_toml(toml_content: &str) -> Result<Self, String> {
        let table: KeywordTable =
            toml::from_str(toml_content).map_err(|e| format!("Failed to parse TOML: {e}"))?;
        Ok(Self::new(table.categories))
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.table.iter().map(|entry| entry.category.as_str())
    }

    /// Categorize a description given the signed amount from parsing
    /// (positive means money in). Unmatched text → `"Uncategorized"`.
    pub fn categorize(&self, description: &str, amount: Decimal) -> String {
        if description.is_empty() {
            return UNCATEGORIZED.to_string();
        }

        let text = description.to_lowercase();

        if amount > Decimal::ZERO {
            let income_hit = self
                .table
                .iter()
                .filter(|entry| entry.category == INCOME_CATEGORY)
                .any(|entry| entry.keywords.iter().any(|k| text.contains(k.as_str())));
            if income_hit {
                return INCOME_CATEGORY.to_string();
            }
        }

        for entry in &self.table {
            if entry.category == INCOME_CATEGORY {
                continue;
            }
            if entry.keywords.iter().any(|k| text.contains(k.as_str())) {
                return entry.category.clone();
            }
        }

        UNCATEGORIZED.to_string()
    }
}
