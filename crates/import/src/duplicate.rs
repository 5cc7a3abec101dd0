use chrono::NaiveDate;
use rust_decimal::Decimal;

use florin_core::{Money, Transaction, UserId};

/// Default date window (± days) for considering two transactions duplicates.
pub const DEFAULT_TOLERANCE_DAYS: i64 = 1;

/// A not-yet-persisted transaction being checked against the store.
#[derive(Debug, Clone)]
pub struct DuplicateCandidate {
    pub user_id: UserId,
    pub date: NaiveDate,
    pub amount: Money,
    pub description: String,
}

impl DuplicateCandidate {
    pub fn from_new(tx: &florin_core::NewTransaction) -> Self {
        DuplicateCandidate {
            user_id: tx.user_id,
            date: tx.date,
            amount: tx.amount,
            description: tx.description.clone(),
        }
    }
}

/// Find existing transactions that plausibly duplicate `candidate`.
///
/// A record matches when every predicate holds: same owner, amount within
/// ±1% of the candidate's, description containing the candidate
/// description's first 20 characters (case-sensitive), and date within
/// ±`tolerance_days`. No match yields an empty list, never an error.
pub fn find_duplicates<'a>(
    candidate: &DuplicateCandidate,
    existing: &'a [Transaction],
    tolerance_days: i64,
) -> Vec<&'a Transaction> {
    let amount = candidate.amount.to_decimal();
    let tolerance = amount * Decimal::new(1, 2); // 1%
    let low = amount - tolerance;
    let high = amount + tolerance;
    let prefix: String = candidate.description.chars().take(20).collect();

    existing
        .iter()
        .filter(|tx| {
            tx.user_id == candidate.user_id
                && tx.amount.to_decimal() >= low
                && tx.amount.to_decimal() <= high
                && tx.description.contains(&prefix)
                && (tx.date - candidate.date).num_days().abs() <= tolerance_days
        })
        .collect()
}
