use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::money::Money;
use super::period::Period;

/// Owner of transactions and budgets. Every stored entity belongs to exactly
/// one user; nothing is shared across owners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("Transaction amount must be positive, got {0}")]
    NonPositiveAmount(Money),
    #[error("Budget limit must be positive, got {0}")]
    NonPositiveLimit(Money),
    #[error("Category must not be empty")]
    EmptyCategory,
}

/// A persisted transaction. `amount` is always positive; the direction lives
/// in `is_income`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Option<i64>,
    pub user_id: UserId,
    pub date: NaiveDate,
    pub amount: Money,
    pub category: String,
    pub description: String,
    pub is_income: bool,
}

/// A transaction not yet persisted — what the import pipeline emits and
/// manual entry produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransaction {
    pub user_id: UserId,
    pub date: NaiveDate,
    pub amount: Money,
    pub category: String,
    pub description: String,
    pub is_income: bool,
}

impl NewTransaction {
    pub fn validate(&self) -> Result<(), LedgerError> {
        if !self.amount.is_positive() {
            return Err(LedgerError::NonPositiveAmount(self.amount));
        }
        Ok(())
    }
}

/// A per-category spending cap. Unique per (user, category, period); current
/// spending, remaining, and percentage-used are derived on read, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: Option<i64>,
    pub user_id: UserId,
    pub category: String,
    pub limit: Money,
    pub period: Period,
}

impl Budget {
    pub fn validate(&self) -> Result<(), LedgerError> {
        if !self.limit.is_positive() {
            return Err(LedgerError::NonPositiveLimit(self.limit));
        }
        if self.category.trim().is_empty() {
            return Err(LedgerError::EmptyCategory);
        }
        Ok(())
    }
}
