use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};
use std::path::Path;
use thiserror::Error;

use florin_core::{Budget, DateRange, Money, NewTransaction, Period, Transaction, UserId};

pub type DbPool = Pool<Sqlite>;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error(transparent)]
    Ledger(#[from] florin_core::LedgerError),
    #[error("A budget for this category and period already exists")]
    DuplicateBudget,
}

/// Spending aggregated per category over some window, descending by total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub category: String,
    pub total: Money,
    pub count: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TransactionCounts {
    pub total: i64,
    pub income: i64,
    pub expense: i64,
}

pub async fn create_db(path: &Path) -> Result<DbPool, StorageError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&format!("sqlite:{}?mode=rwc", path.display()))
        .await?;

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA cache_size = -32000")
        .execute(&pool)
        .await?;

    run_migrations(&pool).await?;
    tracing::debug!(path = %path.display(), "database ready");

    Ok(pool)
}

async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            date TEXT NOT NULL,
            amount_cents INTEGER NOT NULL,
            category TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            is_income INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_transactions_user_date ON transactions(user_id, date)",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_transactions_category ON transactions(category)")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS budgets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            category TEXT NOT NULL,
            limit_cents INTEGER NOT NULL,
            period TEXT NOT NULL DEFAULT 'monthly',
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE (user_id, category, period)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_budgets_user_category ON budgets(user_id, category)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

// ── Transactions ──────────────────────────────────────────────────────────────

pub async fn insert_transaction(pool: &DbPool, tx: &NewTransaction) -> Result<i64, StorageError> {
    tx.validate()?;

    let result = sqlx::query(
        "INSERT INTO transactions (user_id, date, amount_cents, category, description, is_income) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(tx.user_id.0)
    .bind(tx.date)
    .bind(tx.amount.to_cents())
    .bind(&tx.category)
    .bind(&tx.description)
    .bind(tx.is_income)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn get_transaction(
    pool: &DbPool,
    user: UserId,
    id: i64,
) -> Result<Option<Transaction>, StorageError> {
    let row = sqlx::query_as::<_, (i64, i64, NaiveDate, i64, String, String, bool)>(
        "SELECT id, user_id, date, amount_cents, category, description, is_income \
         FROM transactions WHERE id = ? AND user_id = ?",
    )
    .bind(id)
    .bind(user.0)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(transaction_from_row))
}

pub async fn update_transaction(pool: &DbPool, tx: &Transaction) -> Result<bool, StorageError> {
    let Some(id) = tx.id else {
        return Ok(false);
    };

    let result = sqlx::query(
        "UPDATE transactions SET date = ?, amount_cents = ?, category = ?, description = ?, \
         is_income = ? WHERE id = ? AND user_id = ?",
    )
    .bind(tx.date)
    .bind(tx.amount.to_cents())
    .bind(&tx.category)
    .bind(&tx.description)
    .bind(tx.is_income)
    .bind(id)
    .bind(tx.user_id.0)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete_transaction(pool: &DbPool, user: UserId, id: i64) -> Result<bool, StorageError> {
    let result = sqlx::query("DELETE FROM transactions WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user.0)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn transactions_between(
    pool: &DbPool,
    user: UserId,
    range: DateRange,
) -> Result<Vec<Transaction>, StorageError> {
    let rows = sqlx::query_as::<_, (i64, i64, NaiveDate, i64, String, String, bool)>(
        "SELECT id, user_id, date, amount_cents, category, description, is_income \
         FROM transactions WHERE user_id = ? AND date >= ? AND date <= ? \
         ORDER BY date DESC, id DESC",
    )
    .bind(user.0)
    .bind(range.start)
    .bind(range.end)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(transaction_from_row).collect())
}

/// Fetch the candidate set for duplicate checks: everything for this user
/// within ±`window_days` of `date`.
pub async fn transactions_near(
    pool: &DbPool,
    user: UserId,
    date: NaiveDate,
    window_days: i64,
) -> Result<Vec<Transaction>, StorageError> {
    let range = DateRange::new(
        date - Duration::days(window_days),
        date + Duration::days(window_days),
    );
    transactions_between(pool, user, range).await
}

fn transaction_from_row(r: (i64, i64, NaiveDate, i64, String, String, bool)) -> Transaction {
    Transaction {
        id: Some(r.0),
        user_id: UserId(r.1),
        date: r.2,
        amount: Money::from_cents(r.3),
        category: r.4,
        description: r.5,
        is_income: r.6,
    }
}

// ── Aggregate queries ─────────────────────────────────────────────────────────

pub async fn sum_income(
    pool: &DbPool,
    user: UserId,
    range: DateRange,
) -> Result<Money, StorageError> {
    sum_amount(pool, user, range, true, None).await
}

pub async fn sum_expenses(
    pool: &DbPool,
    user: UserId,
    range: DateRange,
) -> Result<Money, StorageError> {
    sum_amount(pool, user, range, false, None).await
}

pub async fn sum_category_expenses(
    pool: &DbPool,
    user: UserId,
    category: &str,
    range: DateRange,
) -> Result<Money, StorageError> {
    sum_amount(pool, user, range, false, Some(category)).await
}

async fn sum_amount(
    pool: &DbPool,
    user: UserId,
    range: DateRange,
    is_income: bool,
    category: Option<&str>,
) -> Result<Money, StorageError> {
    let cents: i64 = match category {
        Some(category) => {
            sqlx::query_scalar(
                "SELECT COALESCE(SUM(amount_cents), 0) FROM transactions \
                 WHERE user_id = ? AND is_income = ? AND category = ? AND date >= ? AND date <= ?",
            )
            .bind(user.0)
            .bind(is_income)
            .bind(category)
            .bind(range.start)
            .bind(range.end)
            .fetch_one(pool)
            .await?
        }
        None => {
            sqlx::query_scalar(
                "SELECT COALESCE(SUM(amount_cents), 0) FROM transactions \
                 WHERE user_id = ? AND is_income = ? AND date >= ? AND date <= ?",
            )
            .bind(user.0)
            .bind(is_income)
            .bind(range.start)
            .bind(range.end)
            .fetch_one(pool)
            .await?
        }
    };

    Ok(Money::from_cents(cents))
}

/// Expense totals grouped by category, biggest spender first.
pub async fn expenses_by_category(
    pool: &DbPool,
    user: UserId,
    range: DateRange,
) -> Result<Vec<CategoryBreakdown>, StorageError> {
    let rows = sqlx::query_as::<_, (String, i64, i64)>(
        "SELECT category, COALESCE(SUM(amount_cents), 0) AS total_cents, COUNT(id) AS cnt \
         FROM transactions WHERE user_id = ? AND is_income = 0 AND date >= ? AND date <= ? \
         GROUP BY category ORDER BY total_cents DESC",
    )
    .bind(user.0)
    .bind(range.start)
    .bind(range.end)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(category, total_cents, count)| CategoryBreakdown {
            category,
            total: Money::from_cents(total_cents),
            count,
        })
        .collect())
}

pub async fn transaction_counts(
    pool: &DbPool,
    user: UserId,
    range: DateRange,
) -> Result<TransactionCounts, StorageError> {
    let (total, income, expense) = sqlx::query_as::<_, (i64, i64, i64)>(
        "SELECT COUNT(id), \
                COALESCE(SUM(CASE WHEN is_income = 1 THEN 1 ELSE 0 END), 0), \
                COALESCE(SUM(CASE WHEN is_income = 0 THEN 1 ELSE 0 END), 0) \
         FROM transactions WHERE user_id = ? AND date >= ? AND date <= ?",
    )
    .bind(user.0)
    .bind(range.start)
    .bind(range.end)
    .fetch_one(pool)
    .await?;

    Ok(TransactionCounts {
        total,
        income,
        expense,
    })
}

// ── Budgets ───────────────────────────────────────────────────────────────────

pub async fn insert_budget(pool: &DbPool, budget: &Budget) -> Result<i64, StorageError> {
    budget.validate()?;

    let result = sqlx::query(
        "INSERT INTO budgets (user_id, category, limit_cents, period) VALUES (?, ?, ?, ?)",
    )
    .bind(budget.user_id.0)
    .bind(&budget.category)
    .bind(budget.limit.to_cents())
    .bind(budget.period.as_str())
    .execute(pool)
    .await;

    match result {
        Ok(done) => Ok(done.last_insert_rowid()),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(StorageError::DuplicateBudget)
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn budgets_for(pool: &DbPool, user: UserId) -> Result<Vec<Budget>, StorageError> {
    let rows = sqlx::query_as::<_, (i64, i64, String, i64, String)>(
        "SELECT id, user_id, category, limit_cents, period FROM budgets \
         WHERE user_id = ? ORDER BY category",
    )
    .bind(user.0)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(budget_from_row).collect())
}

pub async fn budgets_for_period(
    pool: &DbPool,
    user: UserId,
    period: Period,
) -> Result<Vec<Budget>, StorageError> {
    let rows = sqlx::query_as::<_, (i64, i64, String, i64, String)>(
        "SELECT id, user_id, category, limit_cents, period FROM budgets \
         WHERE user_id = ? AND period = ? ORDER BY category",
    )
    .bind(user.0)
    .bind(period.as_str())
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(budget_from_row).collect())
}

pub async fn budget_for_category(
    pool: &DbPool,
    user: UserId,
    category: &str,
    period: Period,
) -> Result<Option<Budget>, StorageError> {
    let row = sqlx::query_as::<_, (i64, i64, String, i64, String)>(
        "SELECT id, user_id, category, limit_cents, period FROM budgets \
         WHERE user_id = ? AND category = ? AND period = ?",
    )
    .bind(user.0)
    .bind(category)
    .bind(period.as_str())
    .fetch_optional(pool)
    .await?;

    Ok(row.map(budget_from_row))
}

pub async fn delete_budget(pool: &DbPool, user: UserId, id: i64) -> Result<bool, StorageError> {
    let result = sqlx::query("DELETE FROM budgets WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user.0)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

fn budget_from_row(r: (i64, i64, String, i64, String)) -> Budget {
    Budget {
        id: Some(r.0),
        user_id: UserId(r.1),
        category: r.2,
        limit: Money::from_cents(r.3),
        // Unknown tokens in stored rows degrade to monthly, same as parsing.
        period: Period::parse(&r.4),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> (tempfile::TempDir, DbPool) {
        let dir = tempfile::tempdir().unwrap();
        let pool = create_db(&dir.path().join("test.db")).await.unwrap();
        (dir, pool)
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn tx(user: i64, date: NaiveDate, cents: i64, category: &str, is_income: bool) -> NewTransaction {
        NewTransaction {
            user_id: UserId(user),
            date,
            amount: Money::from_cents(cents),
            category: category.to_string(),
            description: format!("{category} purchase"),
            is_income,
        }
    }

    #[tokio::test]
    async fn insert_and_fetch_round_trips() {
        let (_dir, pool) = test_db().await;
        let id = insert_transaction(&pool, &tx(1, d(2023, 2, 15), 4550, "Food", false))
            .await
            .unwrap();

        let fetched = get_transaction(&pool, UserId(1), id).await.unwrap().unwrap();
        assert_eq!(fetched.amount, Money::from_cents(4550));
        assert_eq!(fetched.category, "Food");
        assert_eq!(fetched.date, d(2023, 2, 15));
        assert!(!fetched.is_income);
    }

    #[tokio::test]
    async fn insert_rejects_non_positive_amount() {
        let (_dir, pool) = test_db().await;
        let result = insert_transaction(&pool, &tx(1, d(2023, 2, 15), 0, "Food", false)).await;
        assert!(matches!(result, Err(StorageError::Ledger(_))));
    }

    #[tokio::test]
    async fn fetch_is_ownership_scoped() {
        let (_dir, pool) = test_db().await;
        let id = insert_transaction(&pool, &tx(1, d(2023, 2, 15), 4550, "Food", false))
            .await
            .unwrap();
        assert!(get_transaction(&pool, UserId(2), id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_and_delete() {
        let (_dir, pool) = test_db().await;
        let id = insert_transaction(&pool, &tx(1, d(2023, 2, 15), 4550, "Food", false))
            .await
            .unwrap();

        let mut stored = get_transaction(&pool, UserId(1), id).await.unwrap().unwrap();
        stored.category = "Shopping".to_string();
        assert!(update_transaction(&pool, &stored).await.unwrap());

        let updated = get_transaction(&pool, UserId(1), id).await.unwrap().unwrap();
        assert_eq!(updated.category, "Shopping");

        assert!(delete_transaction(&pool, UserId(1), id).await.unwrap());
        assert!(get_transaction(&pool, UserId(1), id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sums_are_window_and_flag_scoped() {
        let (_dir, pool) = test_db().await;
        let user = UserId(1);
        for t in [
            tx(1, d(2023, 2, 5), 10_000, "Food", false),
            tx(1, d(2023, 2, 20), 5_000, "Food", false),
            tx(1, d(2023, 2, 10), 200_000, "Income", true),
            tx(1, d(2023, 3, 1), 7_000, "Food", false), // outside window
            tx(2, d(2023, 2, 10), 9_999, "Food", false), // other owner
        ] {
            insert_transaction(&pool, &t).await.unwrap();
        }

        let feb = DateRange::new(d(2023, 2, 1), d(2023, 2, 28));
        assert_eq!(sum_expenses(&pool, user, feb).await.unwrap(), Money::from_cents(15_000));
        assert_eq!(sum_income(&pool, user, feb).await.unwrap(), Money::from_cents(200_000));
        assert_eq!(
            sum_category_expenses(&pool, user, "Food", feb).await.unwrap(),
            Money::from_cents(15_000)
        );
        assert_eq!(
            sum_category_expenses(&pool, user, "Rent", feb).await.unwrap(),
            Money::zero()
        );
    }

    #[tokio::test]
    async fn empty_window_sums_to_zero() {
        let (_dir, pool) = test_db().await;
        let range = DateRange::new(d(2023, 2, 1), d(2023, 2, 28));
        assert_eq!(sum_expenses(&pool, UserId(1), range).await.unwrap(), Money::zero());
    }

    #[tokio::test]
    async fn breakdown_groups_and_sorts_descending() {
        let (_dir, pool) = test_db().await;
        for t in [
            tx(1, d(2023, 2, 5), 3_000, "Entertainment", false),
            tx(1, d(2023, 2, 6), 10_000, "Food", false),
            tx(1, d(2023, 2, 7), 5_000, "Food", false),
            tx(1, d(2023, 2, 8), 200_000, "Income", true), // income excluded
        ] {
            insert_transaction(&pool, &t).await.unwrap();
        }

        let feb = DateRange::new(d(2023, 2, 1), d(2023, 2, 28));
        let breakdown = expenses_by_category(&pool, UserId(1), feb).await.unwrap();
        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown[0].category, "Food");
        assert_eq!(breakdown[0].total, Money::from_cents(15_000));
        assert_eq!(breakdown[0].count, 2);
        assert_eq!(breakdown[1].category, "Entertainment");
    }

    #[tokio::test]
    async fn counts_split_by_direction() {
        let (_dir, pool) = test_db().await;
        for t in [
            tx(1, d(2023, 2, 5), 3_000, "Food", false),
            tx(1, d(2023, 2, 6), 10_000, "Food", false),
            tx(1, d(2023, 2, 8), 200_000, "Income", true),
        ] {
            insert_transaction(&pool, &t).await.unwrap();
        }

        let feb = DateRange::new(d(2023, 2, 1), d(2023, 2, 28));
        let counts = transaction_counts(&pool, UserId(1), feb).await.unwrap();
        assert_eq!(counts.total, 3);
        assert_eq!(counts.income, 1);
        assert_eq!(counts.expense, 2);
    }

    #[tokio::test]
    async fn transactions_near_spans_the_window() {
        let (_dir, pool) = test_db().await;
        for t in [
            tx(1, d(2023, 2, 14), 1_000, "Food", false),
            tx(1, d(2023, 2, 15), 2_000, "Food", false),
            tx(1, d(2023, 2, 17), 3_000, "Food", false), // outside ±1
        ] {
            insert_transaction(&pool, &t).await.unwrap();
        }

        let near = transactions_near(&pool, UserId(1), d(2023, 2, 15), 1).await.unwrap();
        assert_eq!(near.len(), 2);
    }

    #[tokio::test]
    async fn budget_unique_per_user_category_period() {
        let (_dir, pool) = test_db().await;
        let budget = Budget {
            id: None,
            user_id: UserId(1),
            category: "Food".to_string(),
            limit: Money::from_cents(50_000),
            period: Period::Monthly,
        };
        insert_budget(&pool, &budget).await.unwrap();
        assert!(matches!(
            insert_budget(&pool, &budget).await,
            Err(StorageError::DuplicateBudget)
        ));

        // Same category under a different period is fine.
        let weekly = Budget {
            period: Period::Weekly,
            ..budget.clone()
        };
        insert_budget(&pool, &weekly).await.unwrap();
    }

    #[tokio::test]
    async fn budget_queries_round_trip() {
        let (_dir, pool) = test_db().await;
        for (category, period) in [("Food", Period::Monthly), ("Rent", Period::Monthly), ("Travel", Period::Yearly)] {
            insert_budget(
                &pool,
                &Budget {
                    id: None,
                    user_id: UserId(1),
                    category: category.to_string(),
                    limit: Money::from_cents(100_000),
                    period,
                },
            )
            .await
            .unwrap();
        }

        assert_eq!(budgets_for(&pool, UserId(1)).await.unwrap().len(), 3);
        assert_eq!(
            budgets_for_period(&pool, UserId(1), Period::Monthly).await.unwrap().len(),
            2
        );

        let food = budget_for_category(&pool, UserId(1), "Food", Period::Monthly)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(food.limit, Money::from_cents(100_000));
        assert_eq!(food.period, Period::Monthly);

        assert!(budget_for_category(&pool, UserId(2), "Food", Period::Monthly)
            .await
            .unwrap()
            .is_none());

        let id = food.id.unwrap();
        assert!(delete_budget(&pool, UserId(1), id).await.unwrap());
        assert!(budget_for_category(&pool, UserId(1), "Food", Period::Monthly)
            .await
            .unwrap()
            .is_none());
    }
}
