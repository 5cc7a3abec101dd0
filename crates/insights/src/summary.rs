use chrono::NaiveDate;
use serde::Serialize;

use florin_core::{months_back, DateRange, Money, Period, UserId};
use florin_storage::{
    budgets_for_period, expenses_by_category, sum_category_expenses, sum_expenses, sum_income,
    transaction_counts, CategoryBreakdown, DbPool, StorageError, TransactionCounts,
};

use crate::budget::status_label;

/// How many categories the composite summary surfaces as "top".
pub const TOP_CATEGORIES_LIMIT: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyTrend {
    pub month: String,
    pub month_name: String,
    pub income: Money,
    pub expenses: Money,
    pub net: Money,
}

#[derive(Debug, Clone, Serialize)]
pub struct Totals {
    pub income: Money,
    pub expenses: Money,
    pub net: Money,
}

#[derive(Debug, Clone, Serialize)]
pub struct BudgetPerformance {
    pub budget_id: Option<i64>,
    pub category: String,
    pub limit: Money,
    pub spent: Money,
    pub remaining: Money,
    pub percentage_used: f64,
    pub status: String,
    pub period: Period,
}

/// Everything a dashboard needs for one period, in a single payload.
#[derive(Debug, Clone, Serialize)]
pub struct FinancialSummary {
    pub period: Period,
    pub date_range: DateRange,
    pub totals: Totals,
    pub transaction_counts: TransactionCounts,
    pub category_breakdown: Vec<CategoryBreakdown>,
    pub budget_performance: Vec<BudgetPerformance>,
    pub top_categories: Vec<CategoryBreakdown>,
}

pub async fn total_income(
    pool: &DbPool,
    user: UserId,
    period: Period,
    anchor: NaiveDate,
) -> Result<Money, StorageError> {
    sum_income(pool, user, DateRange::for_period(period, anchor)).await
}

pub async fn total_expenses(
    pool: &DbPool,
    user: UserId,
    period: Period,
    anchor: NaiveDate,
) -> Result<Money, StorageError> {
    sum_expenses(pool, user, DateRange::for_period(period, anchor)).await
}

pub async fn category_spending(
    pool: &DbPool,
    user: UserId,
    category: &str,
    period: Period,
    anchor: NaiveDate,
) -> Result<Money, StorageError> {
    sum_category_expenses(pool, user, category, DateRange::for_period(period, anchor)).await
}

/// Expense totals per category over the period, biggest first.
pub async fn category_breakdown(
    pool: &DbPool,
    user: UserId,
    period: Period,
    anchor: NaiveDate,
) -> Result<Vec<CategoryBreakdown>, StorageError> {
    expenses_by_category(pool, user, DateRange::for_period(period, anchor)).await
}

pub async fn top_categories(
    pool: &DbPool,
    user: UserId,
    period: Period,
    anchor: NaiveDate,
    limit: usize,
) -> Result<Vec<CategoryBreakdown>, StorageError> {
    let mut breakdown = category_breakdown(pool, user, period, anchor).await?;
    breakdown.truncate(limit);
    Ok(breakdown)
}

/// Income/expense/net per calendar month for the `months` ending with
/// `today`'s month, oldest first.
pub async fn monthly_trends(
    pool: &DbPool,
    user: UserId,
    months: u32,
    today: NaiveDate,
) -> Result<Vec<MonthlyTrend>, StorageError> {
    let mut trends = Vec::new();

    for i in (0..months).rev() {
        let anchor = months_back(today, i);
        let range = DateRange::for_period(Period::Monthly, anchor);
        let income = sum_income(pool, user, range).await?;
        let expenses = sum_expenses(pool, user, range).await?;

        trends.push(MonthlyTrend {
            month: anchor.format("%Y-%m").to_string(),
            month_name: anchor.format("%B %Y").to_string(),
            income,
            expenses,
            net: income - expenses,
        });
    }

    Ok(trends)
}

/// Spend-against-limit snapshot for every budget of the given period.
pub async fn budget_performance(
    pool: &DbPool,
    user: UserId,
    period: Period,
    anchor: NaiveDate,
) -> Result<Vec<BudgetPerformance>, StorageError> {
    let range = DateRange::for_period(period, anchor);
    let mut performance = Vec::new();

    for budget in budgets_for_period(pool, user, period).await? {
        let spent = sum_category_expenses(pool, user, &budget.category, range).await?;
        let remaining = budget.limit - spent;
        let percentage_used = spent.percent_of(budget.limit);

        performance.push(BudgetPerformance {
            budget_id: budget.id,
            category: budget.category,
            limit: budget.limit,
            spent,
            remaining,
            percentage_used,
            status: status_label(percentage_used).to_string(),
            period,
        });
    }

    Ok(performance)
}

pub async fn financial_summary(
    pool: &DbPool,
    user: UserId,
    period: Period,
    anchor: NaiveDate,
) -> Result<FinancialSummary, StorageError> {
    let date_range = DateRange::for_period(period, anchor);

    let income = sum_income(pool, user, date_range).await?;
    let expenses = sum_expenses(pool, user, date_range).await?;
    let category_breakdown = expenses_by_category(pool, user, date_range).await?;
    let counts = transaction_counts(pool, user, date_range).await?;
    let budget_performance = budget_performance(pool, user, period, anchor).await?;

    let mut top_categories = category_breakdown.clone();
    top_categories.truncate(TOP_CATEGORIES_LIMIT);

    Ok(FinancialSummary {
        period,
        date_range,
        totals: Totals {
            income,
            expenses,
            net: income - expenses,
        },
        transaction_counts: counts,
        category_breakdown,
        budget_performance,
        top_categories,
    })
}
