use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use florin_core::{months_back, Budget, DateRange, Money, Period, UserId};
use florin_storage::{
    budget_for_category, budgets_for, expenses_by_category, sum_category_expenses, DbPool,
    StorageError,
};

/// Months of spending history consulted by recommendations and allocation.
pub const TRAILING_MONTHS: u32 = 3;

/// Alert thresholds checked per budget; only the highest crossed one fires.
pub const DEFAULT_ALERT_THRESHOLDS: &[f64] = &[75.0, 90.0, 100.0];

/// Qualitative label for a percentage of budget used. The boundaries are
/// strict: exactly 75% is still "good".
pub fn status_label(percentage_used: f64) -> &'static str {
    if percentage_used > 100.0 {
        "over"
    } else if percentage_used > 90.0 {
        "critical"
    } else if percentage_used > 75.0 {
        "warning"
    } else {
        "good"
    }
}

pub fn status_message(status: &str) -> &'static str {
    match status {
        "over" => "Over budget",
        "critical" => "Critical - 90%+ used",
        "warning" => "Warning - 75%+ used",
        _ => "On track",
    }
}

/// Spending for the whole period extrapolated from the run rate so far.
/// Nothing elapsed yet means nothing to extrapolate from.
pub fn projected_spending(spent: Money, range: DateRange, today: NaiveDate) -> Money {
    let days_elapsed = range.days_elapsed(today);
    if days_elapsed <= 0 {
        return Money::zero();
    }
    let daily_rate = spent.to_decimal() / Decimal::from(days_elapsed);
    Money::from_decimal(daily_rate * Decimal::from(range.total_days()))
}

#[derive(Debug, Clone, Serialize)]
pub struct BudgetStatus {
    pub budget_id: Option<i64>,
    pub category: String,
    pub period: Period,
    pub limit: Money,
    pub spent: Money,
    pub remaining: Money,
    pub percentage_used: f64,
    pub status: String,
    pub status_message: String,
    pub days_remaining: i64,
    pub daily_budget: Money,
    pub projected_spending: Money,
}

#[derive(Debug, Clone, Serialize)]
pub struct BudgetAlert {
    pub budget_id: Option<i64>,
    pub category: String,
    pub alert_type: String,
    pub threshold: f64,
    pub percentage_used: f64,
    pub spent: Money,
    pub limit: Money,
    pub remaining: Money,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BudgetRecommendation {
    pub category: String,
    pub action: String,
    pub current_limit: Option<Money>,
    pub recommended_limit: Money,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BudgetMonth {
    pub month: String,
    pub month_name: String,
    pub limit: Money,
    pub spent: Money,
    pub remaining: Money,
    pub percentage_used: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AllocationSuggestion {
    pub category: String,
    pub current_avg: Money,
    pub percentage: f64,
    pub suggested_allocation: Money,
    pub priority: String,
}

/// Full status for one budget as of `today`: spend against limit, days and
/// allowance remaining, and the run-rate projection for the whole window.
pub async fn budget_status(
    pool: &DbPool,
    budget: &Budget,
    today: NaiveDate,
) -> Result<BudgetStatus, StorageError> {
    let range = DateRange::for_period(budget.period, today);
    let spent = sum_category_expenses(pool, budget.user_id, &budget.category, range).await?;
    let remaining = budget.limit - spent;
    let percentage_used = spent.percent_of(budget.limit);
    let status = status_label(percentage_used);
    let days_remaining = budget.period.days_remaining(today);
    let daily_budget = if remaining.is_positive() {
        remaining.per_day(days_remaining)
    } else {
        Money::zero()
    };

    Ok(BudgetStatus {
        budget_id: budget.id,
        category: budget.category.clone(),
        period: budget.period,
        limit: budget.limit,
        spent,
        remaining,
        percentage_used,
        status: status.to_string(),
        status_message: status_message(status).to_string(),
        days_remaining,
        daily_budget,
        projected_spending: projected_spending(spent, range, today),
    })
}

/// One alert per breached budget, tagged with the highest threshold crossed.
/// Crossing is inclusive (at exactly 75% the 75 threshold fires); "critical"
/// is reserved for the 100% threshold.
pub async fn budget_alerts(
    pool: &DbPool,
    user: UserId,
    thresholds: &[f64],
    today: NaiveDate,
) -> Result<Vec<BudgetAlert>, StorageError> {
    let mut alerts = Vec::new();

    for budget in budgets_for(pool, user).await? {
        let status = budget_status(pool, &budget, today).await?;

        let crossed = thresholds
            .iter()
            .copied()
            .filter(|threshold| status.percentage_used >= *threshold)
            .max_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let Some(threshold) = crossed else { continue };

        let alert_type = if threshold >= 100.0 { "critical" } else { "warning" };
        alerts.push(BudgetAlert {
            budget_id: budget.id,
            category: budget.category.clone(),
            alert_type: alert_type.to_string(),
            threshold,
            percentage_used: status.percentage_used,
            spent: status.spent,
            limit: status.limit,
            remaining: status.remaining,
            message: format!(
                "{} budget is {:.1}% used ({}% threshold)",
                budget.category, status.percentage_used, threshold
            ),
        });
    }

    Ok(alerts)
}

/// Propose budget changes from the trailing spending averages: raise budgets
/// that average more than 110% of their limit (with a 20% buffer), trim ones
/// averaging under 80% (10% buffer), and suggest new budgets for unbudgeted
/// categories averaging over $50/month. Categories need at least two months
/// of data to qualify.
pub async fn budget_recommendations(
    pool: &DbPool,
    user: UserId,
    period: Period,
    today: NaiveDate,
) -> Result<Vec<BudgetRecommendation>, StorageError> {
    let spending = trailing_monthly_spending(pool, user, today).await?;
    let mut recommendations = Vec::new();

    for (category, amounts) in &spending {
        if amounts.len() < 2 {
            continue;
        }
        let avg = average(amounts);

        match budget_for_category(pool, user, category, period).await? {
            Some(existing) => {
                let limit = existing.limit.to_decimal();
                if avg > limit * Decimal::new(11, 1) {
                    recommendations.push(BudgetRecommendation {
                        category: category.clone(),
                        action: "increase".to_string(),
                        current_limit: Some(existing.limit),
                        recommended_limit: Money::from_decimal(avg * Decimal::new(12, 1)),
                        reason: format!("Average spending (${avg:.2}) exceeds current budget"),
                    });
                } else if avg < limit * Decimal::new(8, 1) {
                    recommendations.push(BudgetRecommendation {
                        category: category.clone(),
                        action: "decrease".to_string(),
                        current_limit: Some(existing.limit),
                        recommended_limit: Money::from_decimal(avg * Decimal::new(11, 1)),
                        reason: format!(
                            "Average spending (${avg:.2}) is well below current budget"
                        ),
                    });
                }
            }
            None => {
                if avg > Decimal::from(50) {
                    recommendations.push(BudgetRecommendation {
                        category: category.clone(),
                        action: "create".to_string(),
                        current_limit: None,
                        recommended_limit: Money::from_decimal(avg * Decimal::new(12, 1)),
                        reason: format!("Regular spending of ${avg:.2} per month detected"),
                    });
                }
            }
        }
    }

    Ok(recommendations)
}

/// Month-by-month record of how `category` tracked against its monthly
/// budget, oldest month first. No monthly budget → empty history.
pub async fn budget_performance_history(
    pool: &DbPool,
    user: UserId,
    category: &str,
    months: u32,
    today: NaiveDate,
) -> Result<Vec<BudgetMonth>, StorageError> {
    let Some(budget) = budget_for_category(pool, user, category, Period::Monthly).await? else {
        return Ok(Vec::new());
    };

    let mut history = Vec::new();
    for i in (0..months).rev() {
        let anchor = months_back(today, i);
        let range = DateRange::for_period(Period::Monthly, anchor);
        let spent = sum_category_expenses(pool, user, category, range).await?;

        history.push(BudgetMonth {
            month: anchor.format("%Y-%m").to_string(),
            month_name: anchor.format("%B %Y").to_string(),
            limit: budget.limit,
            spent,
            remaining: budget.limit - spent,
            percentage_used: spent.percent_of(budget.limit),
        });
    }

    Ok(history)
}

/// Split a target total across categories in proportion to each category's
/// share of trailing average spending. Shares over 20% are high priority,
/// over 10% medium, the rest low.
pub async fn optimize_allocation(
    pool: &DbPool,
    user: UserId,
    total_budget: Money,
    today: NaiveDate,
) -> Result<Vec<AllocationSuggestion>, StorageError> {
    let spending = trailing_monthly_spending(pool, user, today).await?;

    // The denominator spans every category with any data, including ones
    // below the two-month cutoff for receiving a suggestion.
    let total_spending: Decimal = spending.values().map(|amounts| average(amounts)).sum();

    let mut allocations = Vec::new();
    for (category, amounts) in &spending {
        if amounts.len() < 2 {
            continue;
        }
        let avg = average(amounts);
        let share = if total_spending > Decimal::ZERO {
            avg / total_spending
        } else {
            Decimal::ZERO
        };
        let percentage = (share * Decimal::from(100)).to_f64().unwrap_or(0.0);
        let priority = if percentage > 20.0 {
            "high"
        } else if percentage > 10.0 {
            "medium"
        } else {
            "low"
        };

        allocations.push(AllocationSuggestion {
            category: category.clone(),
            current_avg: Money::from_decimal(avg),
            percentage,
            suggested_allocation: total_budget * share,
            priority: priority.to_string(),
        });
    }

    allocations.sort_by(|a, b| {
        b.percentage
            .partial_cmp(&a.percentage)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    Ok(allocations)
}

/// Per-category expense totals for each of the trailing months, keyed by
/// category; a category only has entries for months it saw spending.
async fn trailing_monthly_spending(
    pool: &DbPool,
    user: UserId,
    today: NaiveDate,
) -> Result<BTreeMap<String, Vec<Money>>, StorageError> {
    let mut spending: BTreeMap<String, Vec<Money>> = BTreeMap::new();

    for i in 0..TRAILING_MONTHS {
        let range = DateRange::for_period(Period::Monthly, months_back(today, i));
        for entry in expenses_by_category(pool, user, range).await? {
            spending.entry(entry.category).or_default().push(entry.total);
        }
    }

    Ok(spending)
}

fn average(amounts: &[Money]) -> Decimal {
    amounts.iter().map(|m| m.to_decimal()).sum::<Decimal>() / Decimal::from(amounts.len() as u64)
}
