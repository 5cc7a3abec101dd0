pub mod budget;
pub mod summary;

pub use budget::{
    budget_alerts, budget_performance_history, budget_recommendations, budget_status,
    optimize_allocation, projected_spending, status_label, AllocationSuggestion, BudgetAlert,
    BudgetMonth, BudgetRecommendation, BudgetStatus, DEFAULT_ALERT_THRESHOLDS, TRAILING_MONTHS,
};
pub use summary::{
    budget_performance, category_breakdown, category_spending, financial_summary, monthly_trends,
    top_categories, total_expenses, total_income, BudgetPerformance, FinancialSummary,
    MonthlyTrend, Totals, TOP_CATEGORIES_LIMIT,
};
