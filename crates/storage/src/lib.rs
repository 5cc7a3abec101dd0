pub mod db;

pub use db::{
    budget_for_category, budgets_for, budgets_for_period, create_db, delete_budget,
    delete_transaction, expenses_by_category, get_transaction, insert_budget, insert_transaction,
    sum_category_expenses, sum_expenses, sum_income, transaction_counts, transactions_between,
    transactions_near, update_transaction, CategoryBreakdown, DbPool, StorageError,
    TransactionCounts,
};
