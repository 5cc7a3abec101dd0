pub mod money;
pub mod period;
pub mod transaction;

pub use money::Money;
pub use period::{month_start, months_back, DateRange, Period};
pub use transaction::{Budget, LedgerError, NewTransaction, Transaction, UserId};
