//! Budget line ledger: figures, derived balances, and allocation schedules.

pub mod allocation;
pub mod error;
pub mod types;

#[cfg(test)]
mod allocation_props;

pub use allocation::MonthlySchedule;
pub use error::LedgerError;
pub use types::{BudgetLine, LineDelta, LineKey};
