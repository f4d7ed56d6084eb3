//! Read-only query and aggregation over budget lines.

pub mod filter;
pub mod summary;

pub use filter::LineFilter;
pub use summary::{BudgetSummary, StatementRow};
