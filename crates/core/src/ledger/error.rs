//! Ledger error types.

use fiscus_shared::types::BudgetLineId;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Amount must be strictly positive.
    #[error("Invalid amount {0}: amount must be greater than zero")]
    InvalidAmount(Decimal),

    /// Appropriation balance is too low for the requested movement.
    #[error("Insufficient appropriation balance: available {available}, requested {requested}")]
    InsufficientBalance {
        /// The appropriation balance currently available on the source line.
        available: Decimal,
        /// The amount the document asked to move or release.
        requested: Decimal,
    },

    /// Allotment balance is too low for the requested consumption.
    #[error("Insufficient allotment balance: available {available}, requested {requested}")]
    InsufficientAllotment {
        /// The allotment balance currently available on the line.
        available: Decimal,
        /// The amount the document asked to charge.
        requested: Decimal,
    },

    /// Transfer source and target must be different lines.
    #[error("Transfer source and target refer to the same budget line")]
    SameLine,

    /// A cumulative figure would become negative.
    #[error("Ledger figure {figure} would become negative")]
    NegativeFigure {
        /// Name of the figure that would go below zero.
        figure: &'static str,
    },

    /// A derived balance went below zero on re-validation.
    #[error("The {balance} balance would become negative ({value})")]
    NegativeBalance {
        /// Name of the derived balance.
        balance: &'static str,
        /// The value the balance would take.
        value: Decimal,
    },

    /// Monthly allocations no longer sum to the adjusted appropriation.
    #[error(
        "Monthly allocations sum {allocated} does not match adjusted appropriation {adjusted}"
    )]
    AllocationMismatch {
        /// Sum of the twelve monthly allocations.
        allocated: Decimal,
        /// The adjusted appropriation the schedule must cover.
        adjusted: Decimal,
    },

    /// A monthly schedule must have exactly twelve entries.
    #[error("Monthly schedule has {0} entries, expected 12")]
    InvalidScheduleLength(usize),

    /// Budget line not found.
    #[error("Budget line {0} not found")]
    LineNotFound(BudgetLineId),

    /// A budget line already exists for the fiscal dimension tuple.
    #[error("A budget line already exists for this fiscal dimension tuple")]
    DuplicateLine,

    /// Optimistic write lost the race; caller should re-read and retry.
    #[error("Version conflict on budget line {0}, please retry")]
    VersionConflict(BudgetLineId),

    /// Bounded retries exhausted.
    #[error("Concurrent writers exhausted retries on budget line {0}")]
    Conflict(BudgetLineId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl LedgerError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidAmount(_)
            | Self::SameLine
            | Self::InvalidScheduleLength(_) => 400,
            Self::InsufficientBalance { .. }
            | Self::InsufficientAllotment { .. }
            | Self::NegativeFigure { .. }
            | Self::NegativeBalance { .. }
            | Self::AllocationMismatch { .. } => 422,
            Self::LineNotFound(_) => 404,
            Self::DuplicateLine | Self::VersionConflict(_) | Self::Conflict(_) => 409,
            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount(_) => "VALIDATION_ERROR",
            Self::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            Self::InsufficientAllotment { .. } => "INSUFFICIENT_ALLOTMENT",
            Self::SameLine => "SAME_LINE",
            Self::NegativeFigure { .. } => "NEGATIVE_FIGURE",
            Self::NegativeBalance { .. } => "NEGATIVE_BALANCE",
            Self::AllocationMismatch { .. } => "ALLOCATION_MISMATCH",
            Self::InvalidScheduleLength(_) => "INVALID_SCHEDULE",
            Self::LineNotFound(_) => "LINE_NOT_FOUND",
            Self::DuplicateLine => "DUPLICATE_LINE",
            Self::VersionConflict(_) => "VERSION_CONFLICT",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns true for transient errors the caller may retry.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::VersionConflict(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_insufficient_balance_carries_figures() {
        let err = LedgerError::InsufficientBalance {
            available: dec!(50_000),
            requested: dec!(75_000),
        };
        assert_eq!(err.status_code(), 422);
        assert_eq!(err.error_code(), "INSUFFICIENT_BALANCE");
        assert!(err.to_string().contains("50000"));
        assert!(err.to_string().contains("75000"));
    }

    #[test]
    fn test_version_conflict_is_retryable() {
        let id = BudgetLineId::new();
        assert!(LedgerError::VersionConflict(id).is_retryable());
        assert!(!LedgerError::Conflict(id).is_retryable());
        assert!(!LedgerError::SameLine.is_retryable());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(LedgerError::InvalidAmount(dec!(-5)).status_code(), 400);
        assert_eq!(LedgerError::SameLine.status_code(), 400);
        assert_eq!(
            LedgerError::LineNotFound(BudgetLineId::new()).status_code(),
            404
        );
        assert_eq!(
            LedgerError::Conflict(BudgetLineId::new()).status_code(),
            409
        );
        assert_eq!(LedgerError::Database(String::new()).status_code(), 500);
    }
}
