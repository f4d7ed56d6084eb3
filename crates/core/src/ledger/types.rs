//! Budget line domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

use fiscus_shared::types::{
    BudgetLineId, ChartOfAccountId, DepartmentId, FiscalYearId, FundId, ProjectId,
    SubDepartmentId,
};

use super::allocation::MonthlySchedule;
use super::error::LedgerError;

/// Fiscal dimension tuple uniquely identifying a budget line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineKey {
    /// Fiscal year the line belongs to.
    pub fiscal_year_id: FiscalYearId,
    /// Fund the line draws from.
    pub fund_id: FundId,
    /// Owning department.
    pub department_id: DepartmentId,
    /// Owning sub-department.
    pub sub_department_id: SubDepartmentId,
    /// Chart of accounts classification.
    pub chart_of_account_id: ChartOfAccountId,
    /// Project the line is earmarked for.
    pub project_id: ProjectId,
}

/// Signed deltas for the mutable figures of a budget line.
///
/// A delta is produced by the transfer engine after validation and is the
/// only way a budget line's figures change. All fields default to zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineDelta {
    /// Change to cumulative adjustments (supplemental/transfer inflow-outflow).
    pub adjustments: Decimal,
    /// Change to released allotment.
    pub released_allotment: Decimal,
    /// Change to cumulative charges.
    pub charges: Decimal,
    /// Change to pre-encumbrance.
    pub pre_encumbrance: Decimal,
    /// Change to encumbrance.
    pub encumbrance: Decimal,
    /// Marks the line overdrawn (admin override past its balance).
    pub flag_overdrawn: bool,
}

impl LineDelta {
    /// Delta adjusting the appropriation (supplemental inflow or transfer leg).
    #[must_use]
    pub fn adjustment(amount: Decimal) -> Self {
        Self {
            adjustments: amount,
            ..Self::default()
        }
    }

    /// Delta releasing allotment against the appropriation.
    #[must_use]
    pub fn release(amount: Decimal) -> Self {
        Self {
            released_allotment: amount,
            ..Self::default()
        }
    }

    /// Delta charging consumption against released allotment.
    #[must_use]
    pub fn charge(amount: Decimal) -> Self {
        Self {
            charges: amount,
            ..Self::default()
        }
    }

    /// Delta placing a pre-encumbrance hold against released allotment.
    #[must_use]
    pub fn pre_encumber(amount: Decimal) -> Self {
        Self {
            pre_encumbrance: amount,
            ..Self::default()
        }
    }

    /// Delta placing an encumbrance hold against released allotment.
    #[must_use]
    pub fn encumber(amount: Decimal) -> Self {
        Self {
            encumbrance: amount,
            ..Self::default()
        }
    }

    /// Returns true when the delta changes no figure and sets no flag.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.adjustments.is_zero()
            && self.released_allotment.is_zero()
            && self.charges.is_zero()
            && self.pre_encumbrance.is_zero()
            && self.encumbrance.is_zero()
            && !self.flag_overdrawn
    }
}

/// A budget line: the unit of appropriation tracking.
///
/// Created once per fiscal year when a budget is opened; mutated only
/// through approved documents; never deleted, only superseded by the next
/// fiscal year's line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetLine {
    /// Unique identifier.
    pub id: BudgetLineId,
    /// Fiscal dimension tuple (unique per line).
    pub key: LineKey,
    /// Appropriation set at creation, immutable thereafter.
    pub original_appropriation: Decimal,
    /// Cumulative signed sum of approved supplemental/transfer deltas.
    pub adjustments: Decimal,
    /// Cumulative allotments released against this line.
    pub released_allotment: Decimal,
    /// Cumulative charges against released allotment.
    pub charges: Decimal,
    /// Allotment reserved ahead of a formal obligation.
    pub pre_encumbrance: Decimal,
    /// Allotment reserved for anticipated obligations.
    pub encumbrance: Decimal,
    /// Monthly distribution of the adjusted appropriation.
    pub monthly_allocations: MonthlySchedule,
    /// Set when an admin override pushed the line past its balance.
    pub overdrawn: bool,
    /// Optimistic concurrency version, bumped on every successful write.
    pub version: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl BudgetLine {
    /// Opens a new budget line for a fiscal year.
    ///
    /// The original appropriation is spread equally across the monthly
    /// schedule.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` if the appropriation is negative.
    pub fn open(key: LineKey, original_appropriation: Decimal) -> Result<Self, LedgerError> {
        if original_appropriation < Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(original_appropriation));
        }
        let now = Utc::now();
        Ok(Self {
            id: BudgetLineId::new(),
            key,
            original_appropriation,
            adjustments: Decimal::ZERO,
            released_allotment: Decimal::ZERO,
            charges: Decimal::ZERO,
            pre_encumbrance: Decimal::ZERO,
            encumbrance: Decimal::ZERO,
            monthly_allocations: MonthlySchedule::distribute(original_appropriation),
            overdrawn: false,
            version: 1,
            created_at: now,
            updated_at: now,
        })
    }

    /// Original appropriation plus cumulative adjustments.
    #[must_use]
    pub fn adjusted_appropriation(&self) -> Decimal {
        self.original_appropriation + self.adjustments
    }

    /// Adjusted appropriation not yet released as allotment.
    #[must_use]
    pub fn appropriation_balance(&self) -> Decimal {
        self.adjusted_appropriation() - self.released_allotment
    }

    /// Released allotment not yet consumed by charges or reservations.
    #[must_use]
    pub fn allotment_balance(&self) -> Decimal {
        self.released_allotment - self.charges - self.pre_encumbrance - self.encumbrance
    }

    /// Charges as a percentage of released allotment (0 when nothing released).
    #[must_use]
    pub fn utilization_pct(&self) -> Decimal {
        if self.released_allotment.is_zero() {
            return Decimal::ZERO;
        }
        (self.charges / self.released_allotment * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
    }

    /// Applies a validated delta, rebalancing the monthly schedule and
    /// bumping the version.
    ///
    /// The resulting figures are re-checked: cumulative figures stay
    /// non-negative, the allotment balance stays non-negative, and the
    /// appropriation balance stays non-negative unless the delta (or a
    /// previous override) flagged the line overdrawn.
    ///
    /// # Errors
    ///
    /// Returns a `LedgerError` and leaves `self` untouched if any
    /// invariant would break.
    pub fn apply(&mut self, delta: &LineDelta) -> Result<(), LedgerError> {
        let mut next = self.clone();
        next.adjustments += delta.adjustments;
        next.released_allotment += delta.released_allotment;
        next.charges += delta.charges;
        next.pre_encumbrance += delta.pre_encumbrance;
        next.encumbrance += delta.encumbrance;
        next.overdrawn |= delta.flag_overdrawn;
        next.monthly_allocations.rebalance(delta.adjustments);
        next.version += 1;
        next.updated_at = Utc::now();

        next.check_invariants()?;
        *self = next;
        Ok(())
    }

    /// Re-checks every ledger invariant on the current figures.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn check_invariants(&self) -> Result<(), LedgerError> {
        for (figure, value) in [
            ("released_allotment", self.released_allotment),
            ("charges", self.charges),
            ("pre_encumbrance", self.pre_encumbrance),
            ("encumbrance", self.encumbrance),
        ] {
            if value < Decimal::ZERO {
                return Err(LedgerError::NegativeFigure { figure });
            }
        }

        if self.allotment_balance() < Decimal::ZERO {
            return Err(LedgerError::NegativeBalance {
                balance: "allotment",
                value: self.allotment_balance(),
            });
        }

        if self.appropriation_balance() < Decimal::ZERO && !self.overdrawn {
            return Err(LedgerError::NegativeBalance {
                balance: "appropriation",
                value: self.appropriation_balance(),
            });
        }

        self.monthly_allocations
            .reconcile(self.adjusted_appropriation())
    }
}
