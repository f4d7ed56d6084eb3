//! Fund hierarchy and rollup views.
//!
//! A fund may own sub-funds; its balance, allocation, and utilization
//! figures are derived from the budget lines scoped to the fund and its
//! descendants, never stored independently.

use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

use fiscus_shared::types::{BudgetLineId, FundId};

use crate::ledger::BudgetLine;

/// A fund or sub-fund.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fund {
    /// Unique identifier.
    pub id: FundId,
    /// Owning fund, None for a top-level fund.
    pub parent_fund_id: Option<FundId>,
    /// Short accounting code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// The budget line a fund transfer debits or credits for this fund.
    pub default_line_id: Option<BudgetLineId>,
}

impl Fund {
    /// Returns true for a top-level fund.
    #[must_use]
    pub const fn is_top_level(&self) -> bool {
        self.parent_fund_id.is_none()
    }
}

/// Derived figures for a fund, including its sub-funds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundRollup {
    /// The fund the rollup describes.
    pub fund_id: FundId,
    /// Sum of adjusted appropriations across the fund's lines.
    pub allocated: Decimal,
    /// Sum of charges across the fund's lines.
    pub utilized: Decimal,
    /// Sum of appropriation balances across the fund's lines.
    pub balance: Decimal,
    /// Charges over released allotment across the fund, as a percentage.
    pub utilization_pct: Decimal,
    /// Number of lines contributing to the rollup.
    pub line_count: usize,
}

impl FundRollup {
    /// Computes the rollup for a fund over the given lines.
    ///
    /// `funds` supplies the hierarchy: lines belonging to the fund
    /// itself or to any descendant sub-fund contribute to the figures.
    #[must_use]
    pub fn compute(fund_id: FundId, funds: &[Fund], lines: &[BudgetLine]) -> Self {
        let scope = descendant_scope(fund_id, funds);

        let mut allocated = Decimal::ZERO;
        let mut utilized = Decimal::ZERO;
        let mut balance = Decimal::ZERO;
        let mut released = Decimal::ZERO;
        let mut line_count = 0usize;

        for line in lines.iter().filter(|l| scope.contains(&l.key.fund_id)) {
            allocated += line.adjusted_appropriation();
            utilized += line.charges;
            balance += line.appropriation_balance();
            released += line.released_allotment;
            line_count += 1;
        }

        let utilization_pct = if released.is_zero() {
            Decimal::ZERO
        } else {
            (utilized / released * Decimal::ONE_HUNDRED)
                .round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
        };

        Self {
            fund_id,
            allocated,
            utilized,
            balance,
            utilization_pct,
            line_count,
        }
    }
}

/// The fund plus every transitive sub-fund.
fn descendant_scope(root: FundId, funds: &[Fund]) -> Vec<FundId> {
    let mut scope = vec![root];
    let mut frontier = vec![root];
    while let Some(parent) = frontier.pop() {
        for fund in funds {
            if fund.parent_fund_id == Some(parent) && !scope.contains(&fund.id) {
                scope.push(fund.id);
                frontier.push(fund.id);
            }
        }
    }
    scope
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    use fiscus_shared::types::{
        ChartOfAccountId, DepartmentId, FiscalYearId, ProjectId, SubDepartmentId,
    };

    use crate::engine::TransferEngine;
    use crate::ledger::LineKey;

    fn fund(id: FundId, parent: Option<FundId>) -> Fund {
        Fund {
            id,
            parent_fund_id: parent,
            code: "100".to_string(),
            name: "General Fund".to_string(),
            default_line_id: None,
        }
    }

    fn line_in_fund(fund_id: FundId, appropriation: Decimal) -> BudgetLine {
        let key = LineKey {
            fiscal_year_id: FiscalYearId::new(),
            fund_id,
            department_id: DepartmentId::new(),
            sub_department_id: SubDepartmentId::new(),
            chart_of_account_id: ChartOfAccountId::new(),
            project_id: ProjectId::new(),
        };
        BudgetLine::open(key, appropriation).unwrap()
    }

    #[test]
    fn test_rollup_includes_sub_funds() {
        let parent = FundId::new();
        let child = FundId::new();
        let grandchild = FundId::new();
        let other = FundId::new();
        let funds = vec![
            fund(parent, None),
            fund(child, Some(parent)),
            fund(grandchild, Some(child)),
            fund(other, None),
        ];
        let lines = vec![
            line_in_fund(parent, dec!(1_000)),
            line_in_fund(child, dec!(500)),
            line_in_fund(grandchild, dec!(250)),
            line_in_fund(other, dec!(9_999)),
        ];

        let rollup = FundRollup::compute(parent, &funds, &lines);
        assert_eq!(rollup.allocated, dec!(1_750));
        assert_eq!(rollup.line_count, 3);

        let child_rollup = FundRollup::compute(child, &funds, &lines);
        assert_eq!(child_rollup.allocated, dec!(750));
    }

    #[test]
    fn test_rollup_figures_track_line_mutations() {
        let id = FundId::new();
        let funds = vec![fund(id, None)];
        let mut line = line_in_fund(id, dec!(1_000_000));
        line.apply(&TransferEngine::release(&line, dec!(400_000), false).unwrap())
            .unwrap();
        line.apply(&TransferEngine::obligate(&line, dec!(100_000)).unwrap())
            .unwrap();

        let rollup = FundRollup::compute(id, &funds, std::slice::from_ref(&line));
        assert_eq!(rollup.allocated, dec!(1_000_000));
        assert_eq!(rollup.utilized, dec!(100_000));
        assert_eq!(rollup.balance, dec!(600_000));
        assert_eq!(rollup.utilization_pct, dec!(25.00));
    }

    #[test]
    fn test_rollup_empty_fund() {
        let id = FundId::new();
        let rollup = FundRollup::compute(id, &[fund(id, None)], &[]);
        assert_eq!(rollup.allocated, Decimal::ZERO);
        assert_eq!(rollup.utilization_pct, Decimal::ZERO);
        assert_eq!(rollup.line_count, 0);
    }
}
