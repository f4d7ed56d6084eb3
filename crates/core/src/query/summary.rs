//! Aggregation over budget lines: summaries, trends, and statements.

use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

use fiscus_shared::types::BudgetLineId;

use crate::ledger::allocation::MONTHS;
use crate::ledger::{BudgetLine, LineKey};

use super::filter::LineFilter;

/// Aggregate figures over a filtered set of budget lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetSummary {
    /// Sum of adjusted appropriations.
    pub total_appropriation: Decimal,
    /// Sum of released allotments.
    pub total_allotment: Decimal,
    /// Sum of charges.
    pub total_charges: Decimal,
    /// Sum of appropriation balances.
    pub total_balance: Decimal,
    /// Aggregate charges over aggregate released allotment, as a
    /// percentage (0 when nothing is released).
    pub utilization_pct: Decimal,
    /// Number of lines the filter matched.
    pub line_count: usize,
}

impl BudgetSummary {
    /// Summarizes the lines matching the filter.
    ///
    /// An empty filter yields the unrestricted aggregate.
    #[must_use]
    pub fn summarize(lines: &[BudgetLine], filter: &LineFilter) -> Self {
        let mut total_appropriation = Decimal::ZERO;
        let mut total_allotment = Decimal::ZERO;
        let mut total_charges = Decimal::ZERO;
        let mut total_balance = Decimal::ZERO;
        let mut line_count = 0usize;

        for line in lines.iter().filter(|l| filter.matches(&l.key)) {
            total_appropriation += line.adjusted_appropriation();
            total_allotment += line.released_allotment;
            total_charges += line.charges;
            total_balance += line.appropriation_balance();
            line_count += 1;
        }

        let utilization_pct = if total_allotment.is_zero() {
            Decimal::ZERO
        } else {
            (total_charges / total_allotment * Decimal::ONE_HUNDRED)
                .round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
        };

        Self {
            total_appropriation,
            total_allotment,
            total_charges,
            total_balance,
            utilization_pct,
            line_count,
        }
    }
}

/// The twelve monthly allocations of a single line, January first.
#[must_use]
pub fn monthly_trend(line: &BudgetLine) -> [Decimal; MONTHS] {
    *line.monthly_allocations.values()
}

/// One row of a statement of appropriations, allotments, and balances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementRow {
    /// The line this row describes.
    pub line_id: BudgetLineId,
    /// The line's fiscal dimensions.
    pub key: LineKey,
    /// Appropriation set at creation.
    pub original_appropriation: Decimal,
    /// Cumulative approved adjustments.
    pub adjustments: Decimal,
    /// Original appropriation plus adjustments.
    pub adjusted_appropriation: Decimal,
    /// Released allotment.
    pub released_allotment: Decimal,
    /// Cumulative charges.
    pub charges: Decimal,
    /// Appropriation not yet released.
    pub appropriation_balance: Decimal,
    /// Allotment not yet consumed.
    pub allotment_balance: Decimal,
    /// Charges over released allotment, as a percentage.
    pub utilization_pct: Decimal,
}

impl StatementRow {
    /// Builds the row for one budget line.
    #[must_use]
    pub fn from_line(line: &BudgetLine) -> Self {
        Self {
            line_id: line.id,
            key: line.key,
            original_appropriation: line.original_appropriation,
            adjustments: line.adjustments,
            adjusted_appropriation: line.adjusted_appropriation(),
            released_allotment: line.released_allotment,
            charges: line.charges,
            appropriation_balance: line.appropriation_balance(),
            allotment_balance: line.allotment_balance(),
            utilization_pct: line.utilization_pct(),
        }
    }

    /// Builds the statement for the lines matching the filter.
    #[must_use]
    pub fn statement(lines: &[BudgetLine], filter: &LineFilter) -> Vec<Self> {
        lines
            .iter()
            .filter(|l| filter.matches(&l.key))
            .map(Self::from_line)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    use fiscus_shared::types::{
        ChartOfAccountId, DepartmentId, FiscalYearId, FundId, ProjectId, SubDepartmentId,
    };

    use crate::engine::TransferEngine;

    fn key_in_fund(fund_id: FundId) -> LineKey {
        LineKey {
            fiscal_year_id: FiscalYearId::new(),
            fund_id,
            department_id: DepartmentId::new(),
            sub_department_id: SubDepartmentId::new(),
            chart_of_account_id: ChartOfAccountId::new(),
            project_id: ProjectId::new(),
        }
    }

    fn line(fund_id: FundId, appropriation: Decimal, released: Decimal, charged: Decimal) -> BudgetLine {
        let mut line = BudgetLine::open(key_in_fund(fund_id), appropriation).unwrap();
        if released > Decimal::ZERO {
            line.apply(&TransferEngine::release(&line, released, false).unwrap())
                .unwrap();
        }
        if charged > Decimal::ZERO {
            line.apply(&TransferEngine::obligate(&line, charged).unwrap())
                .unwrap();
        }
        line
    }

    #[test]
    fn test_summarize_unrestricted() {
        let fund = FundId::new();
        let lines = vec![
            line(fund, dec!(1_000_000), dec!(400_000), dec!(100_000)),
            line(fund, dec!(500_000), dec!(100_000), dec!(50_000)),
        ];

        let summary = BudgetSummary::summarize(&lines, &LineFilter::new());
        assert_eq!(summary.total_appropriation, dec!(1_500_000));
        assert_eq!(summary.total_allotment, dec!(500_000));
        assert_eq!(summary.total_charges, dec!(150_000));
        assert_eq!(summary.total_balance, dec!(1_000_000));
        assert_eq!(summary.utilization_pct, dec!(30.00));
        assert_eq!(summary.line_count, 2);
    }

    #[test]
    fn test_summarize_filtered_by_fund() {
        let fund_a = FundId::new();
        let fund_b = FundId::new();
        let lines = vec![
            line(fund_a, dec!(1_000_000), dec!(0), dec!(0)),
            line(fund_b, dec!(250_000), dec!(0), dec!(0)),
        ];

        let summary =
            BudgetSummary::summarize(&lines, &LineFilter::new().with_fund(fund_b));
        assert_eq!(summary.total_appropriation, dec!(250_000));
        assert_eq!(summary.line_count, 1);
    }

    #[test]
    fn test_summarize_zero_allotment_has_zero_utilization() {
        let lines = vec![line(FundId::new(), dec!(1_000_000), dec!(0), dec!(0))];
        let summary = BudgetSummary::summarize(&lines, &LineFilter::new());
        assert_eq!(summary.utilization_pct, Decimal::ZERO);
    }

    #[test]
    fn test_monthly_trend_matches_allocations() {
        let line = line(FundId::new(), dec!(1_200), dec!(0), dec!(0));
        let trend = monthly_trend(&line);
        assert_eq!(trend.iter().copied().sum::<Decimal>(), dec!(1_200));
        assert_eq!(trend[0], dec!(100));
    }

    #[test]
    fn test_statement_row_figures() {
        let line = line(FundId::new(), dec!(1_000_000), dec!(400_000), dec!(100_000));
        let row = StatementRow::from_line(&line);
        assert_eq!(row.adjusted_appropriation, dec!(1_000_000));
        assert_eq!(row.appropriation_balance, dec!(600_000));
        assert_eq!(row.allotment_balance, dec!(300_000));
        assert_eq!(row.utilization_pct, dec!(25.00));
    }

    #[test]
    fn test_statement_respects_filter() {
        let fund = FundId::new();
        let lines = vec![
            line(fund, dec!(100), dec!(0), dec!(0)),
            line(FundId::new(), dec!(200), dec!(0), dec!(0)),
        ];
        let rows = StatementRow::statement(&lines, &LineFilter::new().with_fund(fund));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].original_appropriation, dec!(100));
    }
}
