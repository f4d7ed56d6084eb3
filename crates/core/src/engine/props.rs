//! Property-based tests for the transfer engine.
//!
//! - Transfers are zero-sum across the source/target pair
//! - Validation never lets a figure drift negative without an override
//! - Derived balance identities hold after any accepted delta

use proptest::prelude::*;
use rust_decimal::Decimal;

use fiscus_shared::types::{
    ChartOfAccountId, DepartmentId, FiscalYearId, FundId, ProjectId, SubDepartmentId,
};

use crate::engine::TransferEngine;
use crate::ledger::{BudgetLine, LineKey};

fn line_key() -> LineKey {
    LineKey {
        fiscal_year_id: FiscalYearId::new(),
        fund_id: FundId::new(),
        department_id: DepartmentId::new(),
        sub_department_id: SubDepartmentId::new(),
        chart_of_account_id: ChartOfAccountId::new(),
        project_id: ProjectId::new(),
    }
}

/// Strategy for positive cent amounts (0.01 to 10M.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// *For any* accepted transfer, the source and target adjustment
    /// deltas SHALL cancel exactly and the combined adjusted
    /// appropriation SHALL be conserved.
    #[test]
    fn prop_transfer_is_zero_sum(
        source_appropriation in positive_amount(),
        amount in positive_amount(),
    ) {
        let mut source = BudgetLine::open(line_key(), source_appropriation).unwrap();
        let mut target = BudgetLine::open(line_key(), Decimal::ZERO).unwrap();
        let combined_before = source.adjusted_appropriation() + target.adjusted_appropriation();

        let Ok(pair) = TransferEngine::transfer(&source, &target, amount, false) else {
            prop_assert!(amount > source.appropriation_balance());
            return Ok(());
        };

        prop_assert_eq!(pair[0].1.adjustments, -pair[1].1.adjustments);
        for (line_id, delta) in &pair {
            if *line_id == source.id {
                source.apply(delta).unwrap();
            } else {
                target.apply(delta).unwrap();
            }
        }
        prop_assert_eq!(
            source.adjusted_appropriation() + target.adjusted_appropriation(),
            combined_before
        );
    }

    /// *For any* transfer larger than the source balance, the engine
    /// SHALL refuse without an override and flag the source with one.
    #[test]
    fn prop_overdraft_requires_override(
        balance in positive_amount(),
        excess in positive_amount(),
    ) {
        let source = BudgetLine::open(line_key(), balance).unwrap();
        let target = BudgetLine::open(line_key(), Decimal::ZERO).unwrap();
        let amount = balance + excess;

        prop_assert!(TransferEngine::transfer(&source, &target, amount, false).is_err());

        let pair = TransferEngine::transfer(&source, &target, amount, true).unwrap();
        let source_delta = &pair[0].1;
        prop_assert!(source_delta.flag_overdrawn);
    }

    /// *For any* supplement, the delta equals the amount and rejects
    /// non-positive input.
    #[test]
    fn prop_supplement_amount_carried(amount in positive_amount()) {
        let delta = TransferEngine::supplement(amount).unwrap();
        prop_assert_eq!(delta.adjustments, amount);
        prop_assert!(TransferEngine::supplement(-amount).is_err());
        prop_assert!(TransferEngine::supplement(Decimal::ZERO).is_err());
    }

    /// *For any* line and accepted release-then-obligate pair, the
    /// balance identities SHALL hold afterwards.
    #[test]
    fn prop_balance_identities_after_mutation(
        appropriation in positive_amount(),
        release_frac in 1u32..=100,
        charge_frac in 1u32..=100,
    ) {
        let mut line = BudgetLine::open(line_key(), appropriation).unwrap();

        let release = (appropriation * Decimal::from(release_frac) / Decimal::ONE_HUNDRED)
            .round_dp(2);
        if release > Decimal::ZERO {
            line.apply(&TransferEngine::release(&line, release, false).unwrap()).unwrap();
        }

        let charge = (line.allotment_balance() * Decimal::from(charge_frac)
            / Decimal::ONE_HUNDRED)
            .round_dp(2);
        if charge > Decimal::ZERO {
            line.apply(&TransferEngine::obligate(&line, charge).unwrap()).unwrap();
        }

        prop_assert_eq!(
            line.appropriation_balance(),
            line.adjusted_appropriation() - line.released_allotment
        );
        prop_assert_eq!(
            line.allotment_balance(),
            line.released_allotment - line.charges - line.pre_encumbrance - line.encumbrance
        );
        prop_assert!(line.check_invariants().is_ok());
    }
}
