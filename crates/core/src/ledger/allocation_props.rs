//! Property-based tests for monthly allocation schedules.
//!
//! - Distribution conserves the total exactly (no lost or gained cents)
//! - Rebalancing moves the total by exactly the delta
//! - Rebalanced schedules still reconcile against the adjusted total

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::allocation::{MonthlySchedule, tolerance};

/// Strategy to generate signed cent amounts (-10M.00 to 10M.00).
fn signed_amount() -> impl Strategy<Value = Decimal> {
    (-1_000_000_000i64..1_000_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate non-negative cent amounts (0.00 to 10M.00).
fn non_negative_amount() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// *For any* cent total, the twelve distributed months SHALL sum to
    /// exactly that total.
    #[test]
    fn prop_distribute_conserves_total(total in signed_amount()) {
        let schedule = MonthlySchedule::distribute(total);
        prop_assert_eq!(schedule.total(), total);
    }

    /// *For any* cent total, no month SHALL differ from another by more
    /// than one cent.
    #[test]
    fn prop_distribute_spreads_evenly(total in signed_amount()) {
        let schedule = MonthlySchedule::distribute(total);
        let min = schedule.values().iter().min().copied().unwrap_or_default();
        let max = schedule.values().iter().max().copied().unwrap_or_default();
        prop_assert!(max - min <= Decimal::new(1, 2));
    }

    /// *For any* starting total and signed delta, rebalancing SHALL move
    /// the schedule total by exactly the delta.
    #[test]
    fn prop_rebalance_moves_total_by_delta(
        total in non_negative_amount(),
        delta in signed_amount(),
    ) {
        let mut schedule = MonthlySchedule::distribute(total);
        schedule.rebalance(delta);
        prop_assert_eq!(schedule.total(), total + delta);
    }

    /// *For any* sequence of deltas, the schedule SHALL keep reconciling
    /// against the running adjusted total.
    #[test]
    fn prop_rebalance_sequence_reconciles(
        total in non_negative_amount(),
        deltas in prop::collection::vec(signed_amount(), 1..8),
    ) {
        let mut schedule = MonthlySchedule::distribute(total);
        let mut adjusted = total;
        for delta in deltas {
            schedule.rebalance(delta);
            adjusted += delta;
            prop_assert!(schedule.reconcile(adjusted).is_ok());
        }
    }

    /// *For any* total, reconciling against a value off by more than the
    /// tolerance SHALL fail.
    #[test]
    fn prop_reconcile_rejects_drift(total in non_negative_amount()) {
        let schedule = MonthlySchedule::distribute(total);
        let drift = tolerance() + Decimal::new(1, 2);
        prop_assert!(schedule.reconcile(total + drift).is_err());
        prop_assert!(schedule.reconcile(total - drift).is_err());
    }
}
