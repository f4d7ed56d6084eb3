//! Monthly allocation schedules using the Largest Remainder Method.
//!
//! Every budget line carries twelve monthly allocations whose sum must
//! equal the line's adjusted appropriation. Distribution and rebalancing
//! use the Largest Remainder Method so no cents are lost or gained:
//! 1. Round down each equal share
//! 2. Compute the remainder (total - sum of rounded shares)
//! 3. Hand the remainder out one cent at a time, front months first

use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

use super::error::LedgerError;

/// Number of months in a fiscal year schedule.
pub const MONTHS: usize = 12;

/// Tolerance when reconciling a schedule against the adjusted
/// appropriation (one cent, to absorb legacy rounding).
#[must_use]
pub fn tolerance() -> Decimal {
    Decimal::new(1, 2)
}

/// Twelve monthly allocations for a budget line.
///
/// Invariant: `total()` equals the line's adjusted appropriation within
/// [`tolerance`]. [`MonthlySchedule::distribute`] and
/// [`MonthlySchedule::rebalance`] preserve this exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlySchedule([Decimal; MONTHS]);

impl MonthlySchedule {
    /// Spreads a total equally across the twelve months.
    ///
    /// Uses the Largest Remainder Method at two decimal places, so the
    /// months sum exactly to `total` (rounded to cents).
    #[must_use]
    pub fn distribute(total: Decimal) -> Self {
        let months = Decimal::from(MONTHS as u64);
        let cent = Decimal::new(1, 2);

        let total_rounded =
            total.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven);

        // Equal share rounded toward zero, then hand out the remainder in cents.
        let base = (total_rounded / months).round_dp_with_strategy(2, RoundingStrategy::ToZero);
        let remainder = total_rounded - base * months;
        let extra_cents = (remainder / cent)
            .round_dp_with_strategy(0, RoundingStrategy::ToZero)
            .to_i64()
            .unwrap_or(0);

        let mut values = [Decimal::ZERO; MONTHS];
        for (i, value) in values.iter_mut().enumerate() {
            let extra = if (i as i64) < extra_cents.abs() {
                if extra_cents >= 0 { cent } else { -cent }
            } else {
                Decimal::ZERO
            };
            *value = base + extra;
        }

        Self(values)
    }

    /// Builds a schedule from explicit monthly values.
    ///
    /// # Errors
    ///
    /// Returns `InvalidScheduleLength` unless exactly twelve values are given.
    pub fn from_values(values: &[Decimal]) -> Result<Self, LedgerError> {
        let array: [Decimal; MONTHS] = values
            .try_into()
            .map_err(|_| LedgerError::InvalidScheduleLength(values.len()))?;
        Ok(Self(array))
    }

    /// Returns the sum of the twelve allocations.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.0.iter().copied().sum()
    }

    /// Returns the twelve monthly values, January first.
    #[must_use]
    pub const fn values(&self) -> &[Decimal; MONTHS] {
        &self.0
    }

    /// Spreads a signed delta across the schedule.
    ///
    /// Called when an approved supplemental or transfer changes the
    /// adjusted appropriation; the delta is distributed with the same
    /// conservation guarantee, so `total()` moves by exactly `delta`
    /// (rounded to cents).
    pub fn rebalance(&mut self, delta: Decimal) {
        if delta.is_zero() {
            return;
        }
        let spread = Self::distribute(delta);
        for (month, extra) in self.0.iter_mut().zip(spread.0.iter()) {
            *month += *extra;
        }
    }

    /// Checks the schedule against the adjusted appropriation.
    ///
    /// # Errors
    ///
    /// Returns `AllocationMismatch` when the schedule drifts beyond the
    /// one-cent tolerance.
    pub fn reconcile(&self, adjusted: Decimal) -> Result<(), LedgerError> {
        let allocated = self.total();
        if (allocated - adjusted).abs() > tolerance() {
            return Err(LedgerError::AllocationMismatch {
                allocated,
                adjusted,
            });
        }
        Ok(())
    }
}

impl Default for MonthlySchedule {
    fn default() -> Self {
        Self([Decimal::ZERO; MONTHS])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_distribute_exact_division() {
        let schedule = MonthlySchedule::distribute(dec!(1200));
        assert!(schedule.values().iter().all(|m| *m == dec!(100)));
        assert_eq!(schedule.total(), dec!(1200));
    }

    #[test]
    fn test_distribute_with_remainder() {
        // 100 / 12 = 8.33 base, 4 cents left over for the front months
        let schedule = MonthlySchedule::distribute(dec!(100));
        assert_eq!(schedule.total(), dec!(100));
        assert_eq!(schedule.values()[0], dec!(8.34));
        assert_eq!(schedule.values()[11], dec!(8.33));
    }

    #[test]
    fn test_distribute_zero() {
        let schedule = MonthlySchedule::distribute(Decimal::ZERO);
        assert_eq!(schedule.total(), Decimal::ZERO);
    }

    #[test]
    fn test_distribute_negative_total() {
        let schedule = MonthlySchedule::distribute(dec!(-100));
        assert_eq!(schedule.total(), dec!(-100));
    }

    #[test]
    fn test_rebalance_moves_total_by_delta() {
        let mut schedule = MonthlySchedule::distribute(dec!(21_111_200));
        schedule.rebalance(dec!(1_000_000));
        assert_eq!(schedule.total(), dec!(22_111_200));
    }

    #[test]
    fn test_rebalance_negative_delta() {
        let mut schedule = MonthlySchedule::distribute(dec!(500_000));
        schedule.rebalance(dec!(-250_000));
        assert_eq!(schedule.total(), dec!(250_000));
    }

    #[test]
    fn test_reconcile_within_tolerance() {
        let schedule = MonthlySchedule::distribute(dec!(1000));
        assert!(schedule.reconcile(dec!(1000)).is_ok());
        assert!(schedule.reconcile(dec!(1000.01)).is_ok());
        assert!(
            matches!(
                schedule.reconcile(dec!(1000.02)),
                Err(LedgerError::AllocationMismatch { .. })
            )
        );
    }

    #[test]
    fn test_from_values_rejects_wrong_length() {
        let short = vec![Decimal::ZERO; 11];
        assert!(matches!(
            MonthlySchedule::from_values(&short),
            Err(LedgerError::InvalidScheduleLength(11))
        ));
    }

    #[test]
    fn test_from_values_roundtrip() {
        let schedule = MonthlySchedule::distribute(dec!(777.77));
        let rebuilt = MonthlySchedule::from_values(schedule.values()).unwrap();
        assert_eq!(schedule, rebuilt);
    }
}
