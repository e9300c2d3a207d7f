//! Milestone arithmetic for percentage-of-quote payment gates.
//!
//! All functions are pure and operate on exact decimals, so gate checks can
//! compare for equality without rounding drift.

use crate::domain::money::{Money, Percent};
use rust_decimal::Decimal;

/// Amount that must be collected to satisfy a milestone.
pub fn milestone_target(total_quote: Money, percent: Percent) -> Money {
    Money::new(total_quote.value() * percent.value())
}

/// Outstanding amount against a milestone, clamped at zero.
pub fn milestone_balance(total_quote: Money, percent: Percent, paid_so_far: Money) -> Money {
    milestone_target(total_quote, percent).saturating_sub(paid_so_far)
}

/// Remaining balance against the full quote.
///
/// Negative when the customer overpaid; overpayment is a legitimate business
/// fact and is reported, not clamped.
pub fn final_balance(total_quote: Money, paid_sum: Money) -> Decimal {
    total_quote.value() - paid_sum.value()
}

/// Whether the given payments fully cover the milestone.
pub fn financial_gate_met(total_quote: Money, percent: Percent, paid_so_far: Money) -> bool {
    milestone_balance(total_quote, percent, paid_so_far).is_zero()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn pct(value: Decimal) -> Percent {
        Percent::new(value).unwrap()
    }

    #[test]
    fn test_booking_milestone_numbers() {
        let total = Money::new(dec!(100000));
        let percent = pct(dec!(0.10));

        assert_eq!(milestone_target(total, percent), Money::new(dec!(10000.00)));
        assert_eq!(
            milestone_balance(total, percent, Money::ZERO),
            Money::new(dec!(10000.00))
        );
        assert!(!financial_gate_met(total, percent, Money::ZERO));

        assert_eq!(
            milestone_balance(total, percent, Money::new(dec!(10000))),
            Money::ZERO
        );
        assert!(financial_gate_met(total, percent, Money::new(dec!(10000))));
    }

    #[test]
    fn test_balance_clamped_on_overpayment() {
        let total = Money::new(dec!(100000));
        let percent = pct(dec!(0.10));
        assert_eq!(
            milestone_balance(total, percent, Money::new(dec!(25000))),
            Money::ZERO
        );
        assert!(financial_gate_met(total, percent, Money::new(dec!(25000))));
    }

    #[test]
    fn test_final_balance_reports_overpayment_as_negative() {
        let total = Money::new(dec!(100000));
        assert_eq!(final_balance(total, Money::new(dec!(40000))), dec!(60000));
        assert_eq!(final_balance(total, Money::new(dec!(110000))), dec!(-10000));
    }

    #[test]
    fn test_gate_is_exact_on_fractional_amounts() {
        // 10% of 99999.99 is 9999.999; partial payments short by a fraction
        // of a minor unit must not pass.
        let total = Money::new(dec!(99999.99));
        let percent = pct(dec!(0.10));
        assert!(!financial_gate_met(total, percent, Money::new(dec!(9999.99))));
        assert!(financial_gate_met(total, percent, Money::new(dec!(9999.999))));
    }

    #[test]
    fn test_zero_quote_gate_is_trivially_met() {
        assert!(financial_gate_met(Money::ZERO, pct(dec!(0.10)), Money::ZERO));
    }
}
