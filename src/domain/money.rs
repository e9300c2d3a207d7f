use crate::error::WorkflowError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

/// A non-negative monetary value in exact decimal arithmetic.
///
/// Wraps `rust_decimal::Decimal` so financial gates can compare amounts for
/// exact equality; currency is not modelled, amounts are plain quantities.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Money(Decimal);

/// A strictly positive payment amount.
///
/// Recording a payment only ever adds money; corrections are not an
/// operation, which is what keeps paid totals monotonic.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct PaymentAmount(Decimal);

/// A fraction of the total quote, in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Percent(Decimal);

impl Money {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Subtraction clamped at zero.
    pub fn saturating_sub(self, rhs: Self) -> Self {
        if self.0 > rhs.0 {
            Self(self.0 - rhs.0)
        } else {
            Self::ZERO
        }
    }
}

impl TryFrom<Decimal> for Money {
    type Error = WorkflowError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        if value >= Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(WorkflowError::ValidationError(
                "monetary value must not be negative".to_string(),
            ))
        }
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl PaymentAmount {
    pub fn new(value: Decimal) -> Result<Self, WorkflowError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(WorkflowError::ValidationError(
                "payment amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for PaymentAmount {
    type Error = WorkflowError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PaymentAmount> for Money {
    fn from(amount: PaymentAmount) -> Self {
        Self(amount.0)
    }
}

impl Percent {
    pub fn new(value: Decimal) -> Result<Self, WorkflowError> {
        if value >= Decimal::ZERO && value <= Decimal::ONE {
            Ok(Self(value))
        } else {
            Err(WorkflowError::ValidationError(
                "percent must be between 0 and 1".to_string(),
            ))
        }
    }

    /// Unchecked constructor for statically known-good fractions.
    pub(crate) const fn from_raw(value: Decimal) -> Self {
        Self(value)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}
