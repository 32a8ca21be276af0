//! Conversion between major currency units and gateway minor units.

use crate::error::DomainError;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Minor units per major unit (paise per rupee).
const MINOR_PER_MAJOR: i64 = 100;

/// An amount in the gateway's smallest currency subdivision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MinorUnits(i64);

impl MinorUnits {
    /// Wrap a raw minor-unit amount.
    #[must_use]
    pub const fn new(amount: i64) -> Self {
        Self(amount)
    }

    /// Raw minor-unit amount.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Convert a positive major-unit amount, truncating anything finer than
    /// one minor unit (`500.009` becomes `50000`).
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Validation`] when the amount is not positive,
    /// truncates to zero, or overflows.
    pub fn from_major(amount: Decimal) -> Result<Self, DomainError> {
        if amount <= Decimal::ZERO {
            return Err(DomainError::Validation(format!(
                "amountInr must be positive, got {amount}"
            )));
        }

        let minor = amount
            .checked_mul(Decimal::from(MINOR_PER_MAJOR))
            .map(|scaled| scaled.trunc())
            .and_then(|scaled| scaled.to_i64())
            .ok_or_else(|| DomainError::Validation(format!("amountInr {amount} is too large")))?;

        if minor == 0 {
            return Err(DomainError::Validation(format!(
                "amountInr {amount} is smaller than one minor unit"
            )));
        }

        Ok(Self(minor))
    }
}

impl fmt::Display for MinorUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
