// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Mul},
};

use serde::{Deserialize, Serialize};

/// The unit cost of an operation, in request units (RU).
///
/// Charges are never negative: negative or non-finite inputs are clamped to zero.
///
/// # Examples
///
/// ```
/// use gateway_store::RequestCharge;
///
/// let total: RequestCharge = [RequestCharge::new(1.0), RequestCharge::new(2.5)].into_iter().sum();
/// assert_eq!(total.units(), 3.5);
/// assert_eq!(total.to_string(), "3.50 RU");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestCharge(f64);

impl RequestCharge {
    /// A charge of zero request units.
    pub const ZERO: Self = Self(0.0);

    /// Creates a charge of the given number of request units.
    #[must_use]
    pub fn new(units: f64) -> Self {
        if units.is_finite() && units > 0.0 { Self(units) } else { Self::ZERO }
    }

    /// Returns the number of request units.
    #[must_use]
    pub fn units(self) -> f64 {
        self.0
    }
}

impl Add for RequestCharge {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.0 + rhs.0)
    }
}

impl AddAssign for RequestCharge {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Mul<usize> for RequestCharge {
    type Output = Self;

    #[expect(clippy::cast_precision_loss, reason = "operation counts are far below 2^52")]
    fn mul(self, rhs: usize) -> Self::Output {
        Self::new(self.0 * rhs as f64)
    }
}

impl Sum for RequestCharge {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Self> for RequestCharge {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl fmt::Display for RequestCharge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} RU", self.0)
    }
}
