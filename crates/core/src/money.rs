//! Money and tax-rate value objects.
//!
//! Amounts are integer minor units of the tenant currency. Tax is expressed in
//! basis points and rounded half-up to the nearest minor unit.

use core::iter::Sum;
use core::ops::Add;

use serde::{Deserialize, Serialize};

use crate::value_object::ValueObject;

/// Amount in the smallest currency unit.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_minor(minor: u64) -> Self {
        Self(minor)
    }

    pub const fn minor(self) -> u64 {
        self.0
    }

    /// Unit price times quantity.
    pub fn times(self, quantity: u32) -> Money {
        Money(self.0.saturating_mul(u64::from(quantity)))
    }

    /// Render with thousands separators and `decimals` fraction digits,
    /// e.g. `Money(2_160_000).format(2) == "21,600.00"`.
    pub fn format(self, decimals: u8) -> String {
        let scale = 10u64.pow(u32::from(decimals));
        let major = self.0 / scale;
        let minor = self.0 % scale;

        let digits = major.to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }

        if decimals == 0 {
            grouped
        } else {
            format!("{grouped}.{minor:0width$}", width = usize::from(decimals))
        }
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

/// Raw minor units; use [`Money::format`] for display to people.
impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl ValueObject for Money {}

/// Tax rate in basis points (1/100 of a percent).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Sales tax applied at the register: 8%.
    pub const STANDARD: TaxRate = TaxRate(800);

    pub const fn from_basis_points(bps: u32) -> Self {
        Self(bps)
    }

    pub const fn basis_points(self) -> u32 {
        self.0
    }

    /// Tax owed on `amount`, rounded half-up.
    pub fn of(self, amount: Money) -> Money {
        let scaled = u128::from(amount.minor()) * u128::from(self.0) + 5_000;
        Money(u64::try_from(scaled / 10_000).unwrap_or(u64::MAX))
    }

    /// Human label such as `8%` or `7.5%`.
    pub fn label(self) -> String {
        let whole = self.0 / 100;
        let frac = self.0 % 100;
        if frac == 0 {
            format!("{whole}%")
        } else if frac % 10 == 0 {
            format!("{whole}.{}%", frac / 10)
        } else {
            format!("{whole}.{frac:02}%")
        }
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl ValueObject for TaxRate {}
