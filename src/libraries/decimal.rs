//! High-precision decimal arithmetic for tick swap percentages.
//!
//! Values are stored as unsigned fixed-point numbers with 78 fractional
//! decimal digits, which gives the [0, 1] ratios used by the limit-order
//! book at least 78 significant digits of precision. Every operation that
//! can lose precision takes an explicit [`Rounding`] mode; there is
//! deliberately no ambient default.

use lazy_static::lazy_static;
use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

/// Working precision, in decimal digits.
pub const PRECISION: u32 = 78;

lazy_static! {
    static ref SCALE: BigUint = BigUint::from(10_u8).pow(PRECISION);
}

/// Direction in which a lossy operation rounds: toward zero or away from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    Down,
    Up,
}

/// Non-negative fixed-scale decimal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Decimal {
    units: BigUint,
}

impl Decimal {
    pub fn zero() -> Self {
        Decimal {
            units: BigUint::zero(),
        }
    }

    pub fn one() -> Self {
        Decimal {
            units: SCALE.clone(),
        }
    }

    pub fn from_int(value: u128) -> Self {
        Decimal {
            units: BigUint::from(value) * &*SCALE,
        }
    }

    /// numerator / denominator, rounded per `rounding`.
    pub fn ratio(numerator: &BigUint, denominator: &BigUint, rounding: Rounding) -> Self {
        assert!(!denominator.is_zero(), "decimal ratio denominator is zero");
        let scaled = numerator * &*SCALE;
        Decimal {
            units: div_rounded(&scaled, denominator, rounding),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.units.is_zero()
    }

    /// Exact addition.
    pub fn add(&self, rhs: &Self) -> Self {
        Decimal {
            units: &self.units + &rhs.units,
        }
    }

    /// `self - rhs`, asserting a non-negative result. Both operands share
    /// one scale, so the difference is exact and "round the loss upward"
    /// degenerates to an exact subtraction.
    pub fn sub_up(&self, rhs: &Self) -> Self {
        assert!(self.units >= rhs.units, "decimal subtraction underflow");
        Decimal {
            units: &self.units - &rhs.units,
        }
    }

    pub fn mul(&self, rhs: &Self, rounding: Rounding) -> Self {
        let product = &self.units * &rhs.units;
        Decimal {
            units: div_rounded(&product, &SCALE, rounding),
        }
    }

    pub fn div(&self, rhs: &Self, rounding: Rounding) -> Self {
        assert!(!rhs.units.is_zero(), "decimal division by zero");
        let scaled = &self.units * &*SCALE;
        Decimal {
            units: div_rounded(&scaled, &rhs.units, rounding),
        }
    }

    /// Exact multiplication by an integer.
    pub fn mul_int(&self, value: u128) -> Self {
        Decimal {
            units: &self.units * BigUint::from(value),
        }
    }

    pub fn to_int_floor(&self) -> BigUint {
        &self.units / &*SCALE
    }

    pub fn to_int_ceil(&self) -> BigUint {
        div_rounded(&self.units, &SCALE, Rounding::Up)
    }
}

fn div_rounded(numerator: &BigUint, denominator: &BigUint, rounding: Rounding) -> BigUint {
    let quotient = numerator / denominator;
    match rounding {
        Rounding::Down => quotient,
        Rounding::Up => {
            if (numerator % denominator).is_zero() {
                quotient
            } else {
                quotient + 1_u8
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(numerator: u128, denominator: u128, rounding: Rounding) -> Decimal {
        Decimal::ratio(
            &BigUint::from(numerator),
            &BigUint::from(denominator),
            rounding,
        )
    }

    #[test]
    fn test_exact_ratio() {
        let half = dec(1, 2, Rounding::Down);
        assert_eq!(half, dec(1, 2, Rounding::Up));
        assert_eq!(half.add(&half), Decimal::one());
    }

    #[test]
    fn test_rounding_modes_differ_on_repeating_fraction() {
        let down = dec(1, 3, Rounding::Down);
        let up = dec(1, 3, Rounding::Up);
        assert!(down < up);
        assert_eq!(&up.units - &down.units, BigUint::from(1_u8));
    }

    #[test]
    fn test_sub_up_is_exact() {
        let a = dec(2, 3, Rounding::Down);
        let b = dec(1, 3, Rounding::Down);
        assert_eq!(b.add(&a.sub_up(&b)), a);
    }

    #[test]
    #[should_panic(expected = "decimal subtraction underflow")]
    fn test_sub_up_rejects_negative_result() {
        let a = dec(1, 3, Rounding::Down);
        let b = dec(2, 3, Rounding::Down);
        let _ = a.sub_up(&b);
    }

    #[test]
    fn test_mul_rounds_per_mode() {
        let third = dec(1, 3, Rounding::Down);
        let product_down = third.mul(&third, Rounding::Down);
        let product_up = third.mul(&third, Rounding::Up);
        assert!(product_down < product_up);
    }

    #[test]
    fn test_mul_int_and_floor() {
        // floor(1e18 * 2/3)
        let two_thirds = dec(2, 3, Rounding::Down);
        let amount = two_thirds.mul_int(1_000_000_000_000_000_000).to_int_floor();
        assert_eq!(u128::try_from(&amount).unwrap(), 666_666_666_666_666_666);
        let amount_up = dec(2, 3, Rounding::Up)
            .mul_int(1_000_000_000_000_000_000)
            .to_int_ceil();
        assert_eq!(u128::try_from(&amount_up).unwrap(), 666_666_666_666_666_667);
    }

    #[test]
    fn test_div_round_trip_stays_below_one() {
        // (a / b) computed down then re-multiplied never exceeds the input
        let a = dec(123_456_789, 1_000_000_000, Rounding::Down);
        let b = dec(987_654_321, 1_000_000_000, Rounding::Down);
        let quotient = a.div(&b, Rounding::Down);
        assert!(quotient.mul(&b, Rounding::Down) <= a);
    }

    #[test]
    fn test_precision_is_at_least_78_digits() {
        let tiny = Decimal::ratio(
            &BigUint::from(1_u8),
            &BigUint::from(10_u8).pow(PRECISION),
            Rounding::Down,
        );
        assert!(!tiny.is_zero());
        assert!(tiny < Decimal::ratio(&BigUint::from(1_u8), &BigUint::from(10_u8).pow(77), Rounding::Down));
    }
}
