use ethnum::U256;
use num_bigint::BigUint;
use num_traits::Zero;

use super::safe_cast::{big_uint_to_u256, u256_to_big_uint};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FullMathError {
    DivisionByZero,
    Overflow,
}

/// floor(a * b / denominator) with a full-width (512-bit) intermediate
/// product. Errors if the result does not fit in 256 bits.
pub fn mul_div(a: U256, b: U256, denominator: U256) -> Result<U256, FullMathError> {
    if denominator == U256::ZERO {
        return Err(FullMathError::DivisionByZero);
    }
    let quotient = u256_to_big_uint(a) * u256_to_big_uint(b) / u256_to_big_uint(denominator);
    big_uint_to_u256(&quotient).map_err(|_| FullMathError::Overflow)
}

/// ceil(a * b / denominator), full-width intermediate.
pub fn mul_div_rounding_up(a: U256, b: U256, denominator: U256) -> Result<U256, FullMathError> {
    if denominator == U256::ZERO {
        return Err(FullMathError::DivisionByZero);
    }
    let product = u256_to_big_uint(a) * u256_to_big_uint(b);
    let denominator = u256_to_big_uint(denominator);
    let mut quotient = &product / &denominator;
    if !(product % denominator).is_zero() {
        quotient += 1_u8;
    }
    big_uint_to_u256(&quotient).map_err(|_| FullMathError::Overflow)
}

/// ceil(x / y). Division by zero returns zero and must be excluded by the
/// caller.
pub fn div_rounding_up(x: U256, y: U256) -> U256 {
    if y == U256::ZERO {
        return U256::ZERO;
    }
    let quotient = x / y;
    if x % y > U256::ZERO {
        quotient + U256::ONE
    } else {
        quotient
    }
}

/// floor(a * b / denominator) over unbounded integers. The limit-order
/// amount conversions deliberately let the product exceed 256 bits and cap
/// the result at the call site.
pub fn unsafe_mul_div(a: &BigUint, b: &BigUint, denominator: &BigUint) -> BigUint {
    a * b / denominator
}

/// ceil variant of [`unsafe_mul_div`].
pub fn unsafe_mul_div_rounding_up(a: &BigUint, b: &BigUint, denominator: &BigUint) -> BigUint {
    let product = a * b;
    let mut quotient = &product / denominator;
    if !(product % denominator).is_zero() {
        quotient += 1_u8;
    }
    quotient
}
