use ethnum::{I256, U256};

use super::{
    constants::Q96,
    full_math::{div_rounding_up, mul_div, mul_div_rounding_up},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountDeltaError {
    InvalidPrice,
    Overflow,
}

/// Amount of token0 covering a position of size `liquidity` between two
/// sqrt prices: liquidity * (sqrtB - sqrtA) / (sqrtB * sqrtA).
pub fn get_amount_0_delta(
    sqrt_price_a_x96: U256,
    sqrt_price_b_x96: U256,
    liquidity: u128,
    round_up: bool,
) -> Result<U256, AmountDeltaError> {
    let (sqrt_lower, sqrt_upper) = if sqrt_price_a_x96 > sqrt_price_b_x96 {
        (sqrt_price_b_x96, sqrt_price_a_x96)
    } else {
        (sqrt_price_a_x96, sqrt_price_b_x96)
    };
    if sqrt_lower == U256::ZERO {
        return Err(AmountDeltaError::InvalidPrice);
    }

    let numerator1 = U256::from(liquidity) << 96;
    let numerator2 = sqrt_upper - sqrt_lower;

    if round_up {
        let scaled = mul_div_rounding_up(numerator1, numerator2, sqrt_upper)
            .map_err(|_| AmountDeltaError::Overflow)?;
        Ok(div_rounding_up(scaled, sqrt_lower))
    } else {
        let scaled = mul_div(numerator1, numerator2, sqrt_upper)
            .map_err(|_| AmountDeltaError::Overflow)?;
        Ok(scaled / sqrt_lower)
    }
}

/// Amount of token1 covering a position of size `liquidity` between two
/// sqrt prices: liquidity * (sqrtB - sqrtA).
pub fn get_amount_1_delta(
    sqrt_price_a_x96: U256,
    sqrt_price_b_x96: U256,
    liquidity: u128,
    round_up: bool,
) -> Result<U256, AmountDeltaError> {
    let numerator = if sqrt_price_a_x96 > sqrt_price_b_x96 {
        sqrt_price_a_x96 - sqrt_price_b_x96
    } else {
        sqrt_price_b_x96 - sqrt_price_a_x96
    };
    let liquidity = U256::from(liquidity);

    let amount1 =
        mul_div(liquidity, numerator, Q96).map_err(|_| AmountDeltaError::Overflow)?;
    if round_up && (liquidity * numerator) % Q96 > U256::ZERO {
        amount1.checked_add(U256::ONE).ok_or(AmountDeltaError::Overflow)
    } else {
        Ok(amount1)
    }
}

/// Signed token0 delta for a liquidity change: negative amounts are owed to
/// the position owner, positive amounts to the pool.
pub fn get_amount_0_delta_signed(
    sqrt_price_a_x96: U256,
    sqrt_price_b_x96: U256,
    liquidity: i128,
) -> Result<I256, AmountDeltaError> {
    if liquidity < 0 {
        let amount = get_amount_0_delta(
            sqrt_price_a_x96,
            sqrt_price_b_x96,
            liquidity.unsigned_abs(),
            false,
        )?;
        I256::try_from(amount)
            .map(|amount| -amount)
            .map_err(|_| AmountDeltaError::Overflow)
    } else {
        let amount =
            get_amount_0_delta(sqrt_price_a_x96, sqrt_price_b_x96, liquidity as u128, true)?;
        I256::try_from(amount).map_err(|_| AmountDeltaError::Overflow)
    }
}

/// Signed token1 delta for a liquidity change.
pub fn get_amount_1_delta_signed(
    sqrt_price_a_x96: U256,
    sqrt_price_b_x96: U256,
    liquidity: i128,
) -> Result<I256, AmountDeltaError> {
    if liquidity < 0 {
        let amount = get_amount_1_delta(
            sqrt_price_a_x96,
            sqrt_price_b_x96,
            liquidity.unsigned_abs(),
            false,
        )?;
        I256::try_from(amount)
            .map(|amount| -amount)
            .map_err(|_| AmountDeltaError::Overflow)
    } else {
        let amount =
            get_amount_1_delta(sqrt_price_a_x96, sqrt_price_b_x96, liquidity as u128, true)?;
        I256::try_from(amount).map_err(|_| AmountDeltaError::Overflow)
    }
}
