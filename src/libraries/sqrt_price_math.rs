use ethnum::U256;

use super::{
    constants::Q96,
    full_math::{div_rounding_up, mul_div, mul_div_rounding_up},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqrtPriceMathError {
    PriceOverflow,
    NotEnoughLiquidity,
    InvalidPriceOrLiquidity,
}

const MAX_SQRT_PRICE: U256 = U256::from_words(0xffffffff, u128::MAX); // 2^160 - 1

/// Next sqrt price after adding (or removing) `amount` of token0 to the
/// virtual reserves, rounding up so the price never overshoots the true
/// value in the taker's favour.
///
/// Uses liquidity * sqrtP / (liquidity +- amount * sqrtP), falling back to
/// liquidity / (liquidity / sqrtP +- amount) when the product overflows.
pub fn get_next_sqrt_price_from_amount0_rounding_up(
    sqrt_price_x96: U256,
    liquidity: u128,
    amount: U256,
    add: bool,
) -> Result<U256, SqrtPriceMathError> {
    if amount == U256::ZERO {
        return Ok(sqrt_price_x96);
    }
    let numerator1: U256 = U256::from(liquidity) << 96;

    if add {
        let product = amount.wrapping_mul(sqrt_price_x96);
        if product / amount == sqrt_price_x96 {
            let denominator = numerator1.wrapping_add(product);
            if denominator >= numerator1 {
                let result = mul_div_rounding_up(numerator1, sqrt_price_x96, denominator)
                    .map_err(|_| SqrtPriceMathError::PriceOverflow)?;
                return check_price(result);
            }
        }
        let result = div_rounding_up(numerator1, (numerator1 / sqrt_price_x96).wrapping_add(amount));
        check_price(result)
    } else {
        let product = amount.wrapping_mul(sqrt_price_x96);
        if product / amount != sqrt_price_x96 || numerator1 <= product {
            return Err(SqrtPriceMathError::PriceOverflow);
        }
        let denominator = numerator1 - product;
        let result = mul_div_rounding_up(numerator1, sqrt_price_x96, denominator)
            .map_err(|_| SqrtPriceMathError::PriceOverflow)?;
        check_price(result)
    }
}

/// Next sqrt price after adding (or removing) `amount` of token1, rounding
/// down. The formula is sqrtP +- amount / liquidity.
pub fn get_next_sqrt_price_from_amount1_rounding_down(
    sqrt_price_x96: U256,
    liquidity: u128,
    amount: U256,
    add: bool,
) -> Result<U256, SqrtPriceMathError> {
    if add {
        let quotient = if amount <= MAX_SQRT_PRICE {
            (amount << 96) / U256::from(liquidity)
        } else {
            mul_div(amount, Q96, U256::from(liquidity))
                .map_err(|_| SqrtPriceMathError::PriceOverflow)?
        };
        check_price(sqrt_price_x96.wrapping_add(quotient))
    } else {
        let quotient = if amount <= MAX_SQRT_PRICE {
            div_rounding_up(amount << 96, U256::from(liquidity))
        } else {
            mul_div_rounding_up(amount, Q96, U256::from(liquidity))
                .map_err(|_| SqrtPriceMathError::PriceOverflow)?
        };
        if sqrt_price_x96 <= quotient {
            return Err(SqrtPriceMathError::NotEnoughLiquidity);
        }
        Ok(sqrt_price_x96 - quotient)
    }
}

/// Next sqrt price given an input amount of token0 (`zero_for_one`) or
/// token1, rounding so the target price is never passed.
pub fn get_next_sqrt_price_from_input(
    sqrt_price_x96: U256,
    liquidity: u128,
    amount_in: U256,
    zero_for_one: bool,
) -> Result<U256, SqrtPriceMathError> {
    if sqrt_price_x96 == U256::ZERO || liquidity == 0 {
        return Err(SqrtPriceMathError::InvalidPriceOrLiquidity);
    }
    if zero_for_one {
        get_next_sqrt_price_from_amount0_rounding_up(sqrt_price_x96, liquidity, amount_in, true)
    } else {
        get_next_sqrt_price_from_amount1_rounding_down(sqrt_price_x96, liquidity, amount_in, true)
    }
}

/// Next sqrt price given an output amount of token1 (`zero_for_one`) or
/// token0, rounding so the target price is always reached or passed.
pub fn get_next_sqrt_price_from_output(
    sqrt_price_x96: U256,
    liquidity: u128,
    amount_out: U256,
    zero_for_one: bool,
) -> Result<U256, SqrtPriceMathError> {
    if sqrt_price_x96 == U256::ZERO || liquidity == 0 {
        return Err(SqrtPriceMathError::InvalidPriceOrLiquidity);
    }
    if zero_for_one {
        get_next_sqrt_price_from_amount1_rounding_down(sqrt_price_x96, liquidity, amount_out, false)
    } else {
        get_next_sqrt_price_from_amount0_rounding_up(sqrt_price_x96, liquidity, amount_out, false)
    }
}

fn check_price(value: U256) -> Result<U256, SqrtPriceMathError> {
    if value > MAX_SQRT_PRICE {
        Err(SqrtPriceMathError::PriceOverflow)
    } else {
        Ok(value)
    }
}
