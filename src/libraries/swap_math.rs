use ethnum::{I256, U256};

use super::{
    amount_delta::{get_amount_0_delta, get_amount_1_delta},
    constants::ONE_IN_PIPS,
    full_math::{mul_div, mul_div_rounding_up},
    sqrt_price_math::{get_next_sqrt_price_from_input, get_next_sqrt_price_from_output},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapMathError {
    PriceOverflow,
    AmountOverflow,
}

/// One range-order swap step between the current price and a target price.
///
/// `amount_remaining >= 0` specifies an exact input (fee taken from it),
/// `amount_remaining < 0` an exact output. The step stops at the target
/// price or when the remaining amount is exhausted, whichever comes first.
///
/// Returns `(sqrt_price_next_x96, amount_in, amount_out, fee_amount)`.
/// With zero liquidity the amounts are zero and the price jumps straight to
/// the target.
pub fn compute_swap_step(
    sqrt_price_current_x96: U256,
    sqrt_price_target_x96: U256,
    liquidity: u128,
    amount_remaining: I256,
    fee_pips: u32,
) -> Result<(U256, U256, U256, U256), SwapMathError> {
    let zero_for_one = sqrt_price_current_x96 >= sqrt_price_target_x96;
    let exact_in = amount_remaining >= I256::ZERO;

    let sqrt_price_next_x96;
    let mut amount_in;
    let mut amount_out;
    if exact_in {
        let amount_remaining_abs = amount_remaining.as_u256();
        let amount_remaining_less_fee = mul_div(
            amount_remaining_abs,
            U256::from(ONE_IN_PIPS - fee_pips),
            U256::from(ONE_IN_PIPS),
        )
        .map_err(|_| SwapMathError::AmountOverflow)?;

        amount_in = if zero_for_one {
            get_amount_0_delta(
                sqrt_price_target_x96,
                sqrt_price_current_x96,
                liquidity,
                true,
            )
        } else {
            get_amount_1_delta(
                sqrt_price_current_x96,
                sqrt_price_target_x96,
                liquidity,
                true,
            )
        }
        .map_err(|_| SwapMathError::PriceOverflow)?;

        if amount_remaining_less_fee >= amount_in {
            sqrt_price_next_x96 = sqrt_price_target_x96;
        } else {
            amount_in = amount_remaining_less_fee;
            sqrt_price_next_x96 = get_next_sqrt_price_from_input(
                sqrt_price_current_x96,
                liquidity,
                amount_in,
                zero_for_one,
            )
            .map_err(|_| SwapMathError::PriceOverflow)?;
        }

        amount_out = if zero_for_one {
            get_amount_1_delta(
                sqrt_price_next_x96,
                sqrt_price_current_x96,
                liquidity,
                false,
            )
        } else {
            get_amount_0_delta(
                sqrt_price_current_x96,
                sqrt_price_next_x96,
                liquidity,
                false,
            )
        }
        .map_err(|_| SwapMathError::PriceOverflow)?;
    } else {
        let amount_remaining_abs = (-amount_remaining).as_u256();

        amount_out = if zero_for_one {
            get_amount_1_delta(
                sqrt_price_target_x96,
                sqrt_price_current_x96,
                liquidity,
                false,
            )
        } else {
            get_amount_0_delta(
                sqrt_price_current_x96,
                sqrt_price_target_x96,
                liquidity,
                false,
            )
        }
        .map_err(|_| SwapMathError::PriceOverflow)?;

        if amount_remaining_abs >= amount_out {
            sqrt_price_next_x96 = sqrt_price_target_x96;
        } else {
            amount_out = amount_remaining_abs;
            sqrt_price_next_x96 = get_next_sqrt_price_from_output(
                sqrt_price_current_x96,
                liquidity,
                amount_out,
                zero_for_one,
            )
            .map_err(|_| SwapMathError::PriceOverflow)?;
        }

        amount_in = if zero_for_one {
            get_amount_0_delta(
                sqrt_price_next_x96,
                sqrt_price_current_x96,
                liquidity,
                true,
            )
        } else {
            get_amount_1_delta(
                sqrt_price_current_x96,
                sqrt_price_next_x96,
                liquidity,
                true,
            )
        }
        .map_err(|_| SwapMathError::PriceOverflow)?;
    }

    let reached_target = sqrt_price_next_x96 == sqrt_price_target_x96;

    // cap the output amount to not exceed the remaining output amount
    if !exact_in {
        let amount_remaining_abs = (-amount_remaining).as_u256();
        if amount_out > amount_remaining_abs {
            amount_out = amount_remaining_abs;
        }
    }

    let fee_amount = if exact_in && !reached_target {
        // the remainder of the input is absorbed as fee
        amount_remaining.as_u256() - amount_in
    } else {
        mul_div_rounding_up(
            amount_in,
            U256::from(fee_pips),
            U256::from(ONE_IN_PIPS - fee_pips),
        )
        .map_err(|_| SwapMathError::AmountOverflow)?
    };

    Ok((sqrt_price_next_x96, amount_in, amount_out, fee_amount))
}
