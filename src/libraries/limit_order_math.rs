//! Amount conversions and percentage arithmetic for limit orders.
//!
//! The conversions deliberately run over unbounded integers: at extreme
//! prices `amount * priceX96 / 2^96` can exceed 256 bits, and the swap step
//! caps the result against the tick's available liquidity rather than
//! erroring out.

use ethnum::U256;
use lazy_static::lazy_static;
use num_bigint::BigUint;

use super::{
    constants::Q96,
    decimal::{Decimal, Rounding},
    full_math::{unsafe_mul_div, unsafe_mul_div_rounding_up},
    safe_cast::u256_to_big_uint,
};

lazy_static! {
    static ref Q96_BIG: BigUint = u256_to_big_uint(Q96);
}

/// Token1 obtained for `amount_in_token0` at `price_x96`:
/// amount * price / 2^96.
pub fn calculate_amount1_lo(
    amount_in_token0: &BigUint,
    price_x96: U256,
    round_up: bool,
) -> BigUint {
    let price = u256_to_big_uint(price_x96);
    if round_up {
        unsafe_mul_div_rounding_up(amount_in_token0, &price, &Q96_BIG)
    } else {
        unsafe_mul_div(amount_in_token0, &price, &Q96_BIG)
    }
}

/// Token0 obtained for `amount_in_token1` at `price_x96`:
/// amount * 2^96 / price. The price must be non-zero, which holds for every
/// tick a position can be minted at.
pub fn calculate_amount0_lo(
    amount_in_token1: &BigUint,
    price_x96: U256,
    round_up: bool,
) -> BigUint {
    let price = u256_to_big_uint(price_x96);
    if round_up {
        unsafe_mul_div_rounding_up(amount_in_token1, &Q96_BIG, &price)
    } else {
        unsafe_mul_div(amount_in_token1, &Q96_BIG, &price)
    }
}

/// Input-token amount corresponding to a swap-percentage change:
/// liquidity * (percSwapChange / oneMinusPercSwap), both steps rounded per
/// `rounding`. The result never exceeds `liquidity_gross`.
pub fn get_amount_swapped_from_tick_percentage(
    perc_swap_change: &Decimal,
    one_minus_perc_swap: &Decimal,
    liquidity_gross: u128,
    rounding: Rounding,
) -> u128 {
    let perc = perc_swap_change.div(one_minus_perc_swap, rounding);
    let amount = match rounding {
        Rounding::Down => perc.mul_int(liquidity_gross).to_int_floor(),
        Rounding::Up => perc.mul_int(liquidity_gross).to_int_ceil(),
    };
    u128::try_from(&amount).expect("swapped amount is bounded by liquidity")
}
