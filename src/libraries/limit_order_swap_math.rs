//! Swap-step computation for a single limit-order tick.

use ethnum::{I256, U256};
use num_bigint::BigUint;

use super::{
    constants::ONE_IN_PIPS,
    decimal::{Decimal, Rounding},
    full_math::{mul_div, mul_div_rounding_up},
    limit_order_math::{
        calculate_amount0_lo, calculate_amount1_lo, get_amount_swapped_from_tick_percentage,
    },
    safe_cast::{big_uint_to_u256, u256_to_big_uint},
};

/// Outcome of swapping against one limit-order tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitSwapStep {
    /// Input consumed, in the taker's input token.
    pub amount_in: U256,
    /// Output produced, in the token the tick's LPs supplied.
    pub amount_out: U256,
    /// Fee taken from the input on top of `amount_in`.
    pub fee_amount: U256,
    /// Whether the tick's liquidity was fully consumed.
    pub tick_crossed: bool,
    /// Tick swap-percentage state after the step; zero iff crossed.
    pub resulting_one_minus_perc_swap: Decimal,
}

/// Computes the result of swapping `amount_remaining` (>= 0 exact input,
/// < 0 exact output) against a tick with `liquidity_gross` total stake of
/// which `oneMinusPercSwap` is still unswapped.
///
/// For an exact input that does not cross the tick, the fee plus the input
/// consumed exactly equals the remaining amount, so the swap terminates on
/// this step.
pub fn compute_limit_swap_step(
    price_x96: U256,
    liquidity_gross: u128,
    amount_remaining: I256,
    fee_pips: u32,
    zero_for_one: bool,
    one_minus_perc_swap: &Decimal,
) -> LimitSwapStep {
    // still-swappable amount, in the LPs' supplied token
    let liquidity_left = u128::try_from(
        &one_minus_perc_swap
            .mul_int(liquidity_gross)
            .to_int_floor(),
    )
    .expect("liquidity left is bounded by liquidity gross");

    let exact_in = amount_remaining >= I256::ZERO;
    let amount_remaining_abs = if exact_in {
        amount_remaining.as_u256()
    } else {
        (-amount_remaining).as_u256()
    };

    let amount_in;
    let amount_out;
    let resulting_one_minus_perc_swap;
    if exact_in {
        let amount_remaining_less_fee = mul_div(
            amount_remaining_abs,
            U256::from(ONE_IN_PIPS - fee_pips),
            U256::from(ONE_IN_PIPS),
        )
        .expect("fee fraction of the input fits 256 bits");

        // full-precision output; may exceed 256 bits at extreme prices, in
        // which case the cap against liquidity_left below kicks in
        let output_for_input = if zero_for_one {
            calculate_amount1_lo(&u256_to_big_uint(amount_remaining_less_fee), price_x96, false)
        } else {
            calculate_amount0_lo(&u256_to_big_uint(amount_remaining_less_fee), price_x96, false)
        };

        if output_for_input >= BigUint::from(liquidity_left) {
            // tick crossed: the taker absorbs everything that is left
            let input_for_liquidity = if zero_for_one {
                calculate_amount0_lo(&BigUint::from(liquidity_left), price_x96, true)
            } else {
                calculate_amount1_lo(&BigUint::from(liquidity_left), price_x96, true)
            };
            amount_in =
                big_uint_to_u256(&input_for_liquidity).expect("input for crossing fits 256 bits");
            assert!(
                amount_in <= amount_remaining_less_fee,
                "input to cross the tick exceeds the remainder"
            );
            amount_out = U256::from(liquidity_left);
            resulting_one_minus_perc_swap = Decimal::zero();
        } else {
            let target_out =
                u128::try_from(&output_for_input).expect("partial output is below liquidity left");
            let (step_in, step_out, resulting) = calculate_amounts(
                target_out,
                liquidity_left,
                one_minus_perc_swap,
                price_x96,
                zero_for_one,
            );
            assert!(step_in <= amount_remaining_less_fee);
            assert!(step_out < liquidity_left);
            amount_in = step_in;
            amount_out = U256::from(step_out);
            resulting_one_minus_perc_swap = resulting;
        }
    } else if amount_remaining_abs >= U256::from(liquidity_left) {
        // exact output, tick crossed
        amount_out = U256::from(liquidity_left);
        let input_for_liquidity = if zero_for_one {
            calculate_amount0_lo(&BigUint::from(liquidity_left), price_x96, true)
        } else {
            calculate_amount1_lo(&BigUint::from(liquidity_left), price_x96, true)
        };
        amount_in =
            big_uint_to_u256(&input_for_liquidity).expect("input for crossing fits 256 bits");
        resulting_one_minus_perc_swap = Decimal::zero();
    } else {
        let (step_in, step_out, resulting) = calculate_amounts(
            amount_remaining_abs.as_u128(),
            liquidity_left,
            one_minus_perc_swap,
            price_x96,
            zero_for_one,
        );
        assert!(step_out < liquidity_left);
        amount_in = step_in;
        amount_out = U256::from(step_out);
        resulting_one_minus_perc_swap = resulting;
    }

    let tick_crossed = amount_out == U256::from(liquidity_left);
    assert!(
        tick_crossed == resulting_one_minus_perc_swap.is_zero(),
        "crossing state out of sync with swap percentage"
    );
    debug_assert!(exact_in || amount_out <= amount_remaining_abs);

    let fee_amount = if exact_in && !tick_crossed {
        // the swap ends here, so the remainder of the input is the fee;
        // this also absorbs the rounding slack of amount_in
        amount_remaining_abs - amount_in
    } else {
        mul_div_rounding_up(
            amount_in,
            U256::from(fee_pips),
            U256::from(ONE_IN_PIPS - fee_pips),
        )
        .expect("fee on the input fits 256 bits")
    };

    LimitSwapStep {
        amount_in,
        amount_out,
        fee_amount,
        tick_crossed,
        resulting_one_minus_perc_swap,
    }
}

/// Computes the exact `(amount_in, amount_out, resultingOneMinusPercSwap)`
/// for a swap that stays inside the tick.
///
/// The percentage decrease is first derived from the requested output, then
/// the output is recomputed from the stored percentage so that it matches
/// what a later burn will reconstruct. `amount_in` is derived from the
/// rounded-up output; together with the floor-rounded stored output this
/// bounds the divergence between swap and burn accounting to one unit in
/// the pool's favour.
fn calculate_amounts(
    amount_out: u128,
    liquidity_left: u128,
    one_minus_perc_swap: &Decimal,
    price_x96: U256,
    zero_for_one: bool,
) -> (U256, u128, Decimal) {
    // two steps, each rounded down: fraction of the remaining liquidity,
    // then the percentage-points of the original stake it corresponds to
    let fraction = Decimal::ratio(
        &BigUint::from(amount_out),
        &BigUint::from(liquidity_left),
        Rounding::Down,
    );
    let perc_swap_decrease = one_minus_perc_swap.mul(&fraction, Rounding::Down);

    let resulting = one_minus_perc_swap.sub_up(&perc_swap_decrease);
    assert!(!resulting.is_zero());
    assert!(resulting <= Decimal::one());
    assert!(&resulting <= one_minus_perc_swap);

    // reconstruct the decrease actually representable in the stored state
    let perc_swap_decrease = one_minus_perc_swap.sub_up(&resulting);

    let amount_out = get_amount_swapped_from_tick_percentage(
        &perc_swap_decrease,
        one_minus_perc_swap,
        liquidity_left,
        Rounding::Down,
    );
    let amount_out_up = get_amount_swapped_from_tick_percentage(
        &perc_swap_decrease,
        one_minus_perc_swap,
        liquidity_left,
        Rounding::Up,
    );
    assert!(amount_out_up >= amount_out && amount_out_up - amount_out <= 1);

    let amount_in_wide = if zero_for_one {
        calculate_amount0_lo(&BigUint::from(amount_out_up), price_x96, true)
    } else {
        calculate_amount1_lo(&BigUint::from(amount_out_up), price_x96, true)
    };
    let amount_in = big_uint_to_u256(&amount_in_wide).expect("partial input fits 256 bits");

    (amount_in, amount_out, resulting)
}
