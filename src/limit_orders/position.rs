//! Limit-order position store and partial-fill accounting.

use std::collections::BTreeMap;

use ethnum::{I256, U256};
use num_bigint::BigUint;

use crate::libraries::{
    constants::Q128,
    decimal::{Decimal, Rounding},
    full_math::{mul_div, unsafe_mul_div},
    limit_order_math::{
        calculate_amount0_lo, calculate_amount1_lo, get_amount_swapped_from_tick_percentage,
    },
    safe_cast::{big_uint_low_u128, u256_to_big_uint},
};

use super::types::{LimitPositionInfo, LimitPositionKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitPositionError {
    /// POSITION_NOT_FOUND
    NotFound,
}

/// Fetches a position, lazily creating an empty one. Callers that must not
/// create (burn, collect) run [`ensure_exists`] first.
pub fn get_or_create<'a>(
    store: &'a mut BTreeMap<LimitPositionKey, LimitPositionInfo>,
    key: &LimitPositionKey,
) -> (&'a mut LimitPositionInfo, bool) {
    let created = !store.contains_key(key);
    let position = store.entry(*key).or_insert_with(LimitPositionInfo::new);
    (position, created)
}

pub fn ensure_exists(
    store: &BTreeMap<LimitPositionKey, LimitPositionInfo>,
    key: &LimitPositionKey,
) -> Result<(), LimitPositionError> {
    if store.contains_key(key) {
        Ok(())
    } else {
        Err(LimitPositionError::NotFound)
    }
}

/// Applies a liquidity delta to a position, crediting fees and, on burn,
/// the proportional unswapped/swapped shares into `tokens_owed{0,1}`.
///
/// `current_one_minus_perc_swap` and `fee_growth_inside_x128` are the
/// owning tick's state; `price_x96` the tick's price. Returns the signed
/// deltas `(liquidity_left, liquidity_swapped)`: the change of the
/// position's unswapped stake in the supplied token, and of its already
/// swapped share converted to the opposite token.
pub fn update(
    position: &mut LimitPositionInfo,
    liquidity_delta: i128,
    current_one_minus_perc_swap: &Decimal,
    is_token0: bool,
    price_x96: U256,
    fee_growth_inside_x128: U256,
    created: bool,
) -> (I256, I256) {
    if created {
        assert!(liquidity_delta > 0, "a position is only created by a mint");
        position.one_minus_perc_swap_mint = current_one_minus_perc_swap.clone();
        position.fee_growth_inside_last_x128 = fee_growth_inside_x128;
    }

    let liquidity = position.liquidity;
    let liquidity_next = if liquidity_delta >= 0 {
        liquidity
            .checked_add(liquidity_delta as u128)
            .expect("caller bounds the mint against the tick cap")
    } else {
        liquidity
            .checked_sub(liquidity_delta.unsigned_abs())
            .expect("caller rejects burning more than the position holds")
    };

    // fees accrued since the last snapshot, in the opposite token; the
    // wrapped difference keeps working across accumulator overflow, and the
    // result is truncated to 128 bits like the owed slots themselves
    let growth_delta = fee_growth_inside_x128.wrapping_sub(position.fee_growth_inside_last_x128);
    let fees_owed = big_uint_low_u128(&unsafe_mul_div(
        &u256_to_big_uint(growth_delta),
        &BigUint::from(liquidity),
        &u256_to_big_uint(Q128),
    ));

    let liquidity_left_delta;
    let liquidity_swapped_delta;
    if liquidity_delta >= 0 {
        liquidity_left_delta = I256::from(liquidity_delta);
        liquidity_swapped_delta = I256::ZERO;

        if liquidity_delta > 0 && current_one_minus_perc_swap < &position.one_minus_perc_swap_mint
        {
            // Mint on top of a partially swapped position: re-derive the
            // mint snapshot X so that a later burn of the enlarged stake
            // reconstructs the same already-swapped amount.
            //
            //   swapped(before) = floor(liquidity * (mint - current) / mint)
            //   X solves swapped(before) = liquidityNext * (1 - current) rel. X
            //   X = 1 - (liquidityNext * (1 - current) - swapped) / (liquidityNext - swapped)
            //
            // The substrahend is rounded down, making X conservative (high)
            // for the pool.
            let perc_swap_decrease = position
                .one_minus_perc_swap_mint
                .sub_up(current_one_minus_perc_swap);
            let amount_swapped_prev = get_amount_swapped_from_tick_percentage(
                &perc_swap_decrease,
                &position.one_minus_perc_swap_mint,
                liquidity,
                Rounding::Down,
            );

            let swapped_fraction = Decimal::one().sub_up(current_one_minus_perc_swap);
            let numerator = swapped_fraction
                .mul_int(liquidity_next)
                .sub_up(&Decimal::from_int(amount_swapped_prev));
            let substrahend = numerator.div(
                &Decimal::from_int(liquidity_next - amount_swapped_prev),
                Rounding::Down,
            );
            let new_one_minus_perc_swap_mint = Decimal::one().sub_up(&substrahend);

            assert!(new_one_minus_perc_swap_mint < position.one_minus_perc_swap_mint);
            assert!(&new_one_minus_perc_swap_mint > current_one_minus_perc_swap);
            assert!(!new_one_minus_perc_swap_mint.is_zero());

            position.one_minus_perc_swap_mint = new_one_minus_perc_swap_mint;
        }
    } else {
        assert!(!position.one_minus_perc_swap_mint.is_zero());

        // Share of this position swapped away since its mint snapshot. The
        // up/down pairing (input remainder from the ceiling, output from
        // the floor) keeps the payout within one unit in the pool's favour
        // across repeated partial burns.
        let perc_swap_decrease = position
            .one_minus_perc_swap_mint
            .sub_up(current_one_minus_perc_swap);
        let amount_swapped_down = get_amount_swapped_from_tick_percentage(
            &perc_swap_decrease,
            &position.one_minus_perc_swap_mint,
            liquidity,
            Rounding::Down,
        );
        let amount_swapped_up = get_amount_swapped_from_tick_percentage(
            &perc_swap_decrease,
            &position.one_minus_perc_swap_mint,
            liquidity,
            Rounding::Up,
        );
        let remaining_input = liquidity
            .checked_sub(amount_swapped_up)
            .expect("swapped share is bounded by the stake");

        // proportional part of the burn, on each side
        let liquidity_to_remove = liquidity_delta.unsigned_abs();
        let left_abs = mul_div(
            U256::from(liquidity_to_remove),
            U256::from(remaining_input),
            U256::from(liquidity),
        )
        .expect("burn share fits 256 bits")
        .as_u128();
        let swapped_abs = mul_div(
            U256::from(liquidity_to_remove),
            U256::from(amount_swapped_down),
            U256::from(liquidity),
        )
        .expect("burn share fits 256 bits")
        .as_u128();
        let swapped_output = if is_token0 {
            calculate_amount1_lo(&BigUint::from(swapped_abs), price_x96, false)
        } else {
            calculate_amount0_lo(&BigUint::from(swapped_abs), price_x96, false)
        };
        let swapped_output_u128 = big_uint_low_u128(&swapped_output);

        if is_token0 {
            position.tokens_owed0 = position.tokens_owed0.wrapping_add(left_abs);
            position.tokens_owed1 = position.tokens_owed1.wrapping_add(swapped_output_u128);
        } else {
            position.tokens_owed1 = position.tokens_owed1.wrapping_add(left_abs);
            position.tokens_owed0 = position.tokens_owed0.wrapping_add(swapped_output_u128);
        }

        liquidity_left_delta = -I256::from(left_abs);
        liquidity_swapped_delta = -I256::from(swapped_output_u128);
    }

    if liquidity_delta != 0 {
        position.liquidity = liquidity_next;
    }
    position.fee_growth_inside_last_x128 = fee_growth_inside_x128;

    if fees_owed > 0 {
        // fees are denominated in the opposite token
        if is_token0 {
            position.tokens_owed1 = position.tokens_owed1.wrapping_add(fees_owed);
        } else {
            position.tokens_owed0 = position.tokens_owed0.wrapping_add(fees_owed);
        }
    }

    (liquidity_left_delta, liquidity_swapped_delta)
}
