//! The range-order engine: tick map, tick crossing, and position fee
//! accounting for the concentrated-liquidity side of the pool. The swap
//! loop couples to it only through [`next_tick`], [`cross`] and the swap
//! math libraries.

use std::collections::BTreeMap;

use ethnum::U256;
use num_bigint::BigUint;

use crate::libraries::{
    constants::{MAX_TICK, MIN_TICK, Q128},
    full_math::unsafe_mul_div,
    liquidity_math::{self, AddDeltaError},
    safe_cast::{big_uint_low_u128, u256_to_big_uint},
};

pub mod types;

use types::{RangePositionInfo, RangeTickInfo};

/// Max liquidity a single tick can carry so that the sum over all usable
/// ticks stays within u128.
pub fn tick_spacing_to_max_liquidity_per_tick(tick_spacing: i32) -> u128 {
    let min_tick = (MIN_TICK / tick_spacing) * tick_spacing;
    let max_tick = (MAX_TICK / tick_spacing) * tick_spacing;
    let num_ticks = ((max_tick - min_tick) / tick_spacing) as u32 + 1;
    u128::MAX / num_ticks as u128
}

/// Nearest initialized tick in the swap direction: at or below the current
/// tick when selling token0, strictly above it otherwise. Falls back to the
/// tick-domain boundary with `initialized = false`.
pub fn next_tick(
    ticks: &BTreeMap<i32, RangeTickInfo>,
    current_tick: i32,
    zero_for_one: bool,
) -> (i32, bool) {
    if zero_for_one {
        match ticks.range(..=current_tick).next_back() {
            Some((tick, _)) => (*tick, true),
            None => (MIN_TICK, false),
        }
    } else {
        match ticks.range(current_tick + 1..).next() {
            Some((tick, _)) => (*tick, true),
            None => (MAX_TICK, false),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateTickError {
    /// 'LO'
    LiquidityCapExceeded,
    /// 'LA' / 'LS'
    AddDelta(AddDeltaError),
    LiquidityNetOverflow,
}

/// Applies a liquidity delta to one boundary tick of a range position.
/// Returns whether the tick flipped between initialized and empty. All
/// failure paths are checked before any mutation.
pub fn update_tick(
    ticks: &mut BTreeMap<i32, RangeTickInfo>,
    tick: i32,
    current_tick: i32,
    liquidity_delta: i128,
    fee_growth_global_0_x128: U256,
    fee_growth_global_1_x128: U256,
    upper: bool,
    max_liquidity: u128,
) -> Result<bool, UpdateTickError> {
    let (liquidity_gross_before, liquidity_net_before) = match ticks.get(&tick) {
        Some(info) => (info.liquidity_gross, info.liquidity_net),
        None => (0, 0),
    };
    let liquidity_gross_after = liquidity_math::add_delta(liquidity_gross_before, liquidity_delta)
        .map_err(UpdateTickError::AddDelta)?;
    if liquidity_gross_after > max_liquidity {
        return Err(UpdateTickError::LiquidityCapExceeded);
    }
    // lower ticks add liquidity when crossed left to right, upper ticks
    // remove it
    let liquidity_net_after = if upper {
        liquidity_net_before.checked_sub(liquidity_delta)
    } else {
        liquidity_net_before.checked_add(liquidity_delta)
    }
    .ok_or(UpdateTickError::LiquidityNetOverflow)?;

    let info = ticks.entry(tick).or_default();
    if liquidity_gross_before == 0 && tick <= current_tick {
        // growth before initialization is assumed to have happened below
        info.fee_growth_outside_0_x128 = fee_growth_global_0_x128;
        info.fee_growth_outside_1_x128 = fee_growth_global_1_x128;
    }
    info.liquidity_gross = liquidity_gross_after;
    info.liquidity_net = liquidity_net_after;

    Ok((liquidity_gross_after == 0) != (liquidity_gross_before == 0))
}

/// Transitions a tick as the price moves through it, flipping its
/// fee-growth-outside accumulators. Returns the signed liquidity change for
/// a left-to-right crossing.
pub fn cross(
    info: &mut RangeTickInfo,
    fee_growth_global_0_x128: U256,
    fee_growth_global_1_x128: U256,
) -> i128 {
    info.fee_growth_outside_0_x128 =
        fee_growth_global_0_x128.wrapping_sub(info.fee_growth_outside_0_x128);
    info.fee_growth_outside_1_x128 =
        fee_growth_global_1_x128.wrapping_sub(info.fee_growth_outside_1_x128);
    info.liquidity_net
}

/// Fee growth per unit of liquidity inside a tick range, for both tokens.
/// All arithmetic wraps modulo 2^256.
pub fn get_fee_growth_inside(
    lower_info: &RangeTickInfo,
    upper_info: &RangeTickInfo,
    tick_lower: i32,
    tick_upper: i32,
    current_tick: i32,
    fee_growth_global_0_x128: U256,
    fee_growth_global_1_x128: U256,
) -> (U256, U256) {
    let (below_0, below_1) = if current_tick >= tick_lower {
        (
            lower_info.fee_growth_outside_0_x128,
            lower_info.fee_growth_outside_1_x128,
        )
    } else {
        (
            fee_growth_global_0_x128.wrapping_sub(lower_info.fee_growth_outside_0_x128),
            fee_growth_global_1_x128.wrapping_sub(lower_info.fee_growth_outside_1_x128),
        )
    };
    let (above_0, above_1) = if current_tick < tick_upper {
        (
            upper_info.fee_growth_outside_0_x128,
            upper_info.fee_growth_outside_1_x128,
        )
    } else {
        (
            fee_growth_global_0_x128.wrapping_sub(upper_info.fee_growth_outside_0_x128),
            fee_growth_global_1_x128.wrapping_sub(upper_info.fee_growth_outside_1_x128),
        )
    };

    (
        fee_growth_global_0_x128
            .wrapping_sub(below_0)
            .wrapping_sub(above_0),
        fee_growth_global_1_x128
            .wrapping_sub(below_1)
            .wrapping_sub(above_1),
    )
}

/// Credits accrued fees to a range position and applies a liquidity delta.
pub fn update_position(
    position: &mut RangePositionInfo,
    liquidity_delta: i128,
    fee_growth_inside_0_x128: U256,
    fee_growth_inside_1_x128: U256,
) -> Result<(), AddDeltaError> {
    let liquidity_next = liquidity_math::add_delta(position.liquidity, liquidity_delta)?;

    // overflow of the owed slots is acceptable: the LP has to withdraw
    // before hitting u128::MAX
    let fees_owed0 = big_uint_low_u128(&unsafe_mul_div(
        &u256_to_big_uint(
            fee_growth_inside_0_x128.wrapping_sub(position.fee_growth_inside_0_last_x128),
        ),
        &BigUint::from(position.liquidity),
        &u256_to_big_uint(Q128),
    ));
    let fees_owed1 = big_uint_low_u128(&unsafe_mul_div(
        &u256_to_big_uint(
            fee_growth_inside_1_x128.wrapping_sub(position.fee_growth_inside_1_last_x128),
        ),
        &BigUint::from(position.liquidity),
        &u256_to_big_uint(Q128),
    ));

    position.liquidity = liquidity_next;
    position.fee_growth_inside_0_last_x128 = fee_growth_inside_0_x128;
    position.fee_growth_inside_1_last_x128 = fee_growth_inside_1_x128;
    position.tokens_owed0 = position.tokens_owed0.wrapping_add(fees_owed0);
    position.tokens_owed1 = position.tokens_owed1.wrapping_add(fees_owed1);

    Ok(())
}
