//! The interleaved swap loop.
//!
//! Each iteration first probes the limit-order book on the output side:
//! limit orders can only improve the taker's price, so a usable limit tick
//! is always consumed before any range-order price movement. When the best
//! limit tick is not usable yet, its price still clips the range-order step
//! target, so the range leg stops right at the limit order and the next
//! iteration picks it up.

use std::collections::BTreeMap;

use ethnum::{I256, U256};
use log::{debug, trace};

use crate::ledger::{AccountId, Ledger, TokenId};
use crate::libraries::{
    constants::{MAX_SQRT_RATIO, MIN_SQRT_RATIO, Q128},
    decimal::Decimal,
    full_math::unsafe_mul_div,
    limit_order_swap_math::compute_limit_swap_step,
    limit_order_tick_math::get_price_at_tick,
    liquidity_math,
    safe_cast::{big_uint_low_u256, u256_to_big_uint},
    swap_math::compute_swap_step,
    tick_math::{get_sqrt_ratio_at_tick, get_tick_at_sqrt_ratio},
};
use crate::limit_orders::{
    next_limit_tick,
    types::{LimitPositionKey, LimitTickInfo},
};
use crate::range_orders::{self, types::RangeTickInfo};

use super::types::SwapOutcome;
use super::{Pool, PoolError};

/// Swap-loop state, committed to the pool only after the taker's input is
/// secured.
struct SwapState {
    amount_specified_remaining: I256,
    amount_calculated: I256,
    sqrt_price_x96: U256,
    tick: i32,
    fee_growth_global_x128: U256,
    protocol_fee: u128,
    liquidity: u128,
    /// Limit ticks fully consumed by this swap, burnt after settlement.
    ticks_crossed: Vec<i32>,
}

impl Pool {
    /// Swaps `amount_specified` (> 0 exact input, < 0 exact output) of one
    /// token for the other, `zero_for_one` selecting the direction, until
    /// the amount is exhausted or the price reaches
    /// `sqrt_price_limit_x96`.
    pub fn swap(
        &mut self,
        ledger: &mut Ledger,
        recipient: AccountId,
        zero_for_one: bool,
        amount_specified: I256,
        sqrt_price_limit_x96: U256,
    ) -> Result<SwapOutcome, PoolError> {
        if amount_specified == I256::ZERO {
            return Err(PoolError::AmountSpecifiedZero);
        }
        let slot0_start = self.slot0_checked()?.clone();
        if zero_for_one {
            if !(sqrt_price_limit_x96 < slot0_start.sqrt_price_x96
                && sqrt_price_limit_x96 > *MIN_SQRT_RATIO)
            {
                return Err(PoolError::SqrtPriceLimitOutOfRange);
            }
        } else if !(sqrt_price_limit_x96 > slot0_start.sqrt_price_x96
            && sqrt_price_limit_x96 < *MAX_SQRT_RATIO)
        {
            return Err(PoolError::SqrtPriceLimitOutOfRange);
        }

        let fee_protocol = if zero_for_one {
            slot0_start.fee_protocol % 16
        } else {
            slot0_start.fee_protocol >> 4
        };
        let exact_input = amount_specified > I256::ZERO;

        // the swap consumes the book of the token it pays out
        let mut limit_book = if zero_for_one {
            self.ticks_limit_tokens1.clone()
        } else {
            self.ticks_limit_tokens0.clone()
        };
        let mut crossed_range_ticks: Vec<(i32, RangeTickInfo)> = Vec::new();

        let mut state = SwapState {
            amount_specified_remaining: amount_specified,
            amount_calculated: I256::ZERO,
            sqrt_price_x96: slot0_start.sqrt_price_x96,
            tick: slot0_start.tick,
            fee_growth_global_x128: if zero_for_one {
                self.fee_growth_global_0_x128
            } else {
                self.fee_growth_global_1_x128
            },
            protocol_fee: 0,
            liquidity: self.liquidity,
            ticks_crossed: Vec::new(),
        };

        while state.amount_specified_remaining != I256::ZERO
            && state.sqrt_price_x96 != sqrt_price_limit_x96
        {
            // limit orders first: they can only better the taker's price
            let (limit_tick, limit_usable) =
                next_limit_tick(&limit_book, !zero_for_one, state.tick);
            if limit_usable {
                let limit_tick = limit_tick.expect("usable implies a candidate");
                if self.execute_limit_step(
                    &mut state,
                    &mut limit_book,
                    limit_tick,
                    zero_for_one,
                    exact_input,
                    fee_protocol,
                )? {
                    // tick crossed and input left: look for the next tick
                    continue;
                }
                // swap exhausted on the limit leg; the range book is
                // untouched
                break;
            }

            self.execute_range_step(
                &mut state,
                &mut crossed_range_ticks,
                limit_tick,
                sqrt_price_limit_x96,
                zero_for_one,
                exact_input,
                fee_protocol,
            )?;
        }

        let (amount0, amount1) = if zero_for_one == exact_input {
            (
                amount_specified - state.amount_specified_remaining,
                state.amount_calculated,
            )
        } else {
            (
                state.amount_calculated,
                amount_specified - state.amount_specified_remaining,
            )
        };
        let (input_token, output_token) = if zero_for_one {
            (self.token0, self.token1)
        } else {
            (self.token1, self.token0)
        };
        let (amount_in, amount_out) = if zero_for_one {
            (amount0, amount1)
        } else {
            (amount1, amount0)
        };
        debug_assert!(amount_in >= I256::ZERO && amount_out <= I256::ZERO);
        let amount_in_abs = amount_in.as_u256();

        // secure the taker's input before committing anything
        if ledger.balance_of(recipient, input_token) < amount_in_abs {
            return Err(PoolError::InsufficientBalance);
        }

        // commit the buffered swap state
        if zero_for_one {
            self.ticks_limit_tokens1 = limit_book;
        } else {
            self.ticks_limit_tokens0 = limit_book;
        }
        for (tick, info) in crossed_range_ticks {
            self.ticks.insert(tick, info);
        }
        let slot0 = self.slot0.as_mut().expect("checked on entry");
        slot0.sqrt_price_x96 = state.sqrt_price_x96;
        slot0.tick = state.tick;
        if self.liquidity != state.liquidity {
            self.liquidity = state.liquidity;
        }
        // overflow of the accumulators is acceptable
        if zero_for_one {
            self.fee_growth_global_0_x128 = state.fee_growth_global_x128;
            if state.protocol_fee > 0 {
                self.protocol_fees.token0 =
                    self.protocol_fees.token0.wrapping_add(state.protocol_fee);
            }
        } else {
            self.fee_growth_global_1_x128 = state.fee_growth_global_x128;
            if state.protocol_fee > 0 {
                self.protocol_fees.token1 =
                    self.protocol_fees.token1.wrapping_add(state.protocol_fee);
            }
        }

        // settle: pay the output leg first, then pull the input and check
        // the pool actually received it in full
        if amount_out < I256::ZERO {
            ledger
                .transfer(
                    self.account,
                    recipient,
                    output_token,
                    (-amount_out).as_u256(),
                )
                .expect("pool balance covers the swap output");
        }
        let balance_before = ledger.balance_of(self.account, input_token);
        ledger
            .transfer(recipient, self.account, input_token, amount_in_abs)
            .expect("taker balance was checked before committing");
        if balance_before + amount_in_abs != ledger.balance_of(self.account, input_token) {
            return Err(PoolError::InputAmountMismatch);
        }

        // burn the fully crossed limit ticks now that the input is in
        let supplied_token = if zero_for_one {
            self.token1
        } else {
            self.token0
        };
        let ticks_crossed = std::mem::take(&mut state.ticks_crossed);
        for tick in ticks_crossed {
            self.burn_crossed_tick(ledger, tick, supplied_token)?;
        }

        debug!(
            "swap settled: recipient {recipient:?} amount0 {amount0} amount1 {amount1} tick {}",
            state.tick
        );
        Ok(SwapOutcome {
            recipient,
            amount0,
            amount1,
            sqrt_price_x96: state.sqrt_price_x96,
            liquidity: state.liquidity,
            tick: state.tick,
        })
    }

    /// One limit-order step. Returns true when the swap should continue
    /// with the next iteration (tick crossed, input remaining), false when
    /// the swap is exhausted.
    fn execute_limit_step(
        &self,
        state: &mut SwapState,
        limit_book: &mut BTreeMap<i32, LimitTickInfo>,
        limit_tick: i32,
        zero_for_one: bool,
        exact_input: bool,
        fee_protocol: u8,
    ) -> Result<bool, PoolError> {
        let price_x96 = get_price_at_tick(limit_tick)?;
        let info = limit_book
            .get_mut(&limit_tick)
            .expect("probed tick is present");
        assert!(!info.one_minus_perc_swap.is_zero());
        assert!(info.one_minus_perc_swap <= Decimal::one());

        let step = compute_limit_swap_step(
            price_x96,
            info.liquidity_gross,
            state.amount_specified_remaining,
            self.fee_pips,
            zero_for_one,
            &info.one_minus_perc_swap,
        );
        trace!(
            "limit step at tick {limit_tick}: in {} out {} fee {} crossed {}",
            step.amount_in, step.amount_out, step.fee_amount, step.tick_crossed
        );
        info.one_minus_perc_swap = step.resulting_one_minus_perc_swap.clone();

        if exact_input {
            state.amount_specified_remaining = state
                .amount_specified_remaining
                .checked_sub((step.amount_in + step.fee_amount).as_i256())
                .ok_or(PoolError::ArithmeticOverflow)?;
            state.amount_calculated = state
                .amount_calculated
                .checked_sub(step.amount_out.as_i256())
                .ok_or(PoolError::ArithmeticOverflow)?;
        } else {
            state.amount_specified_remaining = state
                .amount_specified_remaining
                .checked_add(step.amount_out.as_i256())
                .ok_or(PoolError::ArithmeticOverflow)?;
            state.amount_calculated = state
                .amount_calculated
                .checked_add((step.amount_in + step.fee_amount).as_i256())
                .ok_or(PoolError::ArithmeticOverflow)?;
        }

        let mut fee_amount = step.fee_amount;
        if fee_protocol > 0 {
            let delta = fee_amount / U256::from(fee_protocol);
            fee_amount -= delta;
            state.protocol_fee = state.protocol_fee.wrapping_add(delta.as_u128());
        }

        // fee per unit of gross liquidity, in the input token; the
        // accumulator wraps modulo 2^256
        let fee_growth_delta = big_uint_low_u256(&unsafe_mul_div(
            &u256_to_big_uint(fee_amount),
            &u256_to_big_uint(Q128),
            &u256_to_big_uint(U256::from(info.liquidity_gross)),
        ));
        info.fee_growth_inside_x128 = info
            .fee_growth_inside_x128
            .wrapping_add(fee_growth_delta);

        if step.tick_crossed {
            assert!(info.one_minus_perc_swap.is_zero());
            // income must be received before the tick's LPs get paid, so
            // the burn is deferred to the end of the swap
            state.ticks_crossed.push(limit_tick);
            Ok(state.amount_specified_remaining != I256::ZERO)
        } else {
            // a partial fill only happens when it exhausts the swap
            assert!(
                state.amount_specified_remaining == I256::ZERO,
                "partial limit-order fill left input unconsumed"
            );
            Ok(false)
        }
    }

    /// One range-order step towards the price limit, the next initialized
    /// range tick, or the best (not yet usable) limit tick, whichever is
    /// closest.
    #[allow(clippy::too_many_arguments)]
    fn execute_range_step(
        &self,
        state: &mut SwapState,
        crossed_range_ticks: &mut Vec<(i32, RangeTickInfo)>,
        limit_tick: Option<i32>,
        sqrt_price_limit_x96: U256,
        zero_for_one: bool,
        exact_input: bool,
        fee_protocol: u8,
    ) -> Result<(), PoolError> {
        let sqrt_price_start_x96 = state.sqrt_price_x96;

        let (tick_next, next_initialized) =
            range_orders::next_tick(&self.ticks, state.tick, zero_for_one);
        let sqrt_price_next_x96 = get_sqrt_ratio_at_tick(tick_next)?;

        // stop just before a known limit tick (one below it when moving
        // down, exactly on it when moving up) so the next iteration can
        // consume it at its own price
        let limit_clip_x96 = match limit_tick {
            Some(tick) => {
                get_sqrt_ratio_at_tick(if zero_for_one { tick - 1 } else { tick })?
            }
            None => sqrt_price_limit_x96,
        };
        let sqrt_price_target_x96 = if zero_for_one {
            sqrt_price_limit_x96
                .max(sqrt_price_next_x96)
                .max(limit_clip_x96)
        } else {
            sqrt_price_limit_x96
                .min(sqrt_price_next_x96)
                .min(limit_clip_x96)
        };

        let (sqrt_price_after_x96, amount_in, amount_out, mut fee_amount) = compute_swap_step(
            state.sqrt_price_x96,
            sqrt_price_target_x96,
            state.liquidity,
            state.amount_specified_remaining,
            self.fee_pips,
        )?;
        state.sqrt_price_x96 = sqrt_price_after_x96;
        trace!(
            "range step towards {sqrt_price_target_x96}: in {amount_in} out {amount_out} fee {fee_amount}"
        );

        if exact_input {
            state.amount_specified_remaining = state
                .amount_specified_remaining
                .checked_sub((amount_in + fee_amount).as_i256())
                .ok_or(PoolError::ArithmeticOverflow)?;
            state.amount_calculated = state
                .amount_calculated
                .checked_sub(amount_out.as_i256())
                .ok_or(PoolError::ArithmeticOverflow)?;
        } else {
            state.amount_specified_remaining = state
                .amount_specified_remaining
                .checked_add(amount_out.as_i256())
                .ok_or(PoolError::ArithmeticOverflow)?;
            state.amount_calculated = state
                .amount_calculated
                .checked_add((amount_in + fee_amount).as_i256())
                .ok_or(PoolError::ArithmeticOverflow)?;
        }

        if fee_protocol > 0 {
            let delta = fee_amount / U256::from(fee_protocol);
            fee_amount -= delta;
            state.protocol_fee = state.protocol_fee.wrapping_add(delta.as_u128());
        }

        if state.liquidity > 0 {
            let fee_growth_delta = big_uint_low_u256(&unsafe_mul_div(
                &u256_to_big_uint(fee_amount),
                &u256_to_big_uint(Q128),
                &u256_to_big_uint(U256::from(state.liquidity)),
            ));
            state.fee_growth_global_x128 = state
                .fee_growth_global_x128
                .wrapping_add(fee_growth_delta);
        }

        if state.sqrt_price_x96 == sqrt_price_next_x96 {
            // reached the next range tick; run the transition if it is
            // initialized
            if next_initialized {
                let mut tick_info = self
                    .ticks
                    .get(&tick_next)
                    .cloned()
                    .expect("initialized tick is present");
                let (fee_growth_global_0, fee_growth_global_1) = if zero_for_one {
                    (state.fee_growth_global_x128, self.fee_growth_global_1_x128)
                } else {
                    (self.fee_growth_global_0_x128, state.fee_growth_global_x128)
                };
                let mut liquidity_net = range_orders::cross(
                    &mut tick_info,
                    fee_growth_global_0,
                    fee_growth_global_1,
                );
                crossed_range_ticks.push((tick_next, tick_info));
                // moving leftward the net liquidity applies with the
                // opposite sign
                if zero_for_one {
                    liquidity_net = -liquidity_net;
                }
                state.liquidity = liquidity_math::add_delta(state.liquidity, liquidity_net)?;
            }
            state.tick = if zero_for_one { tick_next - 1 } else { tick_next };
        } else if state.sqrt_price_x96 != sqrt_price_start_x96 {
            // recompute unless we are on a lower tick boundary (already
            // transitioned) and have not moved
            state.tick = get_tick_at_sqrt_ratio(state.sqrt_price_x96)?;
        }
        Ok(())
    }

    /// Burns every position of a fully crossed limit tick, paying the
    /// owners out through the regular burn/collect path, and asserts the
    /// tick is gone afterwards.
    fn burn_crossed_tick(
        &mut self,
        ledger: &mut Ledger,
        tick: i32,
        token: TokenId,
    ) -> Result<(), PoolError> {
        let is_token0 = token == self.token0;
        let owners = {
            let book = if is_token0 {
                &self.ticks_limit_tokens0
            } else {
                &self.ticks_limit_tokens1
            };
            let info = book.get(&tick).expect("crossed tick awaits burning");
            assert!(info.one_minus_perc_swap.is_zero());
            // burning mutates the roster, so iterate a snapshot
            info.owners.clone()
        };

        for owner in owners {
            let key = LimitPositionKey {
                owner,
                tick,
                is_token0,
            };
            let liquidity = self
                .limit_orders
                .get(&key)
                .expect("roster owner has a live position")
                .liquidity;
            assert!(liquidity > 0);
            self.burn_limit_order(ledger, token, owner, tick, liquidity)?;
            debug_assert!(!self.limit_orders.contains_key(&key));
        }

        let book = if is_token0 {
            &self.ticks_limit_tokens0
        } else {
            &self.ticks_limit_tokens1
        };
        assert!(
            !book.contains_key(&tick),
            "fully crossed tick must clear after its burns"
        );
        Ok(())
    }
}
