//! The limit-order tick book: one ordered map of ticks per supplied token.

use std::collections::BTreeMap;

use crate::ledger::AccountId;
use crate::libraries::liquidity_math::{self, AddDeltaError};

pub mod position;
pub mod types;

use types::LimitTickInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateLimitTickError {
    /// 'LO'
    LiquidityCapExceeded,
    /// 'LA' / 'LS'
    AddDelta(AddDeltaError),
}

/// Applies a liquidity delta to a tick, creating it on first mint and
/// keeping its owner roster in sync.
///
/// Returns whether the tick flipped between empty and non-empty. Capacity
/// and under/overflow are validated before any state is written, so a
/// failed update leaves the book untouched.
pub fn update(
    book: &mut BTreeMap<i32, LimitTickInfo>,
    tick: i32,
    liquidity_delta: i128,
    max_liquidity: u128,
    created: bool,
    owner: AccountId,
) -> Result<bool, UpdateLimitTickError> {
    let liquidity_gross_before = match book.get(&tick) {
        Some(info) => info.liquidity_gross,
        None => {
            assert!(liquidity_delta > 0, "an empty tick must not be created");
            0
        }
    };
    let liquidity_gross_after = liquidity_math::add_delta(liquidity_gross_before, liquidity_delta)
        .map_err(UpdateLimitTickError::AddDelta)?;
    if liquidity_gross_after > max_liquidity {
        return Err(UpdateLimitTickError::LiquidityCapExceeded);
    }

    let info = book.entry(tick).or_insert_with(LimitTickInfo::new);
    if liquidity_delta > 0 {
        // a fully swapped tick is burnt before the swap returns, so nothing
        // can be minted onto it
        assert!(
            !info.one_minus_perc_swap.is_zero(),
            "minting onto a fully swapped tick"
        );
    }

    let flipped = (liquidity_gross_after == 0) != (liquidity_gross_before == 0);
    info.liquidity_gross = liquidity_gross_after;

    if liquidity_delta > 0 && created {
        assert!(
            !info.owners.contains(&owner),
            "owner already present in the tick roster"
        );
        info.owners.push(owner);
    } else {
        assert!(
            info.owners.contains(&owner),
            "owner missing from the tick roster"
        );
    }

    Ok(flipped)
}

/// Next tick the swap loop should consider, skipping ticks whose
/// `oneMinusPercSwap` has reached zero (crossed earlier in the same swap,
/// awaiting the deferred burn).
///
/// With `lte` the candidate is the lowest viable tick and it is usable only
/// at or below `current_tick`; otherwise the highest viable tick, usable
/// only above `current_tick`. An unusable candidate is still returned so
/// the range-order step can clip its price target to it.
pub fn next_limit_tick(
    book: &BTreeMap<i32, LimitTickInfo>,
    lte: bool,
    current_tick: i32,
) -> (Option<i32>, bool) {
    let candidate = if lte {
        book.iter()
            .find(|(_, info)| !info.one_minus_perc_swap.is_zero())
            .map(|(tick, _)| *tick)
    } else {
        book.iter()
            .rev()
            .find(|(_, info)| !info.one_minus_perc_swap.is_zero())
            .map(|(tick, _)| *tick)
    };
    match candidate {
        None => (None, false),
        Some(tick) => {
            let usable = if lte {
                tick <= current_tick
            } else {
                tick > current_tick
            };
            (Some(tick), usable)
        }
    }
}
