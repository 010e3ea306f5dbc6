use ethnum::U256;
use serde::{Deserialize, Serialize};

use crate::ledger::AccountId;
use crate::libraries::decimal::Decimal;

/// One price level of the limit-order book on one side of the pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitTickInfo {
    /// Sum of all position stakes minted at this tick since it was last
    /// cleared, in the supplied token.
    pub liquidity_gross: u128,
    /// Fraction of `liquidity_gross` still unswapped, in [0, 1]. Starts at
    /// one and only decreases; zero means the tick was fully crossed during
    /// the current swap and awaits the deferred burn.
    pub one_minus_perc_swap: Decimal,
    /// Cumulative fee per unit of gross liquidity, in the opposite token,
    /// scaled by 2^128. Wraps modulo 2^256.
    pub fee_growth_inside_x128: U256,
    /// Owners with a live position at this tick, in insertion order.
    pub owners: Vec<AccountId>,
}

impl LimitTickInfo {
    pub fn new() -> Self {
        LimitTickInfo {
            liquidity_gross: 0,
            one_minus_perc_swap: Decimal::one(),
            fee_growth_inside_x128: U256::ZERO,
            owners: Vec::new(),
        }
    }

    /// Still-swappable amount: floor(liquidityGross * oneMinusPercSwap).
    pub fn liquidity_left(&self) -> u128 {
        u128::try_from(
            &self
                .one_minus_perc_swap
                .mul_int(self.liquidity_gross)
                .to_int_floor(),
        )
        .expect("liquidity left is bounded by liquidity gross")
    }
}

impl Default for LimitTickInfo {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct LimitPositionKey {
    pub owner: AccountId,
    pub tick: i32,
    pub is_token0: bool,
}

/// A single LP's limit order at one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitPositionInfo {
    /// Stake in the supplied token.
    pub liquidity: u128,
    /// Tick swap-percentage snapshot taken at mint, re-derived when minting
    /// on top of a partially swapped position.
    pub one_minus_perc_swap_mint: Decimal,
    pub tokens_owed0: u128,
    pub tokens_owed1: u128,
    /// Tick fee-growth snapshot at the last position update.
    pub fee_growth_inside_last_x128: U256,
}

impl LimitPositionInfo {
    pub fn new() -> Self {
        LimitPositionInfo {
            liquidity: 0,
            one_minus_perc_swap_mint: Decimal::one(),
            tokens_owed0: 0,
            tokens_owed1: 0,
            fee_growth_inside_last_x128: U256::ZERO,
        }
    }
}
