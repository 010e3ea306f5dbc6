use ethnum::{I256, U256};
use serde::{Deserialize, Serialize};

use crate::ledger::AccountId;

/// Price/tick slot of the pool, set once at initialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot0 {
    pub sqrt_price_x96: U256,
    /// Current tick. After a downward swap that stops exactly on a tick
    /// boundary this can be one below the tick of `sqrt_price_x96`, which
    /// does not affect swaps.
    pub tick: i32,
    /// Protocol fee denominators, packed as `p0 | (p1 << 4)`; each nibble
    /// is 0 (off) or in [4, 10].
    pub fee_protocol: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolFees {
    pub token0: u128,
    pub token1: u128,
}

/// Result of a swap: signed amounts from the pool's point of view
/// (positive flows into the pool) and the post-swap range-order state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapOutcome {
    pub recipient: AccountId,
    pub amount0: I256,
    pub amount1: I256,
    pub sqrt_price_x96: U256,
    pub liquidity: u128,
    pub tick: i32,
}

/// Result of burning a limit order. When the burn empties the position the
/// amounts include the automatic collect, fees included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitOrderBurn {
    pub owner: AccountId,
    pub tick: i32,
    pub amount: u128,
    pub amount_burnt0: u128,
    pub amount_burnt1: u128,
}
