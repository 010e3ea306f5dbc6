use ethnum::U256;
use serde::{Deserialize, Serialize};

use crate::ledger::AccountId;

/// One initialized range-order tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeTickInfo {
    /// Total position liquidity referencing this tick.
    pub liquidity_gross: u128,
    /// Net liquidity added when the tick is crossed left to right.
    pub liquidity_net: i128,
    /// Fee growth per unit of liquidity on the other side of this tick,
    /// relative to the current tick. Only has relative meaning.
    pub fee_growth_outside_0_x128: U256,
    pub fee_growth_outside_1_x128: U256,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct RangePositionKey {
    pub owner: AccountId,
    pub tick_lower: i32,
    pub tick_upper: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangePositionInfo {
    pub liquidity: u128,
    pub fee_growth_inside_0_last_x128: U256,
    pub fee_growth_inside_1_last_x128: U256,
    pub tokens_owed0: u128,
    pub tokens_owed1: u128,
}
