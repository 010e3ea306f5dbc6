use ethnum::U256;
use lazy_static::lazy_static;

/// Fee denominator: fees are expressed in hundredths of a basis point.
pub const ONE_IN_PIPS: u32 = 1_000_000;

pub const Q96: U256 = U256::from_words(0, 79228162514264337593543950336); // 2^96
pub const Q128: U256 = U256::from_words(1, 0); // 2^128

/// Range-order tick domain, i.e. the ticks at which sqrtPriceX96 stays
/// within [MIN_SQRT_RATIO, MAX_SQRT_RATIO).
pub const MIN_TICK: i32 = -887272;
pub const MAX_TICK: i32 = 887272;

/// Limit-order tick domain. It is narrower than the range-order one because
/// priceX96 (the squared price) truncates to zero below MIN_TICK_LO even
/// though the sqrt price does not.
pub const MIN_TICK_LO: i32 = -665455;
pub const MAX_TICK_LO: i32 = 665455;

lazy_static! {
    /// sqrt ratio at MIN_TICK.
    pub static ref MIN_SQRT_RATIO: U256 = U256::from(4295128739_u64);
    /// sqrt ratio at MAX_TICK + 1; all valid prices are strictly below it.
    pub static ref MAX_SQRT_RATIO: U256 =
        U256::from_str_radix("1461446703485210103287273052203988822378723970342", 10).unwrap();
}

/// Lowest spacing-aligned tick at which a limit order can be minted.
pub fn min_tick_lo(tick_spacing: i32) -> i32 {
    (MIN_TICK_LO / tick_spacing) * tick_spacing
}

/// Highest spacing-aligned tick at which a limit order can be minted.
pub fn max_tick_lo(tick_spacing: i32) -> i32 {
    (MAX_TICK_LO / tick_spacing) * tick_spacing
}
