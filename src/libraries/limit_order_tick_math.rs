use ethnum::U256;

use super::{
    constants::Q96,
    full_math::mul_div,
    tick_math::{TickMathError, get_sqrt_ratio_at_tick},
};

/// price * 2^96 at a tick, computed as sqrtPriceX96^2 / 2^96.
///
/// The sqrt price fits in 160 bits, so the rescaled square stays within 224
/// bits. Within [MIN_TICK_LO, MAX_TICK_LO] the result is strictly positive;
/// below that range it truncates to zero, which is why limit orders are
/// confined to the narrower domain.
pub fn get_price_at_tick(tick: i32) -> Result<U256, TickMathError> {
    let sqrt_price_x96 = get_sqrt_ratio_at_tick(tick)?;
    Ok(mul_div(sqrt_price_x96, sqrt_price_x96, Q96).expect("squared sqrt price fits 256 bits"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libraries::constants::{MAX_TICK_LO, MIN_TICK_LO};

    #[test]
    fn test_price_at_zero_tick_is_one() {
        assert_eq!(get_price_at_tick(0).unwrap(), Q96);
    }

    #[test]
    fn test_price_is_positive_above_the_lower_lo_bound() {
        for tick in [MIN_TICK_LO + 1, -60, 60, MAX_TICK_LO] {
            assert!(get_price_at_tick(tick).unwrap() > U256::ZERO);
        }
    }

    #[test]
    fn test_price_truncates_to_zero_at_the_lower_lo_bound() {
        // the squared price loses its last unit exactly at the bound, which
        // is why minting at a zero price is rejected separately
        assert_eq!(get_price_at_tick(MIN_TICK_LO).unwrap(), U256::ZERO);
        assert_eq!(get_price_at_tick(MIN_TICK_LO - 1).unwrap(), U256::ZERO);
        assert_eq!(get_price_at_tick(MIN_TICK_LO + 1).unwrap(), U256::ONE);
    }

    #[test]
    fn test_price_at_minus_60() {
        assert_eq!(
            get_price_at_tick(-60).unwrap(),
            U256::from(78754240422856966435523493929_u128)
        );
    }
}
