use ethnum::{I256, U256};
use lazy_static::lazy_static;

use super::constants::{MAX_SQRT_RATIO, MAX_TICK, MIN_SQRT_RATIO, MIN_TICK, Q128};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickMathError {
    TickOutOfBounds,
    SqrtPriceOutOfBounds,
}

lazy_static! {
    /// sqrt(1.0001)^(-2^k) in Q128 for k = 1..=19; bit 0 is handled inline.
    static ref STEP_RATIOS: [U256; 19] = [
        U256::from_str_radix("fff97272373d413259a46990580e213a", 16).unwrap(),
        U256::from_str_radix("fff2e50f5f656932ef12357cf3c7fdcc", 16).unwrap(),
        U256::from_str_radix("ffe5caca7e10e4e61c3624eaa0941cd0", 16).unwrap(),
        U256::from_str_radix("ffcb9843d60f6159c9db58835c926644", 16).unwrap(),
        U256::from_str_radix("ff973b41fa98c081472e6896dfb254c0", 16).unwrap(),
        U256::from_str_radix("ff2ea16466c96a3843ec78b326b52861", 16).unwrap(),
        U256::from_str_radix("fe5dee046a99a2a811c461f1969c3053", 16).unwrap(),
        U256::from_str_radix("fcbe86c7900a88aedcffc83b479aa3a4", 16).unwrap(),
        U256::from_str_radix("f987a7253ac413176f2b074cf7815e54", 16).unwrap(),
        U256::from_str_radix("f3392b0822b70005940c7a398e4b70f3", 16).unwrap(),
        U256::from_str_radix("e7159475a2c29b7443b29c7fa6e889d9", 16).unwrap(),
        U256::from_str_radix("d097f3bdfd2022b8845ad8f792aa5825", 16).unwrap(),
        U256::from_str_radix("a9f746462d870fdf8a65dc1f90e061e5", 16).unwrap(),
        U256::from_str_radix("70d869a156d2a1b890bb3df62baf32f7", 16).unwrap(),
        U256::from_str_radix("31be135f97d08fd981231505542fcfa6", 16).unwrap(),
        U256::from_str_radix("9aa508b5b7a84e1c677de54f3e99bc9", 16).unwrap(),
        U256::from_str_radix("5d6af8dedb81196699c329225ee604", 16).unwrap(),
        U256::from_str_radix("2216e584f5fa1ea926041bedfe98", 16).unwrap(),
        U256::from_str_radix("48a170391f7dc42444e8fa2", 16).unwrap(),
    ];
    static ref STEP_RATIO_TICK_1: U256 =
        U256::from_str_radix("fffcb933bd6fad37aa2d162d1a594001", 16).unwrap();
    static ref LOG_SQRT_10001_COEFF: I256 =
        I256::from_str_radix("255738958999603826347141", 10).unwrap();
    static ref TICK_LOW_OFFSET: I256 =
        I256::from_str_radix("3402992956809132418596140100660247210", 10).unwrap();
    static ref TICK_HIGH_OFFSET: I256 =
        I256::from_str_radix("291339464771989622907027621153398088495", 10).unwrap();
}

/// sqrt(1.0001^tick) * 2^96 as a Q64.96 number.
pub fn get_sqrt_ratio_at_tick(tick: i32) -> Result<U256, TickMathError> {
    if !(MIN_TICK..=MAX_TICK).contains(&tick) {
        return Err(TickMathError::TickOutOfBounds);
    }

    let abs_tick = tick.unsigned_abs();
    let mut ratio = if abs_tick & 1 != 0 {
        *STEP_RATIO_TICK_1
    } else {
        Q128
    };
    for (i, step) in STEP_RATIOS.iter().enumerate() {
        if abs_tick & (1 << (i + 1)) != 0 {
            ratio = (ratio * step) >> 128;
        }
    }
    if tick > 0 {
        ratio = U256::MAX / ratio;
    }

    // Q128 -> Q96, rounding up so getTickAtSqrtRatio round-trips.
    let round_up = ratio % (U256::ONE << 32) != U256::ZERO;
    Ok((ratio >> 32) + if round_up { U256::ONE } else { U256::ZERO })
}

/// The greatest tick whose sqrt ratio is <= the given sqrt price.
pub fn get_tick_at_sqrt_ratio(sqrt_price_x96: U256) -> Result<i32, TickMathError> {
    if sqrt_price_x96 < *MIN_SQRT_RATIO || sqrt_price_x96 >= *MAX_SQRT_RATIO {
        return Err(TickMathError::SqrtPriceOutOfBounds);
    }

    let ratio: U256 = sqrt_price_x96 << 32;
    let msb = 255 - ratio.leading_zeros();

    // Normalize into [2^127, 2^128) and extract 14 fractional bits of log2.
    let mut r = if msb >= 128 {
        ratio >> (msb - 127)
    } else {
        ratio << (127 - msb)
    };
    let mut log_2 = I256::from(msb as i32 - 128) << 64;
    for shift in (50..=63).rev() {
        r = (r * r) >> 127;
        if r >> 128 != U256::ZERO {
            log_2 |= I256::ONE << shift;
            r >>= 1;
        }
    }

    let log_sqrt10001: I256 = log_2 * *LOG_SQRT_10001_COEFF;
    let tick_low_shifted: I256 = (log_sqrt10001 - *TICK_LOW_OFFSET) >> 128;
    let tick_high_shifted: I256 = (log_sqrt10001 + *TICK_HIGH_OFFSET) >> 128;
    let tick_low = tick_low_shifted.as_i32();
    let tick_high = tick_high_shifted.as_i32();

    if tick_low == tick_high {
        Ok(tick_low)
    } else if get_sqrt_ratio_at_tick(tick_high)? <= sqrt_price_x96 {
        Ok(tick_high)
    } else {
        Ok(tick_low)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libraries::constants::Q96;

    #[test]
    fn test_out_of_bounds_ticks_rejected() {
        assert_eq!(
            get_sqrt_ratio_at_tick(MIN_TICK - 1),
            Err(TickMathError::TickOutOfBounds)
        );
        assert_eq!(
            get_sqrt_ratio_at_tick(MAX_TICK + 1),
            Err(TickMathError::TickOutOfBounds)
        );
    }

    #[test]
    fn test_bounds_match_ratio_constants() {
        assert_eq!(get_sqrt_ratio_at_tick(MIN_TICK).unwrap(), *MIN_SQRT_RATIO);
        assert_eq!(get_sqrt_ratio_at_tick(MAX_TICK).unwrap(), *MAX_SQRT_RATIO);
    }

    #[test]
    fn test_known_ratios() {
        assert_eq!(get_sqrt_ratio_at_tick(0).unwrap(), Q96);
        // sqrt(1.0001) * 2^96, from the reference implementation
        assert_eq!(
            get_sqrt_ratio_at_tick(1).unwrap(),
            U256::from(79232123823359799118286999568_u128)
        );
        assert_eq!(
            get_sqrt_ratio_at_tick(-1).unwrap(),
            U256::from(79224201403219477170569942574_u128)
        );
    }

    #[test]
    fn test_out_of_bounds_prices_rejected() {
        assert_eq!(
            get_tick_at_sqrt_ratio(*MIN_SQRT_RATIO - U256::ONE),
            Err(TickMathError::SqrtPriceOutOfBounds)
        );
        assert_eq!(
            get_tick_at_sqrt_ratio(*MAX_SQRT_RATIO),
            Err(TickMathError::SqrtPriceOutOfBounds)
        );
    }

    #[test]
    fn test_tick_at_ratio_round_trips() {
        for tick in [
            MIN_TICK,
            -665455,
            -23028,
            -60,
            -1,
            0,
            1,
            60,
            23028,
            665455,
            MAX_TICK - 1,
        ] {
            let ratio = get_sqrt_ratio_at_tick(tick).unwrap();
            assert_eq!(get_tick_at_sqrt_ratio(ratio).unwrap(), tick, "tick {tick}");
        }
    }

    #[test]
    fn test_tick_at_ratio_is_greatest_lower_bound() {
        for tick in [-120, -60, 0, 60, 120] {
            let ratio = get_sqrt_ratio_at_tick(tick).unwrap();
            assert_eq!(get_tick_at_sqrt_ratio(ratio - U256::ONE).unwrap(), tick - 1);
            assert_eq!(get_tick_at_sqrt_ratio(ratio + U256::ONE).unwrap(), tick);
        }
    }
}
