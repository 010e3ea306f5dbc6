pub mod amount_delta;
pub mod constants;
pub mod decimal;
pub mod full_math;
pub mod limit_order_math;
pub mod limit_order_swap_math;
pub mod limit_order_tick_math;
pub mod liquidity_math;
pub mod safe_cast;
pub mod sqrt_price_math;
pub mod swap_math;
pub mod tick_math;
