//! The pool façade: a single token pair carrying both a concentrated
//! liquidity book (range orders) and two one-directional limit-order books.

use std::collections::BTreeMap;

use ethnum::{I256, U256};
use log::debug;
use thiserror::Error;

use crate::ledger::{AccountId, Ledger, LedgerError, TokenId};
use crate::libraries::{
    amount_delta::{AmountDeltaError, get_amount_0_delta_signed, get_amount_1_delta_signed},
    constants::{MAX_TICK, MAX_TICK_LO, MIN_TICK, MIN_TICK_LO, ONE_IN_PIPS},
    liquidity_math::{self, AddDeltaError},
    limit_order_tick_math::get_price_at_tick,
    swap_math::SwapMathError,
    tick_math::{TickMathError, get_sqrt_ratio_at_tick, get_tick_at_sqrt_ratio},
};
use crate::limit_orders::{
    self, UpdateLimitTickError,
    position::{self as limit_position, LimitPositionError},
    types::{LimitPositionInfo, LimitPositionKey, LimitTickInfo},
};
use crate::range_orders::{
    self, UpdateTickError,
    types::{RangePositionInfo, RangePositionKey, RangeTickInfo},
};

pub mod swap;
pub mod types;

use types::{LimitOrderBurn, ProtocolFees, Slot0};
pub use types::SwapOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("pool is already initialized")]
    AlreadyInitialized,
    #[error("pool is not initialized")]
    NotInitialized,
    #[error("invalid pool parameters")]
    InvalidPoolParameters,
    #[error("starting price is out of bounds")]
    PriceOutOfBounds,
    #[error("token is not part of the pool")]
    TokenNotInPool,
    #[error("amount must be greater than zero")]
    ZeroAmount,
    /// 'TLM'
    #[error("tick is below the limit-order domain")]
    TickLowerMinimum,
    /// 'TUM'
    #[error("tick is above the limit-order domain")]
    TickUpperMaximum,
    #[error("invalid tick range")]
    InvalidTickRange,
    /// 'LO'
    #[error("tick liquidity cap exceeded")]
    LiquidityCapExceeded,
    /// 'NP' / POSITION_NOT_FOUND
    #[error("position not found")]
    PositionNotFound,
    /// 'LA'
    #[error("liquidity overflow")]
    LiquidityOverflow,
    /// 'LS'
    #[error("liquidity underflow")]
    LiquidityUnderflow,
    /// 'AS'
    #[error("amount specified must be non-zero")]
    AmountSpecifiedZero,
    /// 'SPL'
    #[error("sqrt price limit out of range")]
    SqrtPriceLimitOutOfRange,
    /// 'IIA'
    #[error("input amount not fully received")]
    InputAmountMismatch,
    #[error("insufficient ledger balance")]
    InsufficientBalance,
    #[error("invalid protocol fee")]
    InvalidProtocolFee,
    #[error("arithmetic overflow")]
    ArithmeticOverflow,
}

impl From<AddDeltaError> for PoolError {
    fn from(value: AddDeltaError) -> Self {
        match value {
            AddDeltaError::Overflow => PoolError::LiquidityOverflow,
            AddDeltaError::Underflow => PoolError::LiquidityUnderflow,
        }
    }
}

impl From<UpdateLimitTickError> for PoolError {
    fn from(value: UpdateLimitTickError) -> Self {
        match value {
            UpdateLimitTickError::LiquidityCapExceeded => PoolError::LiquidityCapExceeded,
            UpdateLimitTickError::AddDelta(inner) => inner.into(),
        }
    }
}

impl From<UpdateTickError> for PoolError {
    fn from(value: UpdateTickError) -> Self {
        match value {
            UpdateTickError::LiquidityCapExceeded => PoolError::LiquidityCapExceeded,
            UpdateTickError::AddDelta(inner) => inner.into(),
            UpdateTickError::LiquidityNetOverflow => PoolError::LiquidityOverflow,
        }
    }
}

impl From<LimitPositionError> for PoolError {
    fn from(_: LimitPositionError) -> Self {
        PoolError::PositionNotFound
    }
}

impl From<TickMathError> for PoolError {
    fn from(_: TickMathError) -> Self {
        PoolError::ArithmeticOverflow
    }
}

impl From<SwapMathError> for PoolError {
    fn from(_: SwapMathError) -> Self {
        PoolError::ArithmeticOverflow
    }
}

impl From<AmountDeltaError> for PoolError {
    fn from(_: AmountDeltaError) -> Self {
        PoolError::ArithmeticOverflow
    }
}

impl From<LedgerError> for PoolError {
    fn from(_: LedgerError) -> Self {
        PoolError::InsufficientBalance
    }
}

#[derive(Debug, Clone)]
pub struct Pool {
    pub(crate) token0: TokenId,
    pub(crate) token1: TokenId,
    pub(crate) fee_pips: u32,
    pub(crate) tick_spacing: i32,
    pub(crate) max_liquidity_per_tick: u128,
    /// The pool's own ledger account.
    pub(crate) account: AccountId,
    pub(crate) slot0: Option<Slot0>,
    pub(crate) fee_growth_global_0_x128: U256,
    pub(crate) fee_growth_global_1_x128: U256,
    pub(crate) protocol_fees: ProtocolFees,
    /// Range-order liquidity currently in range.
    pub(crate) liquidity: u128,
    pub(crate) ticks: BTreeMap<i32, RangeTickInfo>,
    pub(crate) range_positions: BTreeMap<RangePositionKey, RangePositionInfo>,
    /// Limit-order book per supplied token.
    pub(crate) ticks_limit_tokens0: BTreeMap<i32, LimitTickInfo>,
    pub(crate) ticks_limit_tokens1: BTreeMap<i32, LimitTickInfo>,
    pub(crate) limit_orders: BTreeMap<LimitPositionKey, LimitPositionInfo>,
}

impl Pool {
    pub fn new(
        token0: TokenId,
        token1: TokenId,
        fee_pips: u32,
        tick_spacing: i32,
        account: AccountId,
    ) -> Result<Self, PoolError> {
        if token0 == token1 || tick_spacing <= 0 || fee_pips >= ONE_IN_PIPS {
            return Err(PoolError::InvalidPoolParameters);
        }
        Ok(Pool {
            token0,
            token1,
            fee_pips,
            tick_spacing,
            max_liquidity_per_tick: range_orders::tick_spacing_to_max_liquidity_per_tick(
                tick_spacing,
            ),
            account,
            slot0: None,
            fee_growth_global_0_x128: U256::ZERO,
            fee_growth_global_1_x128: U256::ZERO,
            protocol_fees: ProtocolFees::default(),
            liquidity: 0,
            ticks: BTreeMap::new(),
            range_positions: BTreeMap::new(),
            ticks_limit_tokens0: BTreeMap::new(),
            ticks_limit_tokens1: BTreeMap::new(),
            limit_orders: BTreeMap::new(),
        })
    }

    /// Sets the starting price; can only be called once.
    pub fn initialize(&mut self, sqrt_price_x96: U256) -> Result<(), PoolError> {
        if self.slot0.is_some() {
            return Err(PoolError::AlreadyInitialized);
        }
        let tick =
            get_tick_at_sqrt_ratio(sqrt_price_x96).map_err(|_| PoolError::PriceOutOfBounds)?;
        debug!("pool initialized at sqrt price {sqrt_price_x96} (tick {tick})");
        self.slot0 = Some(Slot0 {
            sqrt_price_x96,
            tick,
            fee_protocol: 0,
        });
        Ok(())
    }

    pub fn token0(&self) -> TokenId {
        self.token0
    }

    pub fn token1(&self) -> TokenId {
        self.token1
    }

    pub fn fee_pips(&self) -> u32 {
        self.fee_pips
    }

    pub fn tick_spacing(&self) -> i32 {
        self.tick_spacing
    }

    pub fn max_liquidity_per_tick(&self) -> u128 {
        self.max_liquidity_per_tick
    }

    pub fn account(&self) -> AccountId {
        self.account
    }

    pub fn slot0(&self) -> Option<&Slot0> {
        self.slot0.as_ref()
    }

    pub fn liquidity(&self) -> u128 {
        self.liquidity
    }

    pub fn protocol_fees(&self) -> ProtocolFees {
        self.protocol_fees
    }

    pub fn fee_growth_global_0_x128(&self) -> U256 {
        self.fee_growth_global_0_x128
    }

    pub fn fee_growth_global_1_x128(&self) -> U256 {
        self.fee_growth_global_1_x128
    }

    /// The limit-order tick book for the given supplied token.
    pub fn limit_tick(&self, token: TokenId, tick: i32) -> Option<&LimitTickInfo> {
        let book = if token == self.token0 {
            &self.ticks_limit_tokens0
        } else {
            &self.ticks_limit_tokens1
        };
        book.get(&tick)
    }

    pub fn limit_position(
        &self,
        owner: AccountId,
        token: TokenId,
        tick: i32,
    ) -> Option<&LimitPositionInfo> {
        self.limit_orders.get(&LimitPositionKey {
            owner,
            tick,
            is_token0: token == self.token0,
        })
    }

    pub fn range_position(
        &self,
        owner: AccountId,
        tick_lower: i32,
        tick_upper: i32,
    ) -> Option<&RangePositionInfo> {
        self.range_positions.get(&RangePositionKey {
            owner,
            tick_lower,
            tick_upper,
        })
    }

    fn slot0_checked(&self) -> Result<&Slot0, PoolError> {
        self.slot0.as_ref().ok_or(PoolError::NotInitialized)
    }

    fn is_token0(&self, token: TokenId) -> Result<bool, PoolError> {
        if token == self.token0 {
            Ok(true)
        } else if token == self.token1 {
            Ok(false)
        } else {
            Err(PoolError::TokenNotInPool)
        }
    }

    /// Each denominator is 0 (off) or within [4, 10]: the protocol takes at
    /// most a quarter and at least a tenth of the swap fee.
    pub fn set_fee_protocol(
        &mut self,
        fee_protocol0: u8,
        fee_protocol1: u8,
    ) -> Result<(), PoolError> {
        for fee_protocol in [fee_protocol0, fee_protocol1] {
            if fee_protocol != 0 && !(4..=10).contains(&fee_protocol) {
                return Err(PoolError::InvalidProtocolFee);
            }
        }
        let slot0 = self.slot0.as_mut().ok_or(PoolError::NotInitialized)?;
        slot0.fee_protocol = fee_protocol0 | (fee_protocol1 << 4);
        Ok(())
    }

    pub fn collect_protocol(
        &mut self,
        ledger: &mut Ledger,
        recipient: AccountId,
        amount0_requested: u128,
        amount1_requested: u128,
    ) -> Result<(u128, u128), PoolError> {
        let amount0 = amount0_requested.min(self.protocol_fees.token0);
        let amount1 = amount1_requested.min(self.protocol_fees.token1);
        self.protocol_fees.token0 -= amount0;
        self.protocol_fees.token1 -= amount1;
        ledger
            .transfer(self.account, recipient, self.token0, U256::from(amount0))
            .expect("pool balance covers accrued protocol fees");
        ledger
            .transfer(self.account, recipient, self.token1, U256::from(amount1))
            .expect("pool balance covers accrued protocol fees");
        Ok((amount0, amount1))
    }

    // ------------------------------------------------------------------
    // limit orders
    // ------------------------------------------------------------------

    fn check_limit_tick(tick: i32) -> Result<(), PoolError> {
        if tick < MIN_TICK_LO {
            return Err(PoolError::TickLowerMinimum);
        }
        if tick > MAX_TICK_LO {
            return Err(PoolError::TickUpperMaximum);
        }
        Ok(())
    }

    /// Mints a one-directional limit order of `amount` input tokens at
    /// `tick`, pulling the tokens from `owner`. Returns the amount pulled.
    pub fn mint_limit_order(
        &mut self,
        ledger: &mut Ledger,
        token: TokenId,
        owner: AccountId,
        tick: i32,
        amount: u128,
    ) -> Result<U256, PoolError> {
        self.slot0_checked()?;
        self.is_token0(token)?;
        if amount == 0 {
            return Err(PoolError::ZeroAmount);
        }
        let liquidity_delta = i128::try_from(amount).map_err(|_| PoolError::LiquidityOverflow)?;
        Self::check_limit_tick(tick)?;
        // a zero price cannot convert back on burn
        if get_price_at_tick(tick)? == U256::ZERO {
            return Err(PoolError::TickLowerMinimum);
        }

        let amount_in = U256::from(amount);
        if ledger.balance_of(owner, token) < amount_in {
            return Err(PoolError::InsufficientBalance);
        }

        let (liquidity_left_delta, liquidity_swapped_delta) =
            self.update_limit_order_position(token, owner, tick, liquidity_delta)?;
        debug_assert!(liquidity_left_delta == I256::from(amount));
        debug_assert!(liquidity_swapped_delta == I256::ZERO);

        ledger
            .transfer(owner, self.account, token, amount_in)
            .expect("owner balance was checked before minting");
        debug!(
            "minted limit order: owner {owner:?} token {token:?} tick {tick} amount {amount}"
        );
        Ok(amount_in)
    }

    /// Burns `amount` of an existing limit order. Only reachable while the
    /// tick is not fully swapped; a fully swapped tick burns its positions
    /// automatically at the end of the swap. If the position ends up empty
    /// the accrued balances are collected and paid out as well.
    pub fn burn_limit_order(
        &mut self,
        ledger: &mut Ledger,
        token: TokenId,
        owner: AccountId,
        tick: i32,
        amount: u128,
    ) -> Result<LimitOrderBurn, PoolError> {
        self.slot0_checked()?;
        let is_token0 = self.is_token0(token)?;
        let key = LimitPositionKey {
            owner,
            tick,
            is_token0,
        };
        limit_position::ensure_exists(&self.limit_orders, &key)?;
        // reject over-burns up front so no partial tick update can happen
        let position_liquidity = self.limit_orders[&key].liquidity;
        if position_liquidity < amount {
            return Err(PoolError::LiquidityUnderflow);
        }
        let liquidity_delta = -i128::try_from(amount).map_err(|_| PoolError::LiquidityOverflow)?;

        let (liquidity_left_delta, liquidity_swapped_delta) =
            self.update_limit_order_position(token, owner, tick, liquidity_delta)?;
        if amount == 0 {
            debug_assert!(liquidity_left_delta == I256::ZERO);
            debug_assert!(liquidity_swapped_delta == I256::ZERO);
        }

        // amounts in token0/token1 order
        let (mut amount_burnt0, mut amount_burnt1) = if is_token0 {
            (
                liquidity_left_delta.abs().as_u128(),
                liquidity_swapped_delta.abs().as_u128(),
            )
        } else {
            (
                liquidity_swapped_delta.abs().as_u128(),
                liquidity_left_delta.abs().as_u128(),
            )
        };

        // a fully burnt position is collected (and removed) right away
        if self.limit_orders[&key].liquidity == 0 {
            let (collected0, collected1) =
                self.collect_limit_order(ledger, owner, token, tick, u128::MAX, u128::MAX)?;
            amount_burnt0 = collected0;
            amount_burnt1 = collected1;
        }

        debug!("burnt limit order: owner {owner:?} token {token:?} tick {tick} amount {amount}");
        Ok(LimitOrderBurn {
            owner,
            tick,
            amount,
            amount_burnt0,
            amount_burnt1,
        })
    }

    /// Pays out up to the requested amounts of the position's accrued
    /// balances and removes the position once it is empty.
    pub fn collect_limit_order(
        &mut self,
        ledger: &mut Ledger,
        owner: AccountId,
        token: TokenId,
        tick: i32,
        amount0_requested: u128,
        amount1_requested: u128,
    ) -> Result<(u128, u128), PoolError> {
        let is_token0 = self.is_token0(token)?;
        let key = LimitPositionKey {
            owner,
            tick,
            is_token0,
        };
        limit_position::ensure_exists(&self.limit_orders, &key)?;
        let position = self
            .limit_orders
            .get_mut(&key)
            .expect("existence checked above");

        let amount0 = amount0_requested.min(position.tokens_owed0);
        let amount1 = amount1_requested.min(position.tokens_owed1);
        position.tokens_owed0 -= amount0;
        position.tokens_owed1 -= amount1;
        let position_empty = position.liquidity == 0;

        ledger
            .transfer(self.account, owner, self.token0, U256::from(amount0))
            .expect("pool balance covers collected token0");
        ledger
            .transfer(self.account, owner, self.token1, U256::from(amount1))
            .expect("pool balance covers collected token1");

        if position_empty {
            self.limit_orders.remove(&key);
        }
        Ok((amount0, amount1))
    }

    /// Shared mint/burn path: updates the tick book and the position, then
    /// reclaims whatever became empty.
    fn update_limit_order_position(
        &mut self,
        token: TokenId,
        owner: AccountId,
        tick: i32,
        liquidity_delta: i128,
    ) -> Result<(I256, I256), PoolError> {
        Self::check_limit_tick(tick)?;
        let is_token0 = self.is_token0(token)?;
        let key = LimitPositionKey {
            owner,
            tick,
            is_token0,
        };
        let created = !self.limit_orders.contains_key(&key);
        if created {
            debug_assert!(liquidity_delta > 0, "only mints create positions");
        }

        let max_liquidity_per_tick = self.max_liquidity_per_tick;
        let book = if is_token0 {
            &mut self.ticks_limit_tokens0
        } else {
            &mut self.ticks_limit_tokens1
        };

        let mut flipped = false;
        if liquidity_delta != 0 {
            flipped = limit_orders::update(
                book,
                tick,
                liquidity_delta,
                max_liquidity_per_tick,
                created,
                owner,
            )?;
        }

        let (one_minus_perc_swap, fee_growth_inside_x128) = {
            let info = book.get(&tick).expect("tick backs a live position");
            (
                info.one_minus_perc_swap.clone(),
                info.fee_growth_inside_x128,
            )
        };
        let price_x96 = get_price_at_tick(tick)?;

        let (position, created_now) = limit_position::get_or_create(&mut self.limit_orders, &key);
        debug_assert!(created_now == created);
        let (liquidity_left_delta, liquidity_swapped_delta) = limit_position::update(
            position,
            liquidity_delta,
            &one_minus_perc_swap,
            is_token0,
            price_x96,
            fee_growth_inside_x128,
            created,
        );
        let position_liquidity = position.liquidity;

        if flipped {
            assert!(
                tick % self.tick_spacing == 0,
                "flipped tick violates the tick spacing"
            );
        }

        // reclaim tick state that is no longer backing anything
        if liquidity_delta < 0 {
            let book = if is_token0 {
                &mut self.ticks_limit_tokens0
            } else {
                &mut self.ticks_limit_tokens1
            };
            if flipped {
                book.remove(&tick);
            } else if position_liquidity == 0 {
                let info = book.get_mut(&tick).expect("tick backs a live position");
                let index = info
                    .owners
                    .iter()
                    .position(|entry| *entry == owner)
                    .expect("burnt owner is present in the roster");
                info.owners.remove(index);
            }
        }

        Ok((liquidity_left_delta, liquidity_swapped_delta))
    }

    // ------------------------------------------------------------------
    // range orders
    // ------------------------------------------------------------------

    fn check_range_ticks(&self, tick_lower: i32, tick_upper: i32) -> Result<(), PoolError> {
        if tick_lower >= tick_upper || tick_lower < MIN_TICK || tick_upper > MAX_TICK {
            return Err(PoolError::InvalidTickRange);
        }
        Ok(())
    }

    /// Token amounts corresponding to a liquidity delta over a range at the
    /// current price; positive amounts are owed to the pool.
    fn range_order_amounts(
        &self,
        tick_lower: i32,
        tick_upper: i32,
        liquidity_delta: i128,
    ) -> Result<(I256, I256), PoolError> {
        let slot0 = self.slot0_checked()?;
        let sqrt_lower = get_sqrt_ratio_at_tick(tick_lower)?;
        let sqrt_upper = get_sqrt_ratio_at_tick(tick_upper)?;
        if slot0.tick < tick_lower {
            // price below the range: the position is entirely token0
            Ok((
                get_amount_0_delta_signed(sqrt_lower, sqrt_upper, liquidity_delta)?,
                I256::ZERO,
            ))
        } else if slot0.tick < tick_upper {
            Ok((
                get_amount_0_delta_signed(slot0.sqrt_price_x96, sqrt_upper, liquidity_delta)?,
                get_amount_1_delta_signed(sqrt_lower, slot0.sqrt_price_x96, liquidity_delta)?,
            ))
        } else {
            Ok((
                I256::ZERO,
                get_amount_1_delta_signed(sqrt_lower, sqrt_upper, liquidity_delta)?,
            ))
        }
    }

    /// Mints range-order liquidity over `[tick_lower, tick_upper)`, pulling
    /// the owed token amounts from `owner`. Returns `(amount0, amount1)`.
    pub fn mint_range_order(
        &mut self,
        ledger: &mut Ledger,
        owner: AccountId,
        tick_lower: i32,
        tick_upper: i32,
        amount: u128,
    ) -> Result<(U256, U256), PoolError> {
        if amount == 0 {
            return Err(PoolError::ZeroAmount);
        }
        let liquidity_delta = i128::try_from(amount).map_err(|_| PoolError::LiquidityOverflow)?;
        self.check_range_ticks(tick_lower, tick_upper)?;

        // everything the mint needs is validated (funding included) before
        // any state is written
        let (amount0, amount1) =
            self.range_order_amounts(tick_lower, tick_upper, liquidity_delta)?;
        debug_assert!(amount0 >= I256::ZERO && amount1 >= I256::ZERO);
        let amount0 = amount0.as_u256();
        let amount1 = amount1.as_u256();
        if ledger.balance_of(owner, self.token0) < amount0
            || ledger.balance_of(owner, self.token1) < amount1
        {
            return Err(PoolError::InsufficientBalance);
        }

        self.modify_range_position(owner, tick_lower, tick_upper, liquidity_delta)?;

        ledger
            .transfer(owner, self.account, self.token0, amount0)
            .expect("owner balance was checked before minting");
        ledger
            .transfer(owner, self.account, self.token1, amount1)
            .expect("owner balance was checked before minting");
        debug!(
            "minted range order: owner {owner:?} range [{tick_lower}, {tick_upper}) amount {amount}"
        );
        Ok((amount0, amount1))
    }

    /// Burns range-order liquidity; the freed token amounts accrue to the
    /// position's owed balances for a later collect. `amount == 0` pokes
    /// the position to update its fee accounting.
    pub fn burn_range_order(
        &mut self,
        owner: AccountId,
        tick_lower: i32,
        tick_upper: i32,
        amount: u128,
    ) -> Result<(u128, u128), PoolError> {
        self.check_range_ticks(tick_lower, tick_upper)?;
        let liquidity_delta = i128::try_from(amount).map_err(|_| PoolError::LiquidityOverflow)?;

        let (amount0, amount1) =
            self.modify_range_position(owner, tick_lower, tick_upper, -liquidity_delta)?;
        debug_assert!(amount0 <= I256::ZERO && amount1 <= I256::ZERO);
        let burnt0 = (-amount0).as_u128();
        let burnt1 = (-amount1).as_u128();

        if burnt0 > 0 || burnt1 > 0 {
            let position = self
                .range_positions
                .get_mut(&RangePositionKey {
                    owner,
                    tick_lower,
                    tick_upper,
                })
                .expect("position existence was checked by the burn");
            position.tokens_owed0 = position.tokens_owed0.wrapping_add(burnt0);
            position.tokens_owed1 = position.tokens_owed1.wrapping_add(burnt1);
        }
        Ok((burnt0, burnt1))
    }

    pub fn collect_range_order(
        &mut self,
        ledger: &mut Ledger,
        owner: AccountId,
        tick_lower: i32,
        tick_upper: i32,
        amount0_requested: u128,
        amount1_requested: u128,
    ) -> Result<(u128, u128), PoolError> {
        let key = RangePositionKey {
            owner,
            tick_lower,
            tick_upper,
        };
        let position = self
            .range_positions
            .get_mut(&key)
            .ok_or(PoolError::PositionNotFound)?;

        let amount0 = amount0_requested.min(position.tokens_owed0);
        let amount1 = amount1_requested.min(position.tokens_owed1);
        position.tokens_owed0 -= amount0;
        position.tokens_owed1 -= amount1;
        let remove = position.liquidity == 0
            && position.tokens_owed0 == 0
            && position.tokens_owed1 == 0;

        ledger
            .transfer(self.account, owner, self.token0, U256::from(amount0))
            .expect("pool balance covers collected token0");
        ledger
            .transfer(self.account, owner, self.token1, U256::from(amount1))
            .expect("pool balance covers collected token1");

        if remove {
            self.range_positions.remove(&key);
        }
        Ok((amount0, amount1))
    }

    fn modify_range_position(
        &mut self,
        owner: AccountId,
        tick_lower: i32,
        tick_upper: i32,
        liquidity_delta: i128,
    ) -> Result<(I256, I256), PoolError> {
        let slot0 = self.slot0_checked()?.clone();
        let key = RangePositionKey {
            owner,
            tick_lower,
            tick_upper,
        };

        // pre-validate burns and pokes so the tick updates below cannot
        // fail halfway through
        if liquidity_delta <= 0 {
            let position = self
                .range_positions
                .get(&key)
                .ok_or(PoolError::PositionNotFound)?;
            if liquidity_delta == 0 && position.liquidity == 0 {
                return Err(PoolError::PositionNotFound);
            }
            if position.liquidity < liquidity_delta.unsigned_abs() {
                return Err(PoolError::LiquidityUnderflow);
            }
        } else {
            for tick in [tick_lower, tick_upper] {
                let liquidity_gross = self
                    .ticks
                    .get(&tick)
                    .map(|info| info.liquidity_gross)
                    .unwrap_or(0);
                let after = liquidity_math::add_delta(liquidity_gross, liquidity_delta)?;
                if after > self.max_liquidity_per_tick {
                    return Err(PoolError::LiquidityCapExceeded);
                }
            }
        }

        let mut flipped_lower = false;
        let mut flipped_upper = false;
        if liquidity_delta != 0 {
            flipped_lower = range_orders::update_tick(
                &mut self.ticks,
                tick_lower,
                slot0.tick,
                liquidity_delta,
                self.fee_growth_global_0_x128,
                self.fee_growth_global_1_x128,
                false,
                self.max_liquidity_per_tick,
            )?;
            flipped_upper = range_orders::update_tick(
                &mut self.ticks,
                tick_upper,
                slot0.tick,
                liquidity_delta,
                self.fee_growth_global_0_x128,
                self.fee_growth_global_1_x128,
                true,
                self.max_liquidity_per_tick,
            )?;
            if flipped_lower {
                assert!(
                    tick_lower % self.tick_spacing == 0,
                    "flipped tick violates the tick spacing"
                );
            }
            if flipped_upper {
                assert!(
                    tick_upper % self.tick_spacing == 0,
                    "flipped tick violates the tick spacing"
                );
            }
        }

        let lower_info = self.ticks.get(&tick_lower).cloned().unwrap_or_default();
        let upper_info = self.ticks.get(&tick_upper).cloned().unwrap_or_default();
        let (fee_growth_inside_0, fee_growth_inside_1) = range_orders::get_fee_growth_inside(
            &lower_info,
            &upper_info,
            tick_lower,
            tick_upper,
            slot0.tick,
            self.fee_growth_global_0_x128,
            self.fee_growth_global_1_x128,
        );

        let position = self.range_positions.entry(key).or_default();
        range_orders::update_position(
            position,
            liquidity_delta,
            fee_growth_inside_0,
            fee_growth_inside_1,
        )?;

        if liquidity_delta < 0 {
            if flipped_lower {
                self.ticks.remove(&tick_lower);
            }
            if flipped_upper {
                self.ticks.remove(&tick_upper);
            }
        }

        let amounts = self.range_order_amounts(tick_lower, tick_upper, liquidity_delta)?;
        if slot0.tick >= tick_lower && slot0.tick < tick_upper {
            self.liquidity = liquidity_math::add_delta(self.liquidity, liquidity_delta)?;
        }
        Ok(amounts)
    }
}
