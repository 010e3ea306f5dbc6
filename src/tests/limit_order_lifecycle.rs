use ethnum::U256;

use super::*;
use crate::libraries::constants::{MAX_TICK_LO, MIN_TICK_LO};
use crate::libraries::decimal::Decimal;
use crate::pool::PoolError;

#[test]
fn test_mint_creates_tick_and_position() {
    let (mut pool, mut ledger) = medium_pool_at_one();
    fund(&mut ledger, LP, TOKEN0, ONE_ETHER);

    let amount_in = pool
        .mint_limit_order(&mut ledger, TOKEN0, LP, -60, ONE_ETHER)
        .unwrap();
    assert_eq!(amount_in, U256::from(ONE_ETHER));
    assert_eq!(ledger.balance_of(LP, TOKEN0), U256::ZERO);
    assert_eq!(ledger.balance_of(POOL_ACCOUNT, TOKEN0), U256::from(ONE_ETHER));

    let tick = pool.limit_tick(TOKEN0, -60).unwrap();
    assert_eq!(tick.liquidity_gross, ONE_ETHER);
    assert_eq!(tick.one_minus_perc_swap, Decimal::one());
    assert_eq!(tick.owners, vec![LP]);
    assert_eq!(tick.liquidity_left(), ONE_ETHER);

    let position = pool.limit_position(LP, TOKEN0, -60).unwrap();
    assert_eq!(position.liquidity, ONE_ETHER);
    assert_eq!(position.one_minus_perc_swap_mint, Decimal::one());
    assert_eq!(position.tokens_owed0, 0);
    assert_eq!(position.tokens_owed1, 0);
}

#[test]
fn test_mint_validation() {
    let (mut pool, mut ledger) = medium_pool_at_one();
    fund(&mut ledger, LP, TOKEN0, ONE_ETHER);

    assert_eq!(
        pool.mint_limit_order(&mut ledger, TOKEN0, LP, -60, 0),
        Err(PoolError::ZeroAmount)
    );
    assert_eq!(
        pool.mint_limit_order(&mut ledger, TokenId(9), LP, -60, 1),
        Err(PoolError::TokenNotInPool)
    );
    assert_eq!(
        pool.mint_limit_order(&mut ledger, TOKEN0, LP, MIN_TICK_LO - 60, 1),
        Err(PoolError::TickLowerMinimum)
    );
    assert_eq!(
        pool.mint_limit_order(&mut ledger, TOKEN0, LP, MAX_TICK_LO + 60, 1),
        Err(PoolError::TickUpperMaximum)
    );
    // the lower bound itself has a zero price and cannot be minted either
    assert_eq!(
        pool.mint_limit_order(&mut ledger, TOKEN0, LP, MIN_TICK_LO, 1),
        Err(PoolError::TickLowerMinimum)
    );
}

#[test]
fn test_mint_requires_initialized_pool() {
    let (mut pool, mut ledger) = medium_pool();
    fund(&mut ledger, LP, TOKEN0, ONE_ETHER);
    assert_eq!(
        pool.mint_limit_order(&mut ledger, TOKEN0, LP, -60, 1),
        Err(PoolError::NotInitialized)
    );
}

#[test]
fn test_underfunded_mint_leaves_no_state_behind() {
    let (mut pool, mut ledger) = medium_pool_at_one();
    fund(&mut ledger, LP, TOKEN0, ONE_ETHER - 1);
    assert_eq!(
        pool.mint_limit_order(&mut ledger, TOKEN0, LP, -60, ONE_ETHER),
        Err(PoolError::InsufficientBalance)
    );
    assert!(pool.limit_tick(TOKEN0, -60).is_none());
    assert!(pool.limit_position(LP, TOKEN0, -60).is_none());
    assert_eq!(ledger.balance_of(LP, TOKEN0), U256::from(ONE_ETHER - 1));
}

#[test]
fn test_tick_liquidity_cap() {
    let (mut pool, mut ledger) = medium_pool_at_one();
    let cap = pool.max_liquidity_per_tick();
    fund(&mut ledger, LP, TOKEN0, cap);
    fund(&mut ledger, LP2, TOKEN0, 1);

    pool.mint_limit_order(&mut ledger, TOKEN0, LP, -60, cap).unwrap();
    assert_eq!(
        pool.mint_limit_order(&mut ledger, TOKEN0, LP2, -60, 1),
        Err(PoolError::LiquidityCapExceeded)
    );
    // the failed mint must not have touched the roster
    assert_eq!(pool.limit_tick(TOKEN0, -60).unwrap().owners, vec![LP]);
}

#[test]
#[should_panic(expected = "flipped tick violates the tick spacing")]
fn test_mint_at_unaligned_tick_panics() {
    let (mut pool, mut ledger) = medium_pool_at_one();
    fund(&mut ledger, LP, TOKEN0, ONE_ETHER);
    let _ = pool.mint_limit_order(&mut ledger, TOKEN0, LP, -61, ONE_ETHER);
}

#[test]
fn test_full_burn_of_untouched_position_refunds_and_clears() {
    let (mut pool, mut ledger) = medium_pool_at_one();
    mint_funded_limit_order(&mut pool, &mut ledger, TOKEN0, LP, -60, ONE_ETHER);

    let burn = pool
        .burn_limit_order(&mut ledger, TOKEN0, LP, -60, ONE_ETHER)
        .unwrap();
    assert_eq!(burn.amount, ONE_ETHER);
    // untouched position: everything comes back on the supplied side
    assert_eq!(burn.amount_burnt0, ONE_ETHER);
    assert_eq!(burn.amount_burnt1, 0);
    assert_eq!(ledger.balance_of(LP, TOKEN0), U256::from(ONE_ETHER));

    // flip cleared the tick, collect removed the position
    assert!(pool.limit_tick(TOKEN0, -60).is_none());
    assert!(pool.limit_position(LP, TOKEN0, -60).is_none());
}

#[test]
fn test_partial_burn_keeps_position_and_tick() {
    let (mut pool, mut ledger) = medium_pool_at_one();
    mint_funded_limit_order(&mut pool, &mut ledger, TOKEN0, LP, -60, ONE_ETHER);

    let burn = pool
        .burn_limit_order(&mut ledger, TOKEN0, LP, -60, ONE_ETHER / 4)
        .unwrap();
    assert_eq!(burn.amount_burnt0, ONE_ETHER / 4);
    assert_eq!(burn.amount_burnt1, 0);

    let position = pool.limit_position(LP, TOKEN0, -60).unwrap();
    assert_eq!(position.liquidity, ONE_ETHER - ONE_ETHER / 4);
    // a partial burn credits the owed slot without paying out
    assert_eq!(position.tokens_owed0, ONE_ETHER / 4);
    assert_eq!(ledger.balance_of(LP, TOKEN0), U256::ZERO);

    let (collected0, collected1) = pool
        .collect_limit_order(&mut ledger, LP, TOKEN0, -60, u128::MAX, u128::MAX)
        .unwrap();
    assert_eq!((collected0, collected1), (ONE_ETHER / 4, 0));
    assert_eq!(ledger.balance_of(LP, TOKEN0), U256::from(ONE_ETHER / 4));
    // position still live: liquidity remains
    assert!(pool.limit_position(LP, TOKEN0, -60).is_some());
    assert_eq!(pool.limit_tick(TOKEN0, -60).unwrap().liquidity_gross, ONE_ETHER - ONE_ETHER / 4);
}

#[test]
fn test_collect_caps_at_requested_amounts() {
    let (mut pool, mut ledger) = medium_pool_at_one();
    mint_funded_limit_order(&mut pool, &mut ledger, TOKEN0, LP, -60, ONE_ETHER);
    pool.burn_limit_order(&mut ledger, TOKEN0, LP, -60, ONE_ETHER / 2)
        .unwrap();

    let (collected0, _) = pool
        .collect_limit_order(&mut ledger, LP, TOKEN0, -60, 1000, 1000)
        .unwrap();
    assert_eq!(collected0, 1000);
    assert_eq!(
        pool.limit_position(LP, TOKEN0, -60).unwrap().tokens_owed0,
        ONE_ETHER / 2 - 1000
    );
}

#[test]
fn test_burn_and_collect_errors() {
    let (mut pool, mut ledger) = medium_pool_at_one();
    mint_funded_limit_order(&mut pool, &mut ledger, TOKEN0, LP, -60, ONE_ETHER);

    assert_eq!(
        pool.burn_limit_order(&mut ledger, TOKEN0, LP, -120, 1),
        Err(PoolError::PositionNotFound)
    );
    assert_eq!(
        pool.burn_limit_order(&mut ledger, TOKEN1, LP, -60, 1),
        Err(PoolError::PositionNotFound)
    );
    assert_eq!(
        pool.burn_limit_order(&mut ledger, TOKEN0, LP2, -60, 1),
        Err(PoolError::PositionNotFound)
    );
    assert_eq!(
        pool.burn_limit_order(&mut ledger, TOKEN0, LP, -60, ONE_ETHER + 1),
        Err(PoolError::LiquidityUnderflow)
    );
    assert_eq!(
        pool.collect_limit_order(&mut ledger, LP2, TOKEN0, -60, 1, 1),
        Err(PoolError::PositionNotFound)
    );
    // nothing above disturbed the position
    assert_eq!(
        pool.limit_position(LP, TOKEN0, -60).unwrap().liquidity,
        ONE_ETHER
    );
}

#[test]
fn test_zero_burn_pokes_an_existing_position() {
    let (mut pool, mut ledger) = medium_pool_at_one();
    mint_funded_limit_order(&mut pool, &mut ledger, TOKEN0, LP, -60, ONE_ETHER);

    let burn = pool
        .burn_limit_order(&mut ledger, TOKEN0, LP, -60, 0)
        .unwrap();
    assert_eq!((burn.amount_burnt0, burn.amount_burnt1), (0, 0));
    assert_eq!(
        pool.limit_position(LP, TOKEN0, -60).unwrap().liquidity,
        ONE_ETHER
    );
}

#[test]
fn test_multiple_owners_share_a_tick() {
    let (mut pool, mut ledger) = medium_pool_at_one();
    mint_funded_limit_order(&mut pool, &mut ledger, TOKEN0, LP, -60, ONE_ETHER);
    mint_funded_limit_order(&mut pool, &mut ledger, TOKEN0, LP2, -60, 2 * ONE_ETHER);

    let tick = pool.limit_tick(TOKEN0, -60).unwrap();
    assert_eq!(tick.liquidity_gross, 3 * ONE_ETHER);
    assert_eq!(tick.owners, vec![LP, LP2]);

    // burning one owner out removes it from the roster but keeps the tick
    pool.burn_limit_order(&mut ledger, TOKEN0, LP, -60, ONE_ETHER)
        .unwrap();
    let tick = pool.limit_tick(TOKEN0, -60).unwrap();
    assert_eq!(tick.liquidity_gross, 2 * ONE_ETHER);
    assert_eq!(tick.owners, vec![LP2]);
    assert!(pool.limit_position(LP, TOKEN0, -60).is_none());

    pool.burn_limit_order(&mut ledger, TOKEN0, LP2, -60, 2 * ONE_ETHER)
        .unwrap();
    assert!(pool.limit_tick(TOKEN0, -60).is_none());
}

#[test]
fn test_mint_on_top_of_own_position_accumulates() {
    let (mut pool, mut ledger) = medium_pool_at_one();
    mint_funded_limit_order(&mut pool, &mut ledger, TOKEN0, LP, -60, ONE_ETHER);
    mint_funded_limit_order(&mut pool, &mut ledger, TOKEN0, LP, -60, ONE_ETHER);

    let tick = pool.limit_tick(TOKEN0, -60).unwrap();
    // same owner appears once however often it mints
    assert_eq!(tick.owners, vec![LP]);
    assert_eq!(tick.liquidity_gross, 2 * ONE_ETHER);
    assert_eq!(
        pool.limit_position(LP, TOKEN0, -60).unwrap().liquidity,
        2 * ONE_ETHER
    );
}

#[test]
fn test_both_books_are_independent() {
    let (mut pool, mut ledger) = medium_pool_at_one();
    mint_funded_limit_order(&mut pool, &mut ledger, TOKEN0, LP, -60, ONE_ETHER);
    mint_funded_limit_order(&mut pool, &mut ledger, TOKEN1, LP, -60, 2 * ONE_ETHER);

    assert_eq!(pool.limit_tick(TOKEN0, -60).unwrap().liquidity_gross, ONE_ETHER);
    assert_eq!(
        pool.limit_tick(TOKEN1, -60).unwrap().liquidity_gross,
        2 * ONE_ETHER
    );
    let position0 = pool.limit_position(LP, TOKEN0, -60).unwrap();
    let position1 = pool.limit_position(LP, TOKEN1, -60).unwrap();
    assert_eq!(position0.liquidity, ONE_ETHER);
    assert_eq!(position1.liquidity, 2 * ONE_ETHER);
}
