use ethnum::U256;
use num_bigint::BigUint;
use num_traits::Zero;

use crate::ledger::{AccountId, Ledger, TokenId};
use crate::libraries::safe_cast::{big_uint_to_u256, u256_to_big_uint};
use crate::pool::Pool;

pub mod limit_order_lifecycle;

pub const TOKEN0: TokenId = TokenId(0);
pub const TOKEN1: TokenId = TokenId(1);
pub const POOL_ACCOUNT: AccountId = AccountId(0);
pub const LP: AccountId = AccountId(1);
pub const LP2: AccountId = AccountId(2);
pub const TAKER: AccountId = AccountId(3);

pub const ONE_ETHER: u128 = 1_000_000_000_000_000_000;
pub const MEDIUM_FEE: u32 = 3000;
pub const MEDIUM_SPACING: i32 = 60;

fn isqrt(value: &BigUint) -> BigUint {
    if value.is_zero() {
        return BigUint::zero();
    }
    let mut x = BigUint::from(1_u8) << (value.bits() / 2 + 1);
    loop {
        let y = (&x + value / &x) >> 1_u32;
        if y >= x {
            return x;
        }
        x = y;
    }
}

/// sqrt(reserve1 / reserve0) * 2^96
pub fn encode_price_sqrt(reserve1: u128, reserve0: u128) -> U256 {
    let ratio = (u256_to_big_uint(U256::from(reserve1)) << 192_u32) / BigUint::from(reserve0);
    big_uint_to_u256(&isqrt(&ratio)).unwrap()
}

/// Medium-fee pool plus an empty ledger.
pub fn medium_pool() -> (Pool, Ledger) {
    let pool = Pool::new(TOKEN0, TOKEN1, MEDIUM_FEE, MEDIUM_SPACING, POOL_ACCOUNT).unwrap();
    (pool, Ledger::new())
}

/// Medium-fee pool initialized at a 1:1 price (tick 0).
pub fn medium_pool_at_one() -> (Pool, Ledger) {
    let (mut pool, ledger) = medium_pool();
    pool.initialize(encode_price_sqrt(1, 1)).unwrap();
    (pool, ledger)
}

pub fn fund(ledger: &mut Ledger, account: AccountId, token: TokenId, amount: u128) {
    ledger.credit(account, token, U256::from(amount));
}

/// Mints a limit order from a freshly funded balance.
pub fn mint_funded_limit_order(
    pool: &mut Pool,
    ledger: &mut Ledger,
    token: TokenId,
    owner: AccountId,
    tick: i32,
    amount: u128,
) {
    fund(ledger, owner, token, amount);
    pool.mint_limit_order(ledger, token, owner, tick, amount).unwrap();
}

#[test]
fn test_encode_price_sqrt() {
    assert_eq!(
        encode_price_sqrt(1, 1),
        U256::from(79228162514264337593543950336_u128)
    );
    assert_eq!(
        encode_price_sqrt(1, 10),
        U256::from(25054144837504793118641380156_u128)
    );
}
