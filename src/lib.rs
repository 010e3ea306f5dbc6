pub mod ledger;
pub mod libraries;
pub mod limit_orders;
pub mod pool;
pub mod range_orders;

pub use ledger::{AccountId, Ledger, TokenId};
pub use pool::{Pool, PoolError};

#[cfg(test)]
pub mod tests;
