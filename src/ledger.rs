//! Account/balance book the pool settles against.
//!
//! The ledger is owned by the caller and handed to each pool operation; the
//! pool itself is just another account in it. Identifiers are opaque,
//! equality-comparable handles.

use std::collections::BTreeMap;

use ethnum::U256;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct AccountId(pub u64);

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TokenId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("insufficient balance")]
    InsufficientBalance,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ledger {
    balances: BTreeMap<(AccountId, TokenId), U256>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mints `amount` of `token` into `account`, outside of any transfer.
    pub fn credit(&mut self, account: AccountId, token: TokenId, amount: U256) {
        let balance = self.balances.entry((account, token)).or_insert(U256::ZERO);
        *balance += amount;
    }

    pub fn balance_of(&self, account: AccountId, token: TokenId) -> U256 {
        self.balances
            .get(&(account, token))
            .copied()
            .unwrap_or(U256::ZERO)
    }

    pub fn transfer(
        &mut self,
        from: AccountId,
        to: AccountId,
        token: TokenId,
        amount: U256,
    ) -> Result<(), LedgerError> {
        if amount == U256::ZERO {
            return Ok(());
        }
        let from_balance = self.balance_of(from, token);
        if from_balance < amount {
            return Err(LedgerError::InsufficientBalance);
        }
        self.balances.insert((from, token), from_balance - amount);
        let to_balance = self.balances.entry((to, token)).or_insert(U256::ZERO);
        *to_balance += amount;
        Ok(())
    }
}
