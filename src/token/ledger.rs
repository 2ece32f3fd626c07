// Token ledger - balance bookkeeping for the assets a settlement moves
//
// Token-standard compliance is out of scope; this ledger is the minimal
// account -> balance table the vault settles against. Every transfer is
// checked before any balance moves.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during token ledger operations
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Insufficient balance: available {available}, required {required}")]
    InsufficientBalance { available: U256, required: U256 },

    #[error("Balance would overflow")]
    BalanceOverflow,
}

/// A single asset ledger: symbol, decimals, and per-account balances
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Token {
    symbol: String,
    decimals: u8,
    total_supply: U256,
    balances: HashMap<Address, U256>,
}

impl Token {
    /// Create a new empty ledger for an asset
    pub fn new(symbol: &str, decimals: u8) -> Self {
        Self {
            symbol: symbol.to_string(),
            decimals,
            total_supply: U256::ZERO,
            balances: HashMap::new(),
        }
    }

    /// Get the asset symbol
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Get the asset decimals
    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    /// Get the total minted supply
    pub fn total_supply(&self) -> U256 {
        self.total_supply
    }

    /// Get the balance of an account (zero if unknown)
    pub fn balance_of(&self, account: Address) -> U256 {
        self.balances.get(&account).copied().unwrap_or_default()
    }

    /// Mint new supply to an account
    pub fn mint(&mut self, account: Address, amount: U256) -> Result<(), TokenError> {
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(TokenError::BalanceOverflow)?;
        let balance = self
            .balance_of(account)
            .checked_add(amount)
            .ok_or(TokenError::BalanceOverflow)?;

        self.total_supply = supply;
        self.balances.insert(account, balance);
        Ok(())
    }

    /// Move `amount` from one account to another
    ///
    /// Fails without side effects when the sender balance does not cover the
    /// amount. A zero-amount transfer is a no-op.
    pub fn transfer(&mut self, from: Address, to: Address, amount: U256) -> Result<(), TokenError> {
        if amount.is_zero() {
            return Ok(());
        }

        let from_balance = self.balance_of(from);
        if from_balance < amount {
            return Err(TokenError::InsufficientBalance {
                available: from_balance,
                required: amount,
            });
        }
        if from == to {
            return Ok(());
        }
        let to_balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(TokenError::BalanceOverflow)?;

        self.balances.insert(from, from_balance - amount);
        self.balances.insert(to, to_balance);
        Ok(())
    }
}
