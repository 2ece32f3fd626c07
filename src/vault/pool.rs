// Vault - per-token liquidity pool
//
// Holds deposits against proportional shares, nets cross transfers through
// a signed per-gateway debt ledger, and distributes flux fees to
// shareholders through the pull-based accumulator in rewards.rs.
//
// Every operation validates and computes first, then commits; a failure
// leaves no partial mutation.

use crate::token::{Token, TokenError};
use crate::vault::debt::GateDebt;
use crate::vault::rewards::{Position, FLUX_SCALE};
use alloy_primitives::{Address, I256, U256};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during vault operations
#[derive(Error, Debug)]
pub enum VaultError {
    #[error("Insufficient shares: available {available}, required {required}")]
    InsufficientShares { available: U256, required: U256 },

    #[error("Insufficient liquidity: on hand {available}, required {required}")]
    InsufficientLiquidity { available: U256, required: U256 },

    #[error("Fee {fee} exceeds transfer amount {amount}")]
    FeeExceedsAmount { amount: U256, fee: U256 },

    #[error("Ledger arithmetic overflow")]
    ArithmeticOverflow,

    #[error("Token ledger error: {0}")]
    Token(#[from] TokenError),
}

/// The Vault - share-accounted liquidity pool with a per-gateway debt ledger
///
/// `total_token` tracks the shareholders' claim and always equals the
/// on-hand balance minus `reserved_fee` minus the signed sum of gateway
/// debts.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Vault {
    /// The vault's own holding account in the asset ledgers
    account: Address,
    total_shares: U256,
    total_token: U256,
    positions: HashMap<Address, Position>,
    /// Monotonically non-decreasing flux per-share accumulator
    reward_flux_per_share_stored: U256,
    reserved_fee: U256,
    reserved_fee_flux: U256,
    gate_debt: HashMap<Address, GateDebt>,
}

impl Vault {
    /// Create an empty vault holding at the given account
    pub fn new(account: Address) -> Self {
        Self {
            account,
            total_shares: U256::ZERO,
            total_token: U256::ZERO,
            positions: HashMap::new(),
            reward_flux_per_share_stored: U256::ZERO,
            reserved_fee: U256::ZERO,
            reserved_fee_flux: U256::ZERO,
            gate_debt: HashMap::new(),
        }
    }

    // ========================================================================
    // VIEWS
    // ========================================================================

    /// Get the vault's holding account
    pub fn account(&self) -> Address {
        self.account
    }

    /// Get the total share supply
    pub fn total_shares(&self) -> U256 {
        self.total_shares
    }

    /// Get the shareholders' total token claim
    pub fn total_token(&self) -> U256 {
        self.total_token
    }

    /// Get an account's share balance
    pub fn share_of(&self, account: Address) -> U256 {
        self.positions
            .get(&account)
            .map(|p| p.shares())
            .unwrap_or_default()
    }

    /// Get an account's reward position
    pub fn position(&self, account: Address) -> Position {
        self.positions.get(&account).copied().unwrap_or_default()
    }

    /// Get the flux per-share accumulator
    pub fn reward_flux_per_share_stored(&self) -> U256 {
        self.reward_flux_per_share_stored
    }

    /// Get the collected, undistributed token fees
    pub fn reserved_fee(&self) -> U256 {
        self.reserved_fee
    }

    /// Get the collected, undistributed flux fees
    pub fn reserved_fee_flux(&self) -> U256 {
        self.reserved_fee_flux
    }

    /// Get the debt entry for a gateway (zero if never touched)
    pub fn gate_debt(&self, gateway: Address) -> GateDebt {
        self.gate_debt.get(&gateway).copied().unwrap_or_default()
    }

    /// Signed sum of all gateway token debts
    pub fn total_debt(&self) -> I256 {
        self.gate_debt
            .values()
            .fold(I256::ZERO, |acc, entry| acc.saturating_add(entry.debt()))
    }

    /// On-hand token balance
    pub fn balance(&self, token: &Token) -> U256 {
        token.balance_of(self.account)
    }

    /// On-hand flux balance
    pub fn flux_balance(&self, flux: &Token) -> U256 {
        flux.balance_of(self.account)
    }

    /// Pure share -> token conversion, floor-rounded
    ///
    /// Exposed for external reconciliation; zero when no shares exist.
    pub fn share_to_amount(
        share: U256,
        total_shares: U256,
        total_token: U256,
    ) -> Result<U256, VaultError> {
        if total_shares.is_zero() {
            return Ok(U256::ZERO);
        }
        mul_div(share, total_token, total_shares)
    }

    /// Flux claimable by an account right now
    ///
    /// Accumulator deltas are bounded far below U256 overflow, so the view
    /// saturates instead of failing.
    pub fn pending_flux(&self, account: Address) -> U256 {
        self.positions
            .get(&account)
            .and_then(|p| p.pending(self.reward_flux_per_share_stored))
            .unwrap_or_default()
    }

    // ========================================================================
    // DEPOSIT / WITHDRAW
    // ========================================================================

    /// Deposit token and mint shares at the current exchange rate
    ///
    /// The first depositor mints 1:1; afterwards
    /// `shares = amount * total_shares / total_token`, floor-rounded. The
    /// depositor's reward accrual is banked first, so no deposit changes any
    /// account's pending flux.
    pub fn deposit(
        &mut self,
        token: &mut Token,
        account: Address,
        amount: U256,
    ) -> Result<U256, VaultError> {
        let minted = if self.total_shares.is_zero() {
            amount
        } else {
            mul_div(amount, self.total_shares, self.total_token)?
        };

        let banked = self
            .position(account)
            .banked(self.reward_flux_per_share_stored)
            .ok_or(VaultError::ArithmeticOverflow)?;
        let shares = banked
            .shares()
            .checked_add(minted)
            .ok_or(VaultError::ArithmeticOverflow)?;
        let total_shares = self
            .total_shares
            .checked_add(minted)
            .ok_or(VaultError::ArithmeticOverflow)?;
        let total_token = self
            .total_token
            .checked_add(amount)
            .ok_or(VaultError::ArithmeticOverflow)?;

        token.transfer(account, self.account, amount)?;

        self.positions.insert(account, banked.with_shares(shares));
        self.total_shares = total_shares;
        self.total_token = total_token;
        debug!(account = %account, %amount, %minted, "vault deposit");
        Ok(minted)
    }

    /// Burn shares and pay out the proportional token amount
    pub fn withdraw(
        &mut self,
        token: &mut Token,
        account: Address,
        share_amount: U256,
    ) -> Result<U256, VaultError> {
        let position = self.position(account);
        if share_amount > position.shares() {
            return Err(VaultError::InsufficientShares {
                available: position.shares(),
                required: share_amount,
            });
        }

        let payout = Self::share_to_amount(share_amount, self.total_shares, self.total_token)?;
        let on_hand = token.balance_of(self.account);
        if on_hand < payout {
            return Err(VaultError::InsufficientLiquidity {
                available: on_hand,
                required: payout,
            });
        }

        let banked = position
            .banked(self.reward_flux_per_share_stored)
            .ok_or(VaultError::ArithmeticOverflow)?;
        let shares = banked.shares() - share_amount;
        let total_shares = self.total_shares - share_amount;
        let total_token = self
            .total_token
            .checked_sub(payout)
            .ok_or(VaultError::ArithmeticOverflow)?;

        token.transfer(self.account, account, payout)?;

        self.positions.insert(account, banked.with_shares(shares));
        self.total_shares = total_shares;
        self.total_token = total_token;
        debug!(account = %account, %share_amount, %payout, "vault withdraw");
        Ok(payout)
    }

    // ========================================================================
    // CROSS-TRANSFER BOOKINGS
    // ========================================================================

    /// Book an outbound transfer: pull the gross amount (and any flux fee)
    /// from the payer and grow the gateway debt
    ///
    /// The token fee rides the wire and is collected by the destination; the
    /// source books no reservation. Incoming flux is held here as backing
    /// for the destination's shareholder claim until a rebalance ships it.
    #[allow(clippy::too_many_arguments)]
    pub fn debit_for_cross_transfer(
        &mut self,
        token: &mut Token,
        flux: &mut Token,
        gateway: Address,
        from: Address,
        amount: U256,
        fee: U256,
        fee_flux: U256,
    ) -> Result<(), VaultError> {
        let updated = self
            .gate_debt(gateway)
            .checked_debit(to_i256(amount)?, to_i256(fee_flux)?)
            .ok_or(VaultError::ArithmeticOverflow)?;

        // pre-check the second pull so the first cannot apply alone
        if !fee_flux.is_zero() {
            let available = flux.balance_of(from);
            if available < fee_flux {
                return Err(TokenError::InsufficientBalance {
                    available,
                    required: fee_flux,
                }
                .into());
            }
        }

        token.transfer(from, self.account, amount)?;
        if !fee_flux.is_zero() {
            flux.transfer(from, self.account, fee_flux)?;
        }

        self.gate_debt.insert(gateway, updated);
        debug!(gateway = %gateway, %amount, %fee, %fee_flux, "debited outbound cross transfer");
        Ok(())
    }

    /// Settle an inbound transfer of gross `amount`: pay `amount - fee` to
    /// the recipient, reserve the fee, shrink the gateway debt
    ///
    /// A positive `fee_flux` is attributed to shareholders through the
    /// accumulator (floor remainder to `reserved_fee_flux`, everything to
    /// `reserved_fee_flux` when no shares exist). A negative `fee_flux`
    /// means the flux physically accompanies the message and is paid to the
    /// recipient.
    ///
    /// Fails `InsufficientLiquidity` before any mutation when the on-hand
    /// balances cannot cover the payouts; the caller retries after a
    /// deposit and must not mark the message executed until this succeeds.
    #[allow(clippy::too_many_arguments)]
    pub fn credit_for_cross_transfer(
        &mut self,
        token: &mut Token,
        flux: &mut Token,
        gateway: Address,
        amount: U256,
        fee: U256,
        fee_flux: I256,
        recipient: Address,
    ) -> Result<(), VaultError> {
        let net = amount
            .checked_sub(fee)
            .ok_or(VaultError::FeeExceedsAmount { amount, fee })?;

        let on_hand = token.balance_of(self.account);
        if on_hand < net {
            return Err(VaultError::InsufficientLiquidity {
                available: on_hand,
                required: net,
            });
        }
        let flux_out = if fee_flux.is_negative() {
            fee_flux.unsigned_abs()
        } else {
            U256::ZERO
        };
        if !flux_out.is_zero() {
            let available = flux.balance_of(self.account);
            if available < flux_out {
                return Err(VaultError::InsufficientLiquidity {
                    available,
                    required: flux_out,
                });
            }
        }

        let updated = self
            .gate_debt(gateway)
            .checked_credit(to_i256(amount)?, to_i256(fee_flux.unsigned_abs())?)
            .ok_or(VaultError::ArithmeticOverflow)?;
        let reserved_fee = self
            .reserved_fee
            .checked_add(fee)
            .ok_or(VaultError::ArithmeticOverflow)?;

        let mut stored = self.reward_flux_per_share_stored;
        let mut reserved_fee_flux = self.reserved_fee_flux;
        if fee_flux.is_positive() {
            let claim = fee_flux.unsigned_abs();
            let to_reserve = if self.total_shares.is_zero() {
                claim
            } else {
                let per_share = mul_div(claim, FLUX_SCALE, self.total_shares)?;
                let attributed = mul_div(per_share, self.total_shares, FLUX_SCALE)?;
                stored = stored
                    .checked_add(per_share)
                    .ok_or(VaultError::ArithmeticOverflow)?;
                claim - attributed
            };
            reserved_fee_flux = reserved_fee_flux
                .checked_add(to_reserve)
                .ok_or(VaultError::ArithmeticOverflow)?;
        }

        token.transfer(self.account, recipient, net)?;
        if !flux_out.is_zero() {
            flux.transfer(self.account, recipient, flux_out)?;
        }

        self.gate_debt.insert(gateway, updated);
        self.reserved_fee = reserved_fee;
        self.reward_flux_per_share_stored = stored;
        self.reserved_fee_flux = reserved_fee_flux;
        debug!(gateway = %gateway, %amount, %fee, %fee_flux, recipient = %recipient,
               "credited inbound cross transfer");
        Ok(())
    }

    // ========================================================================
    // FLUX REWARDS
    // ========================================================================

    /// Pay out an account's pending flux and re-checkpoint
    ///
    /// Zero pending is a no-op and never fails. Nonzero pending fails
    /// `InsufficientLiquidity` while the backing flux has not yet been
    /// delivered by a rebalance; the call is retryable.
    pub fn harvest_flux(&mut self, flux: &mut Token, account: Address) -> Result<U256, VaultError> {
        let position = self.position(account);
        let pending = position
            .pending(self.reward_flux_per_share_stored)
            .ok_or(VaultError::ArithmeticOverflow)?;
        if pending.is_zero() {
            return Ok(U256::ZERO);
        }

        let available = flux.balance_of(self.account);
        if available < pending {
            return Err(VaultError::InsufficientLiquidity {
                available,
                required: pending,
            });
        }

        flux.transfer(self.account, account, pending)?;
        self.positions.insert(
            account,
            position.harvested(self.reward_flux_per_share_stored),
        );
        debug!(account = %account, %pending, "harvested flux");
        Ok(pending)
    }

    /// Pay the reserved fee and reserved flux fee to a recipient, zeroing
    /// both
    ///
    /// Afterwards the shareholders' pending flux is exactly the vault's
    /// remaining flux balance.
    pub fn withdraw_reserved(
        &mut self,
        token: &mut Token,
        flux: &mut Token,
        recipient: Address,
    ) -> Result<(U256, U256), VaultError> {
        let fee = self.reserved_fee;
        let fee_flux = self.reserved_fee_flux;

        let token_on_hand = token.balance_of(self.account);
        if token_on_hand < fee {
            return Err(VaultError::InsufficientLiquidity {
                available: token_on_hand,
                required: fee,
            });
        }
        let flux_on_hand = flux.balance_of(self.account);
        if flux_on_hand < fee_flux {
            return Err(VaultError::InsufficientLiquidity {
                available: flux_on_hand,
                required: fee_flux,
            });
        }

        token.transfer(self.account, recipient, fee)?;
        flux.transfer(self.account, recipient, fee_flux)?;
        self.reserved_fee = U256::ZERO;
        self.reserved_fee_flux = U256::ZERO;
        debug!(recipient = %recipient, %fee, %fee_flux, "withdrew reserved fees");
        Ok((fee, fee_flux))
    }
}

fn mul_div(a: U256, b: U256, denominator: U256) -> Result<U256, VaultError> {
    a.checked_mul(b)
        .and_then(|product| product.checked_div(denominator))
        .ok_or(VaultError::ArithmeticOverflow)
}

fn to_i256(value: U256) -> Result<I256, VaultError> {
    I256::try_from(value).map_err(|_| VaultError::ArithmeticOverflow)
}
