// Flux reward accounting - lazy per-account checkpoints
//
// Fee injection is O(1): it only moves the per-share accumulator. Each
// account settles lazily against the accumulator on harvest or on any
// share-changing operation, so no operation ever iterates all accounts.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

/// Precision of the flux per-share accumulator
pub const FLUX_SCALE: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// One account's share position and flux reward checkpoint
///
/// `reward_debt` records the accumulator value at the last checkpoint;
/// `reward_owed` banks accrual that was settled by a share change but not
/// yet harvested. Pending flux is always
/// `reward_owed + shares * (stored - reward_debt) / FLUX_SCALE`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    shares: U256,
    reward_debt: U256,
    reward_owed: U256,
}

impl Position {
    /// Get the share balance
    pub fn shares(&self) -> U256 {
        self.shares
    }

    /// Get the accumulator checkpoint
    pub fn reward_debt(&self) -> U256 {
        self.reward_debt
    }

    /// Get the banked, unharvested accrual
    pub fn reward_owed(&self) -> U256 {
        self.reward_owed
    }

    /// Flux accrued since the last checkpoint, floor-rounded
    pub(crate) fn accrued(&self, stored: U256) -> Option<U256> {
        let delta = stored.checked_sub(self.reward_debt)?;
        Some(self.shares.checked_mul(delta)? / FLUX_SCALE)
    }

    /// Total pending flux: banked plus accrued
    pub(crate) fn pending(&self, stored: U256) -> Option<U256> {
        self.reward_owed.checked_add(self.accrued(stored)?)
    }

    /// Bank the accrual and re-checkpoint at `stored`
    pub(crate) fn banked(&self, stored: U256) -> Option<Position> {
        Some(Position {
            shares: self.shares,
            reward_debt: stored,
            reward_owed: self.pending(stored)?,
        })
    }

    /// Replace the share balance, keeping the checkpoint
    pub(crate) fn with_shares(&self, shares: U256) -> Position {
        Position { shares, ..*self }
    }

    /// Harvested: checkpoint at `stored` with nothing banked
    pub(crate) fn harvested(&self, stored: U256) -> Position {
        Position {
            shares: self.shares,
            reward_debt: stored,
            reward_owed: U256::ZERO,
        }
    }
}
