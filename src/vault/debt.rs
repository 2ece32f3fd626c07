// Signed per-gateway debt ledger entry
//
// Each end of a gateway binding carries the mirror of the other: at every
// settled state the pair sums to zero in both the token and flux columns.

use alloy_primitives::I256;
use serde::{Deserialize, Serialize};

/// Net obligation between the two vaults of one gateway binding
///
/// `debt` is in token units, `debt_flux` in flux-reward units. Positive
/// means this vault has taken in value the remote side still owes out;
/// negative means this vault has paid out ahead of the remote side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateDebt {
    #[serde(with = "crate::i256_serde")]
    debt: I256,
    #[serde(with = "crate::i256_serde")]
    debt_flux: I256,
}

impl GateDebt {
    /// Get the token-denominated debt
    pub fn debt(&self) -> I256 {
        self.debt
    }

    /// Get the flux-denominated debt
    pub fn debt_flux(&self) -> I256 {
        self.debt_flux
    }

    /// Whether both columns are back to zero
    pub fn is_settled(&self) -> bool {
        self.debt.is_zero() && self.debt_flux.is_zero()
    }

    /// Outbound booking: both columns grow by the debited amounts
    pub(crate) fn checked_debit(&self, amount: I256, flux: I256) -> Option<GateDebt> {
        Some(GateDebt {
            debt: self.debt.checked_add(amount)?,
            debt_flux: self.debt_flux.checked_add(flux)?,
        })
    }

    /// Inbound settlement: both columns shrink by the credited amounts
    pub(crate) fn checked_credit(&self, amount: I256, flux: I256) -> Option<GateDebt> {
        Some(GateDebt {
            debt: self.debt.checked_sub(amount)?,
            debt_flux: self.debt_flux.checked_sub(flux)?,
        })
    }
}
