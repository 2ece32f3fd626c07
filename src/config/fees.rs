use crate::message::ChainId;
use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Denominator of the flux fee rate: a rate of 30 charges 0.30%
pub const RATE_SCALE: U256 = U256::from_limbs([10_000, 0, 0, 0]);

/// Errors that can occur during fee configuration operations
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Arity mismatch: {ids} destination ids, {fees} fee entries")]
    ArityMismatch { ids: usize, fees: usize },

    #[error("Unknown destination: {0}")]
    UnknownDestination(ChainId),

    #[error("Fee computation overflow")]
    FeeOverflow,
}

/// Fee parameters for one destination chain
///
/// `native_fee` is the fixed fee in token units charged when the payer does
/// not opt into flux; `flux_fee_rate` is the proportional flux fee over
/// [`RATE_SCALE`] charged when they do.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeParams {
    native_fee: U256,
    flux_fee_rate: U256,
}

impl FeeParams {
    /// Create fee parameters
    pub fn new(native_fee: U256, flux_fee_rate: U256) -> Self {
        Self {
            native_fee,
            flux_fee_rate,
        }
    }

    /// Get the fixed native fee
    pub fn native_fee(&self) -> U256 {
        self.native_fee
    }

    /// Get the proportional flux fee rate over [`RATE_SCALE`]
    pub fn flux_fee_rate(&self) -> U256 {
        self.flux_fee_rate
    }
}

/// Registry of per-destination fee parameters
///
/// The payer's chain owns the price: fees for a transfer are always read
/// from the source chain's entry for the destination, never from the
/// destination's own table.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FeeConfig {
    cross_fee: HashMap<ChainId, FeeParams>,
}

impl FeeConfig {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Bulk upsert of fee parameters
    ///
    /// The arrays must have equal length; a mismatch fails before any entry
    /// is applied.
    pub fn set_cross_fee(
        &mut self,
        destination_ids: &[ChainId],
        fee_params: &[FeeParams],
    ) -> Result<(), ConfigError> {
        if destination_ids.len() != fee_params.len() {
            return Err(ConfigError::ArityMismatch {
                ids: destination_ids.len(),
                fees: fee_params.len(),
            });
        }

        for (destination, params) in destination_ids.iter().zip(fee_params) {
            self.cross_fee.insert(*destination, *params);
        }
        Ok(())
    }

    /// Look up the fee parameters for a destination
    ///
    /// Callers must populate an entry before any transfer targets that
    /// destination.
    pub fn cross_fee(&self, destination: ChainId) -> Result<&FeeParams, ConfigError> {
        self.cross_fee
            .get(&destination)
            .ok_or(ConfigError::UnknownDestination(destination))
    }

    /// Whether a destination has fee parameters configured
    pub fn has_destination(&self, destination: ChainId) -> bool {
        self.cross_fee.contains_key(&destination)
    }

    /// Compute the flux fee for an amount headed to a destination
    ///
    /// `amount * flux_fee_rate / RATE_SCALE`, floor-rounded.
    pub fn compute_fee_flux(
        &self,
        destination: ChainId,
        amount: U256,
    ) -> Result<U256, ConfigError> {
        let rate = self.cross_fee(destination)?.flux_fee_rate();
        amount
            .checked_mul(rate)
            .map(|scaled| scaled / RATE_SCALE)
            .ok_or(ConfigError::FeeOverflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_lookup() {
        let mut config = FeeConfig::new();
        let dest = ChainId::new(56);
        config
            .set_cross_fee(
                &[dest],
                &[FeeParams::new(U256::from(3u64), U256::from(30u64))],
            )
            .unwrap();

        let params = config.cross_fee(dest).unwrap();
        assert_eq!(params.native_fee(), U256::from(3u64));
        assert_eq!(params.flux_fee_rate(), U256::from(30u64));
    }

    #[test]
    fn test_arity_mismatch_applies_nothing() {
        let mut config = FeeConfig::new();
        let result = config.set_cross_fee(
            &[ChainId::new(1), ChainId::new(2)],
            &[FeeParams::new(U256::ZERO, U256::ZERO)],
        );

        assert!(matches!(result, Err(ConfigError::ArityMismatch { .. })));
        assert!(!config.has_destination(ChainId::new(1)));
    }

    #[test]
    fn test_unknown_destination() {
        let config = FeeConfig::new();
        assert!(matches!(
            config.cross_fee(ChainId::new(9)),
            Err(ConfigError::UnknownDestination(_))
        ));
    }

    #[test]
    fn test_fee_flux_floors() {
        let mut config = FeeConfig::new();
        let dest = ChainId::new(56);
        config
            .set_cross_fee(
                &[dest],
                &[FeeParams::new(U256::ZERO, U256::from(30u64))],
            )
            .unwrap();

        // 333 * 30 / 10000 = 0.999 floors to zero
        assert_eq!(
            config.compute_fee_flux(dest, U256::from(333u64)).unwrap(),
            U256::ZERO
        );
        assert_eq!(
            config.compute_fee_flux(dest, U256::from(2000u64)).unwrap(),
            U256::from(6u64)
        );
    }
}
