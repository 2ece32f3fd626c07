// Settlement - the façade over vault, gateways, and fee config
//
// One instance per token per chain. Computes fees, routes deposits and
// withdrawals, books outbound transfers, and drives the inbound
// confirm-then-execute flow. All checks precede all mutations.

use crate::config::{ConfigError, FeeConfig, FeeParams};
use crate::gateway::{ConfirmPolicy, Gateway, GatewayError, GatewayEvent, RelayPath};
use crate::message::{ChainId, CrossMessage, MessageHash};
use crate::settlement::callback::CrossCallee;
use crate::token::{Token, TokenError};
use crate::vault::{Vault, VaultError};
use alloy_primitives::{Address, Bytes, I256, U256};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{info, warn};

/// Errors that can occur during settlement operations
#[derive(Error, Debug)]
pub enum SettlementError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Vault error: {0}")]
    Vault(#[from] VaultError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Token ledger error: {0}")]
    Token(#[from] TokenError),

    #[error("No gateway registered for {0}")]
    UnknownGateway(ChainId),

    #[error("Fee {fee} exceeds transfer amount {amount}")]
    FeeExceedsAmount { amount: U256, fee: U256 },

    #[error("Ledger arithmetic overflow")]
    ArithmeticOverflow,

    #[error("Snapshot deserialization failed")]
    SnapshotDecodeFailed,
}

/// The settlement façade for one token on one chain
#[derive(Serialize, Deserialize)]
pub struct Settlement {
    chain: ChainId,
    token: Token,
    flux: Token,
    vault: Vault,
    config: FeeConfig,
    gateways: HashMap<ChainId, Gateway>,
    /// Runtime-only callback registry; re-register after loading a snapshot
    #[serde(skip)]
    callees: HashMap<Address, Box<dyn CrossCallee>>,
}

impl Settlement {
    /// Create a settlement for a token on a chain
    pub fn new(chain: ChainId, token: Token, flux: Token, vault_account: Address) -> Self {
        Self {
            chain,
            token,
            flux,
            vault: Vault::new(vault_account),
            config: FeeConfig::new(),
            gateways: HashMap::new(),
            callees: HashMap::new(),
        }
    }

    // ========================================================================
    // WIRING
    // ========================================================================

    /// Register the gateway serving a remote chain, with the default
    /// confirmation policy
    pub fn register_gateway(&mut self, remote: ChainId, account: Address) {
        self.register_gateway_with_policy(remote, account, ConfirmPolicy::default());
    }

    /// Register the gateway serving a remote chain with an explicit policy
    pub fn register_gateway_with_policy(
        &mut self,
        remote: ChainId,
        account: Address,
        policy: ConfirmPolicy,
    ) {
        self.gateways
            .insert(remote, Gateway::with_policy(account, self.chain, policy));
    }

    /// Bind the remote gateway address for a remote chain
    pub fn bind_gateway(
        &mut self,
        remote: ChainId,
        remote_gateway: Address,
    ) -> Result<(), SettlementError> {
        self.gateway_mut(remote)?.bind_gateway(remote, remote_gateway);
        Ok(())
    }

    /// Bulk upsert of per-destination fee parameters
    pub fn set_cross_fee(
        &mut self,
        destination_ids: &[ChainId],
        fee_params: &[FeeParams],
    ) -> Result<(), SettlementError> {
        self.config.set_cross_fee(destination_ids, fee_params)?;
        Ok(())
    }

    /// Register a recipient callback for with-data transfers
    pub fn register_callee(&mut self, address: Address, callee: Box<dyn CrossCallee>) {
        self.callees.insert(address, callee);
    }

    // ========================================================================
    // VIEWS
    // ========================================================================

    /// Get the local chain id
    pub fn chain(&self) -> ChainId {
        self.chain
    }

    /// Get the token ledger
    pub fn token(&self) -> &Token {
        &self.token
    }

    /// Get the token ledger mutably (funding accounts in tests and tools)
    pub fn token_mut(&mut self) -> &mut Token {
        &mut self.token
    }

    /// Get the flux ledger
    pub fn flux(&self) -> &Token {
        &self.flux
    }

    /// Get the flux ledger mutably
    pub fn flux_mut(&mut self) -> &mut Token {
        &mut self.flux
    }

    /// Get the vault
    pub fn vault(&self) -> &Vault {
        &self.vault
    }

    /// Get the fee config
    pub fn config(&self) -> &FeeConfig {
        &self.config
    }

    /// Get the gateway serving a remote chain
    pub fn gateway(&self, remote: ChainId) -> Option<&Gateway> {
        self.gateways.get(&remote)
    }

    /// Flux claimable by an account right now
    pub fn pending_flux(&self, account: Address) -> U256 {
        self.vault.pending_flux(account)
    }

    // ========================================================================
    // LIQUIDITY
    // ========================================================================

    /// Deposit token into the vault, minting shares
    pub fn deposit(&mut self, account: Address, amount: U256) -> Result<U256, SettlementError> {
        Ok(self.vault.deposit(&mut self.token, account, amount)?)
    }

    /// Burn shares and withdraw the proportional token amount
    pub fn withdraw(
        &mut self,
        account: Address,
        share_amount: U256,
    ) -> Result<U256, SettlementError> {
        Ok(self.vault.withdraw(&mut self.token, account, share_amount)?)
    }

    /// Pay out an account's pending flux
    pub fn harvest_flux(&mut self, account: Address) -> Result<U256, SettlementError> {
        Ok(self.vault.harvest_flux(&mut self.flux, account)?)
    }

    /// Pay the reserved fees to a recipient
    pub fn withdraw_reserved(
        &mut self,
        recipient: Address,
    ) -> Result<(U256, U256), SettlementError> {
        Ok(self
            .vault
            .withdraw_reserved(&mut self.token, &mut self.flux, recipient)?)
    }

    // ========================================================================
    // OUTBOUND TRANSFERS
    // ========================================================================

    /// Initiate a cross-chain transfer
    ///
    /// With `use_fee_flux` the token fee is zero and a proportional flux fee
    /// is pulled from the payer instead; otherwise the destination-side fee
    /// is the configured native fee. Returns the emitted message.
    pub fn cross_transfer(
        &mut self,
        remote: ChainId,
        from: Address,
        to: Address,
        amount: U256,
        use_fee_flux: bool,
    ) -> Result<CrossMessage, SettlementError> {
        let (fee, fee_flux) = self.quote_fee(remote, amount, use_fee_flux)?;
        let net = amount
            .checked_sub(fee)
            .ok_or(SettlementError::FeeExceedsAmount { amount, fee })?;
        let gateway_account = self.gateway_account(remote)?;

        self.vault.debit_for_cross_transfer(
            &mut self.token,
            &mut self.flux,
            gateway_account,
            from,
            amount,
            fee,
            fee_flux,
        )?;

        let fee_flux = to_i256(fee_flux)?;
        let message = self.gateway_mut(remote)?.emit_transfer(to, net, fee, fee_flux);
        info!(chain = %self.chain, %remote, cross_id = %message.cross_id(), %amount,
              "emitted cross transfer");
        Ok(message)
    }

    /// Initiate a cross-chain transfer carrying an opaque payload for the
    /// recipient's callback
    pub fn cross_transfer_with_data(
        &mut self,
        remote: ChainId,
        from: Address,
        to: Address,
        amount: U256,
        use_fee_flux: bool,
        ext_data: Bytes,
    ) -> Result<CrossMessage, SettlementError> {
        let (fee, fee_flux) = self.quote_fee(remote, amount, use_fee_flux)?;
        let net = amount
            .checked_sub(fee)
            .ok_or(SettlementError::FeeExceedsAmount { amount, fee })?;
        let gateway_account = self.gateway_account(remote)?;

        self.vault.debit_for_cross_transfer(
            &mut self.token,
            &mut self.flux,
            gateway_account,
            from,
            amount,
            fee,
            fee_flux,
        )?;

        let fee_flux = to_i256(fee_flux)?;
        let message = self
            .gateway_mut(remote)?
            .emit_transfer_with_data(to, net, fee, fee_flux, from, ext_data);
        info!(chain = %self.chain, %remote, cross_id = %message.cross_id(), %amount,
              "emitted cross transfer with data");
        Ok(message)
    }

    /// Physically settle accumulated debt toward a remote chain
    ///
    /// The rebalancer supplies `amount` token and `flux_amount` flux on this
    /// chain; the emitted message carries a negative flux delta so the
    /// destination pays both out and the pair's debts return toward zero.
    /// Share supply and `total_token` are untouched on both sides.
    pub fn cross_rebalance(
        &mut self,
        remote: ChainId,
        from: Address,
        to: Address,
        amount: U256,
        flux_amount: U256,
    ) -> Result<CrossMessage, SettlementError> {
        let gateway_account = self.gateway_account(remote)?;

        self.vault.debit_for_cross_transfer(
            &mut self.token,
            &mut self.flux,
            gateway_account,
            from,
            amount,
            U256::ZERO,
            flux_amount,
        )?;

        let fee_flux = to_i256(flux_amount)?
            .checked_neg()
            .ok_or(SettlementError::ArithmeticOverflow)?;
        let message = self
            .gateway_mut(remote)?
            .emit_transfer(to, amount, U256::ZERO, fee_flux);
        info!(chain = %self.chain, %remote, cross_id = %message.cross_id(), %amount,
              %flux_amount, "emitted cross rebalance");
        Ok(message)
    }

    /// Poll the emitted events of the gateway serving a remote chain
    pub fn poll_events(&mut self, remote: ChainId) -> Result<Vec<GatewayEvent>, SettlementError> {
        Ok(self.gateway_mut(remote)?.poll_events())
    }

    // ========================================================================
    // INBOUND TRANSFERS
    // ========================================================================

    /// Confirmation delivered by the hotpoter relay path
    ///
    /// Returns the weighted confirmation count for the message.
    pub fn on_cross_transfer_by_hotpoter(
        &mut self,
        message: &CrossMessage,
        source_gateway: Address,
        source_chain: ChainId,
    ) -> Result<u32, SettlementError> {
        self.confirm(message, source_gateway, source_chain, RelayPath::Hotpoter)
    }

    /// Confirmation delivered by the secondary cross-chain network path
    pub fn on_cross_transfer(
        &mut self,
        message: &CrossMessage,
        source_gateway: Address,
        source_chain: ChainId,
    ) -> Result<u32, SettlementError> {
        self.confirm(message, source_gateway, source_chain, RelayPath::Network)
    }

    /// Execute a confirmed message exactly once
    ///
    /// Permissionless: anyone may call once the threshold is reached. The
    /// first successful call settles and marks the message executed; later
    /// calls fail `AlreadyExecuted`. A credit that fails
    /// `InsufficientLiquidity` leaves the message pending and retryable.
    /// When the message carries `ext_data`, the recipient's registered
    /// callback is invoked after settlement; its failure does not undo the
    /// settlement.
    pub fn on_cross_transfer_execute(
        &mut self,
        source_chain: ChainId,
        message: &CrossMessage,
    ) -> Result<(), SettlementError> {
        let hash = message.hash();
        let gateway_account = {
            let gateway = self
                .gateways
                .get(&source_chain)
                .ok_or(SettlementError::UnknownGateway(source_chain))?;
            gateway.ensure_executable(hash)?;
            gateway.account()
        };

        let gross = message
            .amount()
            .checked_add(message.fee())
            .ok_or(SettlementError::ArithmeticOverflow)?;
        self.vault.credit_for_cross_transfer(
            &mut self.token,
            &mut self.flux,
            gateway_account,
            gross,
            message.fee(),
            message.fee_flux(),
            message.to(),
        )?;
        self.gateway_mut(source_chain)?.mark_executed(hash);
        info!(chain = %self.chain, source = %source_chain, %hash, "executed cross transfer");

        if let Some(payload) = message.payload() {
            self.invoke_callee(hash, message, payload.from(), payload.ext_data());
        }
        Ok(())
    }

    // ========================================================================
    // SNAPSHOTS
    // ========================================================================

    /// Serialize the settlement state to bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        postcard::to_allocvec(self).unwrap_or_default()
    }

    /// Deserialize a settlement from bytes
    ///
    /// Callbacks are runtime-only and must be re-registered.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SettlementError> {
        postcard::from_bytes(bytes).map_err(|_| SettlementError::SnapshotDecodeFailed)
    }

    fn quote_fee(
        &self,
        remote: ChainId,
        amount: U256,
        use_fee_flux: bool,
    ) -> Result<(U256, U256), SettlementError> {
        let params = self.config.cross_fee(remote)?;
        if use_fee_flux {
            Ok((U256::ZERO, self.config.compute_fee_flux(remote, amount)?))
        } else {
            Ok((params.native_fee(), U256::ZERO))
        }
    }

    fn confirm(
        &mut self,
        message: &CrossMessage,
        source_gateway: Address,
        source_chain: ChainId,
        path: RelayPath,
    ) -> Result<u32, SettlementError> {
        let hash = message.hash();
        Ok(self
            .gateway_mut(source_chain)?
            .confirm(hash, path, source_gateway, source_chain)?)
    }

    fn invoke_callee(&self, hash: MessageHash, message: &CrossMessage, from: Address, data: &[u8]) {
        let Some(callee) = self.callees.get(&message.to()) else {
            return;
        };
        if let Err(error) = callee.on_cross_transfer(from, message.amount(), data) {
            warn!(%hash, recipient = %message.to(), error = %error,
                  "cross transfer callback failed");
        }
    }

    fn gateway_account(&self, remote: ChainId) -> Result<Address, SettlementError> {
        self.gateways
            .get(&remote)
            .map(|gateway| gateway.account())
            .ok_or(SettlementError::UnknownGateway(remote))
    }

    fn gateway_mut(&mut self, remote: ChainId) -> Result<&mut Gateway, SettlementError> {
        self.gateways
            .get_mut(&remote)
            .ok_or(SettlementError::UnknownGateway(remote))
    }
}

fn to_i256(value: U256) -> Result<I256, SettlementError> {
    I256::try_from(value).map_err(|_| SettlementError::ArithmeticOverflow)
}
