// Gateway - one chain's end of a remote binding
//
// Outbound: allocates monotone cross ids and emits transfer messages as
// events for relayers to carry. Inbound: verifies the claimed source
// binding, counts confirmations per relay path, and gates exactly-once
// execution on the confirmation threshold.

use crate::gateway::confirm::{ConfirmPolicy, ConfirmSet, RelayPath};
use crate::message::{ChainId, CrossMessage, MessageHash};
use alloy_primitives::{Address, Bytes, I256, U256};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur during gateway operations
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Unbound remote gateway for {chain}: got {got}")]
    UnboundRemote { chain: ChainId, got: Address },

    #[error("Message {hash} not confirmed: {confirms} of {threshold}")]
    NotConfirmed {
        hash: MessageHash,
        confirms: u32,
        threshold: u32,
    },

    #[error("Message {hash} already executed")]
    AlreadyExecuted { hash: MessageHash },
}

/// Events emitted for outbound messages, tagged by message kind
///
/// Relayers and the off-chain diagnostics decode these by kind; the carried
/// message is the exact payload whose encoding they deliver.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum GatewayEvent {
    /// A plain transfer was emitted
    CrossTransfer { message: CrossMessage },
    /// A transfer with an opaque payload was emitted
    CrossTransferWithData { message: CrossMessage },
}

impl GatewayEvent {
    /// Get the emitted message
    pub fn message(&self) -> &CrossMessage {
        match self {
            GatewayEvent::CrossTransfer { message } => message,
            GatewayEvent::CrossTransferWithData { message } => message,
        }
    }
}

/// One chain's gateway for a remote binding
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Gateway {
    /// This gateway's identity; keys the local vault's debt ledger
    account: Address,
    /// The chain this gateway lives on
    chain: ChainId,
    bound_remote: HashMap<ChainId, Address>,
    policy: ConfirmPolicy,
    confirms: HashMap<MessageHash, ConfirmSet>,
    executed: HashSet<MessageHash>,
    next_cross_id: U256,
    events: Vec<GatewayEvent>,
}

impl Gateway {
    /// Create a gateway with the default confirmation policy
    pub fn new(account: Address, chain: ChainId) -> Self {
        Self::with_policy(account, chain, ConfirmPolicy::default())
    }

    /// Create a gateway with an explicit confirmation policy
    pub fn with_policy(account: Address, chain: ChainId, policy: ConfirmPolicy) -> Self {
        Self {
            account,
            chain,
            bound_remote: HashMap::new(),
            policy,
            confirms: HashMap::new(),
            executed: HashSet::new(),
            next_cross_id: U256::from(1u64),
            events: Vec::new(),
        }
    }

    /// Get this gateway's identity
    pub fn account(&self) -> Address {
        self.account
    }

    /// Get the chain this gateway lives on
    pub fn chain(&self) -> ChainId {
        self.chain
    }

    /// Get the confirmation policy
    pub fn policy(&self) -> &ConfirmPolicy {
        &self.policy
    }

    // ========================================================================
    // BINDING
    // ========================================================================

    /// Bind (or re-bind) the remote gateway for a chain
    ///
    /// Idempotent upsert; there is no unbind.
    pub fn bind_gateway(&mut self, remote_chain: ChainId, remote_gateway: Address) {
        info!(chain = %self.chain, remote = %remote_chain, gateway = %remote_gateway,
              "bound remote gateway");
        self.bound_remote.insert(remote_chain, remote_gateway);
    }

    /// Get the bound remote gateway for a chain
    pub fn bound_remote(&self, remote_chain: ChainId) -> Option<Address> {
        self.bound_remote.get(&remote_chain).copied()
    }

    // ========================================================================
    // INBOUND CONFIRMATION
    // ========================================================================

    /// Record a relay path's confirmation of a message
    ///
    /// Verifies the claimed source gateway against the binding for the
    /// source chain. Confirming twice on the same path changes nothing;
    /// paths commute. Returns the weighted confirmation count.
    pub fn confirm(
        &mut self,
        hash: MessageHash,
        path: RelayPath,
        source_gateway: Address,
        source_chain: ChainId,
    ) -> Result<u32, GatewayError> {
        if self.bound_remote(source_chain) != Some(source_gateway) {
            return Err(GatewayError::UnboundRemote {
                chain: source_chain,
                got: source_gateway,
            });
        }

        let entry = self.confirms.entry(hash).or_default();
        entry.insert(path);
        let confirms = entry.weight(&self.policy);
        debug!(%hash, ?path, confirms, "recorded cross transfer confirmation");
        Ok(confirms)
    }

    /// The weighted confirmation count for a message
    pub fn cross_confirms(&self, hash: MessageHash) -> u32 {
        self.confirms
            .get(&hash)
            .map(|set| set.weight(&self.policy))
            .unwrap_or_default()
    }

    /// Whether a message has reached the execution threshold
    pub fn is_confirmed(&self, hash: MessageHash) -> bool {
        self.cross_confirms(hash) >= self.policy.threshold()
    }

    /// Whether a message has been executed
    pub fn is_executed(&self, hash: MessageHash) -> bool {
        self.executed.contains(&hash)
    }

    /// Check that a message may execute right now
    pub fn ensure_executable(&self, hash: MessageHash) -> Result<(), GatewayError> {
        if self.executed.contains(&hash) {
            return Err(GatewayError::AlreadyExecuted { hash });
        }
        let confirms = self.cross_confirms(hash);
        if confirms < self.policy.threshold() {
            return Err(GatewayError::NotConfirmed {
                hash,
                confirms,
                threshold: self.policy.threshold(),
            });
        }
        Ok(())
    }

    /// Mark a message executed
    ///
    /// Called only after the vault credit has succeeded, so a failed credit
    /// leaves the message retryable.
    pub(crate) fn mark_executed(&mut self, hash: MessageHash) {
        self.executed.insert(hash);
    }

    // ========================================================================
    // OUTBOUND EMISSION
    // ========================================================================

    /// Emit a plain transfer message
    pub(crate) fn emit_transfer(
        &mut self,
        to: Address,
        amount: U256,
        fee: U256,
        fee_flux: I256,
    ) -> CrossMessage {
        let message = CrossMessage::new(self.allocate_cross_id(), to, amount, fee, fee_flux);
        self.events.push(GatewayEvent::CrossTransfer {
            message: message.clone(),
        });
        message
    }

    /// Emit a transfer message carrying an opaque payload
    pub(crate) fn emit_transfer_with_data(
        &mut self,
        to: Address,
        amount: U256,
        fee: U256,
        fee_flux: I256,
        from: Address,
        ext_data: Bytes,
    ) -> CrossMessage {
        let message = CrossMessage::with_data(
            self.allocate_cross_id(),
            to,
            amount,
            fee,
            fee_flux,
            from,
            ext_data,
        );
        self.events.push(GatewayEvent::CrossTransferWithData {
            message: message.clone(),
        });
        message
    }

    /// Poll for emitted events (clears the queue)
    pub fn poll_events(&mut self) -> Vec<GatewayEvent> {
        std::mem::take(&mut self.events)
    }

    fn allocate_cross_id(&mut self) -> U256 {
        let id = self.next_cross_id;
        self.next_cross_id = self.next_cross_id.wrapping_add(U256::from(1u64));
        id
    }
}
