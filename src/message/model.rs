use crate::message::codec::MessageCodec;
use alloy_primitives::{Address, Bytes, B256, I256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a chain in the cross-chain topology
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainId(u64);

impl ChainId {
    /// Create a chain identifier from its numeric id
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the numeric id
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chain:{}", self.0)
    }
}

/// Unique identifier for a transfer message (keccak-256 of the wire encoding)
///
/// Confirmation counting and exactly-once execution are both keyed by this
/// hash, so it must stay bit-stable across relayers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageHash(B256);

impl MessageHash {
    /// Create from a raw digest
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(B256::from(bytes))
    }

    /// Get the raw digest bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0 .0
    }
}

impl fmt::Display for MessageHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "msg:{}", hex::encode(&self.0 .0[..8]))
    }
}

/// Optional with-data fields: the sender and an opaque byte payload that is
/// forwarded to the recipient's callback on the destination chain
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossPayload {
    from: Address,
    ext_data: Bytes,
}

impl CrossPayload {
    /// Create a payload from sender and opaque data
    pub fn new(from: Address, ext_data: Bytes) -> Self {
        Self { from, ext_data }
    }

    /// Get the source-chain sender
    pub fn from(&self) -> Address {
        self.from
    }

    /// Get the opaque payload bytes
    pub fn ext_data(&self) -> &Bytes {
        &self.ext_data
    }
}

/// A cross-chain transfer message
///
/// `amount` is the net amount paid to the recipient and `fee` the
/// destination-reserved fee; the gross amount debited at the source is
/// `amount + fee`. `fee_flux` is signed: positive attributes a flux-reward
/// claim to the destination vault's shareholders, negative means the flux
/// physically accompanies the message and is paid out on execution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossMessage {
    cross_id: U256,
    to: Address,
    amount: U256,
    fee: U256,
    #[serde(with = "crate::i256_serde")]
    fee_flux: I256,
    payload: Option<CrossPayload>,
}

impl CrossMessage {
    /// Create a plain transfer message
    pub fn new(cross_id: U256, to: Address, amount: U256, fee: U256, fee_flux: I256) -> Self {
        Self {
            cross_id,
            to,
            amount,
            fee,
            fee_flux,
            payload: None,
        }
    }

    /// Create a with-data transfer message
    pub fn with_data(
        cross_id: U256,
        to: Address,
        amount: U256,
        fee: U256,
        fee_flux: I256,
        from: Address,
        ext_data: Bytes,
    ) -> Self {
        Self {
            cross_id,
            to,
            amount,
            fee,
            fee_flux,
            payload: Some(CrossPayload::new(from, ext_data)),
        }
    }

    /// Get the monotonically increasing transfer id
    pub fn cross_id(&self) -> U256 {
        self.cross_id
    }

    /// Get the recipient
    pub fn to(&self) -> Address {
        self.to
    }

    /// Get the net amount paid to the recipient
    pub fn amount(&self) -> U256 {
        self.amount
    }

    /// Get the destination-reserved fee
    pub fn fee(&self) -> U256 {
        self.fee
    }

    /// Get the signed flux delta
    pub fn fee_flux(&self) -> I256 {
        self.fee_flux
    }

    /// Get the optional with-data fields
    pub fn payload(&self) -> Option<&CrossPayload> {
        self.payload.as_ref()
    }

    /// Whether this message carries an opaque payload
    pub fn has_data(&self) -> bool {
        self.payload.is_some()
    }

    /// Encode to the wire tuple
    pub fn encode(&self) -> Vec<u8> {
        MessageCodec::encode(self)
    }

    /// Compute the message hash over the wire encoding
    pub fn hash(&self) -> MessageHash {
        MessageCodec::hash(self)
    }
}
