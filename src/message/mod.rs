// Message module - the cross-chain transfer packet
// Wire-exact tuple encoding, keccak-256 identity, and text transports.

mod codec;
mod model;

pub use codec::{CodecError, MessageCodec};
pub use model::{ChainId, CrossMessage, CrossPayload, MessageHash};
