use crate::message::{CrossMessage, MessageHash};
use alloy_primitives::{Address, Bytes, I256, U256};
use sha3::{Digest, Keccak256};
use thiserror::Error;

/// One encoded tuple word
const WORD: usize = 32;
/// Encoded size of the plain shape: five words
const PLAIN_LEN: usize = 5 * WORD;
/// Head size of the with-data shape: seven words, the last the tail offset
const DATA_HEAD_LEN: usize = 7 * WORD;

/// Errors that can occur during message encoding/decoding
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Message truncated: {got} bytes")]
    Truncated { got: usize },

    #[error("Malformed message field: {0}")]
    MalformedField(&'static str),

    #[error("Trailing bytes after message tail")]
    TrailingBytes,

    #[error("Invalid hex string: {0}")]
    InvalidHex(String),

    #[error("Invalid base64 string: {0}")]
    InvalidBase64(String),
}

/// Codec for the wire tuple encoding of cross-chain messages
///
/// The two shapes are ABI tuples, preserved bit-exact because the message
/// hash (the confirmation and idempotency key) is keccak-256 of this
/// encoding:
///
/// - plain:     `(uint256 crossId, address to, uint256 amount, uint256 fee,
///   int256 feeFlux)`
/// - with-data: `(uint256, address, uint256, uint256, int256, address from,
///   bytes extData)` with the `bytes` tail at offset 0xE0
pub struct MessageCodec;

impl MessageCodec {
    /// Encode a message to its wire tuple
    pub fn encode(message: &CrossMessage) -> Vec<u8> {
        let encoded_len = match message.payload() {
            None => PLAIN_LEN,
            Some(payload) => DATA_HEAD_LEN + WORD + padded_len(payload.ext_data().len()),
        };
        let mut bytes = Vec::with_capacity(encoded_len);

        push_u256(&mut bytes, message.cross_id());
        push_address(&mut bytes, message.to());
        push_u256(&mut bytes, message.amount());
        push_u256(&mut bytes, message.fee());
        push_i256(&mut bytes, message.fee_flux());

        if let Some(payload) = message.payload() {
            push_address(&mut bytes, payload.from());
            push_u256(&mut bytes, U256::from(DATA_HEAD_LEN));
            push_u256(&mut bytes, U256::from(payload.ext_data().len()));
            bytes.extend_from_slice(payload.ext_data());
            let pad = padded_len(payload.ext_data().len()) - payload.ext_data().len();
            bytes.extend(std::iter::repeat(0u8).take(pad));
        }

        bytes
    }

    /// Decode a wire tuple, rejecting malformed head or tail structure
    pub fn decode(bytes: &[u8]) -> Result<CrossMessage, CodecError> {
        if bytes.len() == PLAIN_LEN {
            return Ok(CrossMessage::new(
                read_u256(bytes, 0),
                read_address(bytes, 1)?,
                read_u256(bytes, 2),
                read_u256(bytes, 3),
                read_i256(bytes, 4),
            ));
        }

        if bytes.len() < DATA_HEAD_LEN + WORD {
            return Err(CodecError::Truncated { got: bytes.len() });
        }

        let offset = read_u256(bytes, 6);
        if offset != U256::from(DATA_HEAD_LEN) {
            return Err(CodecError::MalformedField("ext_data offset"));
        }
        let data_len = usize::try_from(read_u256(bytes, 7))
            .map_err(|_| CodecError::MalformedField("ext_data length"))?;
        let data_start = DATA_HEAD_LEN + WORD;
        let data_end = data_start
            .checked_add(data_len)
            .ok_or(CodecError::MalformedField("ext_data length"))?;
        let tail_end = data_start + padded_len(data_len);
        if bytes.len() < tail_end {
            return Err(CodecError::Truncated { got: bytes.len() });
        }
        if bytes.len() > tail_end {
            return Err(CodecError::TrailingBytes);
        }
        if bytes[data_end..tail_end].iter().any(|b| *b != 0) {
            return Err(CodecError::MalformedField("ext_data padding"));
        }

        Ok(CrossMessage::with_data(
            read_u256(bytes, 0),
            read_address(bytes, 1)?,
            read_u256(bytes, 2),
            read_u256(bytes, 3),
            read_i256(bytes, 4),
            read_address(bytes, 5)?,
            Bytes::from(bytes[data_start..data_end].to_vec()),
        ))
    }

    /// Hash a message: keccak-256 over its wire encoding
    pub fn hash(message: &CrossMessage) -> MessageHash {
        Self::hash_bytes(&Self::encode(message))
    }

    /// Hash raw wire bytes as delivered by a relayer
    pub fn hash_bytes(bytes: &[u8]) -> MessageHash {
        let digest = Keccak256::digest(bytes);
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&digest);
        MessageHash::from_bytes(hash)
    }

    /// Encode to hex string
    pub fn encode_hex(message: &CrossMessage) -> String {
        hex::encode(Self::encode(message))
    }

    /// Decode from hex string
    pub fn decode_hex(hex_str: &str) -> Result<CrossMessage, CodecError> {
        let bytes = hex::decode(hex_str).map_err(|e| CodecError::InvalidHex(e.to_string()))?;
        Self::decode(&bytes)
    }

    /// Encode to base64 string (URL-safe, no padding)
    pub fn encode_base64(message: &CrossMessage) -> String {
        use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
        URL_SAFE_NO_PAD.encode(Self::encode(message))
    }

    /// Decode from base64 string
    pub fn decode_base64(b64_str: &str) -> Result<CrossMessage, CodecError> {
        use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
        let bytes = URL_SAFE_NO_PAD
            .decode(b64_str)
            .map_err(|e| CodecError::InvalidBase64(e.to_string()))?;
        Self::decode(&bytes)
    }
}

fn padded_len(len: usize) -> usize {
    len.div_ceil(WORD) * WORD
}

fn push_u256(bytes: &mut Vec<u8>, value: U256) {
    bytes.extend_from_slice(&value.to_be_bytes::<32>());
}

fn push_i256(bytes: &mut Vec<u8>, value: I256) {
    bytes.extend_from_slice(&value.to_be_bytes::<32>());
}

fn push_address(bytes: &mut Vec<u8>, address: Address) {
    bytes.extend_from_slice(&[0u8; 12]);
    bytes.extend_from_slice(address.as_slice());
}

fn read_u256(bytes: &[u8], word: usize) -> U256 {
    U256::from_be_slice(&bytes[word * WORD..(word + 1) * WORD])
}

fn read_i256(bytes: &[u8], word: usize) -> I256 {
    let mut buf = [0u8; 32];
    buf.copy_from_slice(&bytes[word * WORD..(word + 1) * WORD]);
    I256::from_be_bytes(buf)
}

fn read_address(bytes: &[u8], word: usize) -> Result<Address, CodecError> {
    let slot = &bytes[word * WORD..(word + 1) * WORD];
    if slot[..12].iter().any(|b| *b != 0) {
        return Err(CodecError::MalformedField("address padding"));
    }
    Ok(Address::from_slice(&slot[12..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        let mut bytes = [0u8; 20];
        bytes[19] = n;
        Address::from(bytes)
    }

    fn plain() -> CrossMessage {
        CrossMessage::new(
            U256::from(7u64),
            addr(0xAA),
            U256::from(997u64),
            U256::from(3u64),
            I256::ZERO,
        )
    }

    #[test]
    fn test_plain_encoding_is_five_words() {
        let bytes = MessageCodec::encode(&plain());

        assert_eq!(bytes.len(), 160);
        // crossId occupies the first word, big-endian
        assert_eq!(bytes[31], 7);
        // address is left-padded into the second word
        assert_eq!(&bytes[32..44], &[0u8; 12]);
        assert_eq!(bytes[63], 0xAA);
    }

    #[test]
    fn test_with_data_tail_offset_and_padding() {
        let message = CrossMessage::with_data(
            U256::from(1u64),
            addr(2),
            U256::from(100u64),
            U256::ZERO,
            I256::ZERO,
            addr(3),
            Bytes::from_static(b"hello world!"),
        );
        let bytes = MessageCodec::encode(&message);

        // 7 head words + length word + one padded data word
        assert_eq!(bytes.len(), 224 + 32 + 32);
        // tail offset is the head size, 0xE0
        assert_eq!(read_u256(&bytes, 6), U256::from(0xE0u64));
        // length word carries the unpadded byte count
        assert_eq!(read_u256(&bytes, 7), U256::from(12u64));
        assert_eq!(&bytes[256..268], b"hello world!");
        assert!(bytes[268..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_negative_fee_flux_is_twos_complement() {
        let message = CrossMessage::new(
            U256::from(1u64),
            addr(2),
            U256::from(100u64),
            U256::ZERO,
            -I256::ONE,
        );
        let bytes = MessageCodec::encode(&message);

        assert!(bytes[128..160].iter().all(|b| *b == 0xFF));
        let decoded = MessageCodec::decode(&bytes).unwrap();
        assert_eq!(decoded.fee_flux(), -I256::ONE);
    }

    #[test]
    fn test_round_trip_both_shapes() {
        let with_data = CrossMessage::with_data(
            U256::from(9u64),
            addr(4),
            U256::from(500u64),
            U256::from(5u64),
            I256::from_raw(U256::from(12u64)),
            addr(5),
            Bytes::from_static(&[1, 2, 3]),
        );

        assert_eq!(MessageCodec::decode(&plain().encode()).unwrap(), plain());
        assert_eq!(
            MessageCodec::decode(&with_data.encode()).unwrap(),
            with_data
        );
    }

    #[test]
    fn test_hash_changes_with_any_field() {
        let base = plain();
        let other = CrossMessage::new(
            U256::from(8u64),
            base.to(),
            base.amount(),
            base.fee(),
            base.fee_flux(),
        );

        assert_eq!(base.hash(), plain().hash());
        assert_ne!(base.hash(), other.hash());
        assert_eq!(
            MessageCodec::hash_bytes(&base.encode()),
            base.hash()
        );
    }

    #[test]
    fn test_decode_rejects_malformed_input() {
        let mut truncated = plain().encode();
        truncated.truncate(100);
        assert!(matches!(
            MessageCodec::decode(&truncated),
            Err(CodecError::Truncated { .. })
        ));

        let mut trailing = CrossMessage::with_data(
            U256::from(1u64),
            addr(2),
            U256::from(100u64),
            U256::ZERO,
            I256::ZERO,
            addr(3),
            Bytes::from_static(b"abc"),
        )
        .encode();
        trailing.extend_from_slice(&[0u8; 32]);
        assert!(matches!(
            MessageCodec::decode(&trailing),
            Err(CodecError::TrailingBytes)
        ));
    }

    #[test]
    fn test_hex_and_base64_round_trip() {
        let message = plain();

        let hex_str = MessageCodec::encode_hex(&message);
        assert_eq!(MessageCodec::decode_hex(&hex_str).unwrap(), message);

        let b64_str = MessageCodec::encode_base64(&message);
        assert_eq!(MessageCodec::decode_base64(&b64_str).unwrap(), message);
    }
}
