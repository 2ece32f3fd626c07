// Wire codec tests: golden byte layout and relayer-side handling

use alloy_primitives::{Address, Bytes, I256, U256};
use fluxgate::message::{CrossMessage, MessageCodec};

fn addr(n: u8) -> Address {
    let mut bytes = [0u8; 20];
    bytes[19] = n;
    Address::from(bytes)
}

// ============================================================================
// GOLDEN LAYOUT
// ============================================================================

#[test]
fn test_plain_message_golden_bytes() {
    let message = CrossMessage::new(
        U256::from(1u64),
        addr(0x22),
        U256::from(1000u64),
        U256::from(3u64),
        -I256::ONE,
    );

    let mut expected = vec![0u8; 160];
    expected[31] = 1; // crossId
    expected[63] = 0x22; // to, left-padded address
    expected[94] = 0x03; // amount 1000 = 0x03E8
    expected[95] = 0xE8;
    expected[127] = 3; // fee
    for byte in &mut expected[128..160] {
        *byte = 0xFF; // feeFlux -1, two's complement
    }

    assert_eq!(message.encode(), expected);
}

#[test]
fn test_with_data_message_golden_layout() {
    let message = CrossMessage::with_data(
        U256::from(2u64),
        addr(0x33),
        U256::from(500u64),
        U256::ZERO,
        I256::ZERO,
        addr(0x44),
        Bytes::from_static(b"hello world!"),
    );
    let bytes = message.encode();

    assert_eq!(bytes.len(), 288);
    // from occupies the sixth word
    assert_eq!(bytes[191], 0x44);
    // the seventh word is the tail offset, 7 * 32 = 0xE0
    assert_eq!(bytes[223], 0xE0);
    // the tail starts with the payload length
    assert_eq!(bytes[255], 12);
    assert_eq!(&bytes[256..268], b"hello world!");
}

// ============================================================================
// RELAYER HANDLING
// ============================================================================

#[test]
fn test_relayer_decodes_and_rehashes_identically() {
    let message = CrossMessage::with_data(
        U256::from(3u64),
        addr(0x22),
        U256::from(997u64),
        U256::from(3u64),
        I256::ZERO,
        addr(0x11),
        Bytes::from_static(&[0xDE, 0xAD]),
    );

    // a relayer carries the raw bytes and must land on the same hash the
    // destination computes from the decoded message
    let wire = message.encode();
    let decoded = MessageCodec::decode(&wire).unwrap();
    assert_eq!(decoded, message);
    assert_eq!(MessageCodec::hash_bytes(&wire), decoded.hash());
}

#[test]
fn test_text_transport_rejects_garbage() {
    assert!(MessageCodec::decode_hex("zz").is_err());
    assert!(MessageCodec::decode_base64("!!!").is_err());
}
