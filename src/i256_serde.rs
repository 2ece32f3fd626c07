// Postcard-compatible serde adapter for `I256`.
//
// alloy's `Signed` (I256) serializes as a decimal string and deserializes via
// `deserialize_any`, which non-self-describing formats like postcard cannot
// support. The crate persists settlement state with postcard, so I256 fields
// are (de)serialized through their lossless two's-complement `U256` raw form,
// which round-trips cleanly in both human-readable and binary formats.

use alloy_primitives::{I256, U256};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub(crate) fn serialize<S: Serializer>(value: &I256, serializer: S) -> Result<S::Ok, S::Error> {
    value.into_raw().serialize(serializer)
}

pub(crate) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<I256, D::Error> {
    U256::deserialize(deserializer).map(I256::from_raw)
}
