// fluxgate - Cross-chain settlement core
// Vault share accounting, signed gateway debt ledgers, threshold-confirmed
// message execution, and pull-based flux reward distribution.

mod i256_serde;

pub mod config;
pub mod gateway;
pub mod message;
pub mod settlement;
pub mod storage;
pub mod token;
pub mod vault;

pub use settlement::{Settlement, SettlementError};
