// Vault module - share-accounted liquidity pool with per-gateway debt ledger
// Deposits mint proportional shares; cross transfers net against signed
// debts; flux fees accrue to shareholders through a pull-based accumulator.

mod debt;
mod pool;
mod rewards;

pub use debt::GateDebt;
pub use pool::{Vault, VaultError};
pub use rewards::{Position, FLUX_SCALE};
