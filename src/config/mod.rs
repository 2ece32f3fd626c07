// Config module - per-destination fee registry
// Native-fee amounts and flux-fee rates, keyed by destination chain.

mod fees;

pub use fees::{ConfigError, FeeConfig, FeeParams, RATE_SCALE};
