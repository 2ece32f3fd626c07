// Token module - in-memory asset ledgers (transfer token and flux reward)

mod ledger;

pub use ledger::{Token, TokenError};
