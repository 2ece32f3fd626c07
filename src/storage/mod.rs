// Storage module - persistent snapshots of settlement state

mod store;

pub use store::{SettlementStore, StorageStats, StoreError};
