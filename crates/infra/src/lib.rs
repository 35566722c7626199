//! Infrastructure layer: shared store, audit journal, configuration.

pub mod config;
pub mod store;

pub use config::StoreConfig;
pub use store::{StoreError, StoreResult, WarehouseEnvelope, WarehouseStore};

/// Initialize tracing from `config` and build an in-memory store.
pub fn bootstrap(config: &StoreConfig) -> WarehouseStore {
    storehouse_observability::init_with_filter(&config.log_filter);
    tracing::info!(capacity_policy = ?config.capacity_policy, "warehouse store starting");
    WarehouseStore::from_config(config)
}
