//! Configuration loading and representation.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use storehouse_warehouse::CapacityPolicy;

/// Default location of the optional settings file (extension inferred).
pub const DEFAULT_CONFIG_PATH: &str = "config/storehouse";

/// Prefix for environment overrides, e.g. `STOREHOUSE__CAPACITY_POLICY=moves_only`.
pub const ENV_PREFIX: &str = "STOREHOUSE";

fn default_log_filter() -> String {
    "info".to_string()
}

/// Runtime settings for a [`crate::store::WarehouseStore`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoreConfig {
    /// Where location capacity is enforced.
    #[serde(default)]
    pub capacity_policy: CapacityPolicy,
    /// Tracing filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            capacity_policy: CapacityPolicy::default(),
            log_filter: default_log_filter(),
        }
    }
}

impl StoreConfig {
    /// Load from `config/storehouse.{toml,json,...}` (optional) and `STOREHOUSE__*` env vars.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load from an explicit file path (optional) plus env overrides.
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()
    }
}
