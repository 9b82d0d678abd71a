//! Agent configuration with environment overrides.

use serde::{Deserialize, Serialize};
use shared_types::U256;
use std::env;

/// Gas budget merged into templates that do not set one.
pub const DEFAULT_GAS: u64 = 300_000;

/// Gas price used on networks with a stable price (1 gwei).
pub const DEFAULT_GAS_PRICE_WEI: u64 = 1_000_000_000;

/// Pending nonces older than this are ignored (15 minutes).
pub const DEFAULT_STALE_AFTER_MS: u64 = 15 * 60 * 1000;

/// Balance cache time-to-live (30 seconds).
pub const DEFAULT_BALANCE_TTL_MS: u64 = 30 * 1000;

/// Networks where the client picks the gas price.
const FLUCTUATING_GAS_NETWORKS: &[&str] = &["mainnet", "ropsten", "goerli"];

/// Local development chains; block numbers come from the client.
const DEV_NETWORKS: &[&str] = &["development", "localhost", "ganache"];

/// Nonce allocation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonceConfig {
    /// Age after which a pending record no longer counts toward the next nonce.
    pub stale_after_ms: u64,
}

impl Default for NonceConfig {
    fn default() -> Self {
        Self {
            stale_after_ms: DEFAULT_STALE_AFTER_MS,
        }
    }
}

/// Balance cache settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceCacheConfig {
    /// How long a fetched balance is served from cache.
    pub ttl_ms: u64,
}

impl Default for BalanceCacheConfig {
    fn default() -> Self {
        Self {
            ttl_ms: DEFAULT_BALANCE_TTL_MS,
        }
    }
}

/// Configuration of an `AccountAgent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Network name, e.g. `mainnet` or `development`.
    pub network: String,
    /// Chain id stamped on every transaction.
    pub chain_id: u64,
    /// Gas budget for templates without one.
    pub default_gas: u64,
    /// Gas price for templates without one; `None` lets the client decide.
    pub gas_price: Option<U256>,
    /// Read the latest block from the chain client instead of the indexer.
    pub use_client_block_number: bool,
    /// Nonce allocation.
    pub nonce: NonceConfig,
    /// Balance caching.
    pub balance_cache: BalanceCacheConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::for_network("development", 1337)
    }
}

impl AgentConfig {
    /// Defaults for a named network.
    pub fn for_network(network: &str, chain_id: u64) -> Self {
        let gas_price = if FLUCTUATING_GAS_NETWORKS.contains(&network) {
            None
        } else {
            Some(U256::from(DEFAULT_GAS_PRICE_WEI))
        };

        Self {
            network: network.to_string(),
            chain_id,
            default_gas: DEFAULT_GAS,
            gas_price,
            use_client_block_number: DEV_NETWORKS.contains(&network),
            nonce: NonceConfig::default(),
            balance_cache: BalanceCacheConfig::default(),
        }
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `RS_NETWORK`: Network name (default: development)
    /// - `RS_CHAIN_ID`: Chain id (default: 1337)
    /// - `RS_DEFAULT_GAS`: Gas budget (default: 300000)
    /// - `RS_GAS_PRICE`: Gas price in wei, `auto` to defer to the client
    /// - `RS_NONCE_STALE_AFTER_MS`: Pending staleness window (default: 900000)
    /// - `RS_BALANCE_TTL_MS`: Balance cache TTL (default: 30000)
    pub fn from_env() -> Self {
        let network = env::var("RS_NETWORK").unwrap_or_else(|_| "development".to_string());
        let chain_id = parse_var("RS_CHAIN_ID").unwrap_or(1337);
        let mut config = Self::for_network(&network, chain_id);

        if let Some(gas) = parse_var("RS_DEFAULT_GAS") {
            config.default_gas = gas;
        }
        if let Ok(price) = env::var("RS_GAS_PRICE") {
            config.gas_price = if price.eq_ignore_ascii_case("auto") {
                None
            } else {
                U256::from_dec_str(&price).ok().or(config.gas_price)
            };
        }
        if let Some(ms) = parse_var("RS_NONCE_STALE_AFTER_MS") {
            config.nonce.stale_after_ms = ms;
        }
        if let Some(ms) = parse_var("RS_BALANCE_TTL_MS") {
            config.balance_cache.ttl_ms = ms;
        }

        config
    }
}

fn parse_var(name: &str) -> Option<u64> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}
