use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::core::domain::Network;
use crate::core::errors::WalletError;

/// Smallest base fee the network accepts, in stroops.
pub const MIN_BASE_FEE: u32 = 100;

/// Longest validity window a built transaction may carry (one day).
pub const MAX_TX_TIMEOUT_SECS: u64 = 86_400;

/// Upper bound for a single Horizon request.
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Network selection. Unset URLs and passphrase fall back to the preset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "NetworkConfig::default_network")]
    pub network: Network,
    #[serde(default)]
    pub horizon_url: Option<String>,
    #[serde(default)]
    pub passphrase: Option<String>,
    #[serde(default)]
    pub explorer_url: Option<String>,
}

impl NetworkConfig {
    fn default_network() -> Network { Network::Testnet }

    pub fn for_network(network: Network) -> Self {
        Self {
            network,
            horizon_url: None,
            passphrase: None,
            explorer_url: None,
        }
    }

    pub fn horizon_url(&self) -> &str {
        self.horizon_url
            .as_deref()
            .unwrap_or_else(|| self.network.default_horizon_url())
            .trim_end_matches('/')
    }

    pub fn passphrase(&self) -> &str {
        self.passphrase
            .as_deref()
            .unwrap_or_else(|| self.network.passphrase())
    }

    pub fn explorer_url(&self) -> &str {
        self.explorer_url
            .as_deref()
            .unwrap_or_else(|| self.network.default_explorer_url())
            .trim_end_matches('/')
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::for_network(Self::default_network())
    }
}

/// Transaction construction settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionConfig {
    /// Fee per operation (stroops)
    #[serde(default = "TransactionConfig::default_base_fee")]
    pub base_fee: u32,

    /// Validity window after build (seconds). 0 disables the upper time bound.
    #[serde(default = "TransactionConfig::default_tx_timeout")]
    pub tx_timeout_secs: u64,
}

impl TransactionConfig {
    fn default_base_fee() -> u32 { MIN_BASE_FEE }
    fn default_tx_timeout() -> u64 { 180 }
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            base_fee: Self::default_base_fee(),
            tx_timeout_secs: Self::default_tx_timeout(),
        }
    }
}

/// Horizon client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// HTTP request timeout (seconds)
    #[serde(default = "ClientConfig::default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Number of history entries shown by default
    #[serde(default = "ClientConfig::default_history_limit")]
    pub history_limit: u32,
}

impl ClientConfig {
    fn default_request_timeout() -> u64 { 30 }
    fn default_history_limit() -> u32 { 10 }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: Self::default_request_timeout(),
            history_limit: Self::default_history_limit(),
        }
    }
}

/// wallet configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalletConfig {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub transaction: TransactionConfig,
    #[serde(default)]
    pub client: ClientConfig,
}

impl WalletConfig {
    pub fn for_network(network: Network) -> Self {
        Self {
            network: NetworkConfig::for_network(network),
            ..Default::default()
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, WalletError> {
        let config: WalletConfig = toml::from_str(content)
            .map_err(|e| WalletError::ConfigError(format!("invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads `path` if it exists (defaults otherwise), then applies
    /// `STELLAR_NETWORK` and `HORIZON_URL` from the environment.
    pub fn load(path: &Path) -> Result<Self, WalletError> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|e| {
                WalletError::ConfigError(format!("cannot read {}: {}", path.display(), e))
            })?;
            info!(path = %path.display(), "Loaded wallet config");
            Self::from_toml_str(&content)?
        } else {
            debug!(path = %path.display(), "Config file not found, using defaults");
            Self::default()
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) -> Result<(), WalletError> {
        if let Ok(name) = std::env::var("STELLAR_NETWORK") {
            let network = Network::from_name(&name).ok_or_else(|| {
                WalletError::ConfigError(format!("unknown STELLAR_NETWORK '{}'", name))
            })?;
            if network != self.network.network {
                // preset URLs belong to the old network
                self.network = NetworkConfig::for_network(network);
            }
        }
        if let Ok(url) = std::env::var("HORIZON_URL") {
            self.network.horizon_url = Some(url);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), WalletError> {
        reqwest::Url::parse(self.network.horizon_url()).map_err(|e| {
            WalletError::ConfigError(format!(
                "invalid horizon_url '{}': {}",
                self.network.horizon_url(),
                e
            ))
        })?;
        if self.transaction.base_fee < MIN_BASE_FEE {
            return Err(WalletError::ConfigError(format!(
                "base_fee must be at least {} stroops",
                MIN_BASE_FEE
            )));
        }
        if self.transaction.tx_timeout_secs > MAX_TX_TIMEOUT_SECS {
            return Err(WalletError::ConfigError(format!(
                "tx_timeout_secs must be at most {}",
                MAX_TX_TIMEOUT_SECS
            )));
        }
        if self.client.request_timeout_secs == 0
            || self.client.request_timeout_secs > MAX_REQUEST_TIMEOUT_SECS
        {
            return Err(WalletError::ConfigError(format!(
                "request_timeout_secs must be between 1 and {}",
                MAX_REQUEST_TIMEOUT_SECS
            )));
        }
        if self.client.history_limit == 0 || self.client.history_limit > 200 {
            return Err(WalletError::ConfigError(
                "history_limit must be between 1 and 200".to_string(),
            ));
        }
        Ok(())
    }
}
