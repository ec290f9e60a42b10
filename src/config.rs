//! Configuration management for the transaction status service
//!
//! Loads configuration from TOML files with environment variable substitution.

use crate::model::{Network, NetworkId};

use anyhow::{Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

lazy_static! {
    static ref ENV_VAR: Regex = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub service: ServiceConfig,
    pub api: ApiConfig,
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub gas: GasConfig,
    pub networks: HashMap<String, NetworkConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Read-only JSON snapshot of accounts and assets
    pub store_path: PathBuf,
    pub health_check_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
}

/// Tier spread applied around the node's `eth_gasPrice`
#[derive(Debug, Clone, Deserialize)]
pub struct GasConfig {
    pub fast_premium_percent: u64,
    pub slow_discount_percent: u64,
}

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            fast_premium_percent: 25,
            slow_discount_percent: 20,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    pub id: NetworkId,
    pub name: String,
    pub chain_id: u64,
    pub rpc_urls: Vec<String>,
    pub base_asset: String,
    pub max_gas_price_gwei: u64,
    pub enabled: bool,
}

impl NetworkConfig {
    pub fn to_network(&self) -> Network {
        Network {
            id: self.id.clone(),
            name: self.name.clone(),
            chain_id: self.chain_id,
            base_asset: self.base_asset.clone(),
        }
    }
}

impl Settings {
    /// Load settings from configuration files
    pub fn load() -> Result<Self> {
        let config_path = env::var("TX_STATUS_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config/default.toml"));

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        Self::from_toml(&config_str)
    }

    /// Parse and validate settings from TOML text
    pub fn from_toml(input: &str) -> Result<Self> {
        let config_str = substitute_env_vars(input);

        let settings: Settings =
            toml::from_str(&config_str).with_context(|| "Failed to parse configuration")?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.enabled_networks().is_empty() {
            anyhow::bail!("At least one network must be enabled");
        }

        for (name, network) in &self.networks {
            if network.enabled && network.rpc_urls.is_empty() {
                anyhow::bail!("Network {} has no RPC URLs configured", name);
            }
            if !network.id.is_supported() {
                tracing::warn!(
                    "Network {} ({}) is not on the status allow-list - links to it will re-default",
                    name,
                    network.id
                );
            }
        }

        // Links without a `network` parameter always land on the default
        let default_network = NetworkId::default();
        if !self
            .get_network(&default_network)
            .map_or(false, |n| n.enabled)
        {
            anyhow::bail!(
                "Default network {} must be configured and enabled",
                default_network
            );
        }

        Ok(())
    }

    /// Get list of enabled networks
    pub fn enabled_networks(&self) -> Vec<(&String, &NetworkConfig)> {
        self.networks.iter().filter(|(_, n)| n.enabled).collect()
    }

    /// Get network config by network ID
    pub fn get_network(&self, id: &NetworkId) -> Option<&NetworkConfig> {
        self.networks.values().find(|n| &n.id == id)
    }

    /// Network objects for every enabled network
    pub fn networks(&self) -> Vec<Network> {
        self.enabled_networks()
            .into_iter()
            .map(|(_, n)| n.to_network())
            .collect()
    }
}

/// Substitute environment variables in the format ${VAR_NAME}
fn substitute_env_vars(input: &str) -> String {
    let mut result = input.to_string();

    for cap in ENV_VAR.captures_iter(input) {
        let var_name = &cap[1];
        let var_value = env::var(var_name).unwrap_or_default();
        result = result.replace(&cap[0], &var_value);
    }

    result
}
