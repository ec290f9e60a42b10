//! Chain module - node access for every supported network
//!
//! This module provides:
//! - The `ProviderGateway` capability the core awaits on
//! - Multi-RPC provider management with automatic failover
//! - A per-network registry with connectivity health checks

pub mod gateway;
pub mod provider;

pub use gateway::{FetchedTransaction, GasPriceEstimates, ProviderGateway};
pub use provider::ChainProvider;

#[cfg(test)]
pub use gateway::MockProviderGateway;

use crate::config::Settings;
use crate::error::{TxStatusError, TxStatusResult};
use crate::model::NetworkId;
use crate::tx::GasEstimator;

use dashmap::DashMap;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Gateways indexed by network
pub struct GatewayRegistry {
    gateways: DashMap<NetworkId, Arc<dyn ProviderGateway>>,
}

impl GatewayRegistry {
    pub fn new() -> Self {
        Self {
            gateways: DashMap::new(),
        }
    }

    /// Create providers for all enabled networks. Unreachable nodes are
    /// logged but kept; failover may still reach them later.
    pub async fn connect(settings: &Settings) -> TxStatusResult<Self> {
        let registry = Self::new();

        for (name, network_config) in settings.enabled_networks() {
            info!(
                "Initializing network {} (chain ID: {})",
                name, network_config.chain_id
            );

            for url in &network_config.rpc_urls {
                match ChainProvider::validate_node(&network_config.id, url).await {
                    Ok(head) => info!("Node {} on {} at block {}", url, network_config.id, head),
                    Err(e) => warn!("Node {} failed validation: {}", url, e),
                }
            }

            let provider =
                ChainProvider::new(network_config.clone(), GasEstimator::new(&settings.gas))?;
            registry.insert(network_config.id.clone(), Arc::new(provider));
        }

        Ok(registry)
    }

    pub fn insert(&self, network: NetworkId, gateway: Arc<dyn ProviderGateway>) {
        self.gateways.insert(network, gateway);
    }

    /// Get gateway for a specific network
    pub fn get(&self, network: &NetworkId) -> TxStatusResult<Arc<dyn ProviderGateway>> {
        self.gateways
            .get(network)
            .map(|g| g.clone())
            .ok_or_else(|| TxStatusError::NoGateway {
                network: network.to_string(),
            })
    }

    /// Probe every gateway for its current block
    pub async fn health_check(&self) -> Vec<(NetworkId, bool)> {
        let gateways: Vec<(NetworkId, Arc<dyn ProviderGateway>)> = self
            .gateways
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();

        let checks = gateways.into_iter().map(|(network, gateway)| async move {
            let healthy = match gateway.get_current_block().await {
                Ok(_) => true,
                Err(e) => {
                    error!("Health check failed for network {}: {}", network, e);
                    false
                }
            };
            crate::metrics::record_gateway_health(&network, healthy);
            (network, healthy)
        });

        futures::future::join_all(checks).await
    }

    /// Get all connected networks
    pub fn connected_networks(&self) -> Vec<NetworkId> {
        self.gateways.iter().map(|e| e.key().clone()).collect()
    }
}

impl Default for GatewayRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_gateway_is_an_error() {
        let registry = GatewayRegistry::new();
        let result = registry.get(&NetworkId::new("Kovan"));
        assert!(matches!(result, Err(TxStatusError::NoGateway { .. })));
    }

    #[tokio::test]
    async fn test_health_check_reports_each_network() {
        let mut healthy = MockProviderGateway::new();
        healthy.expect_get_current_block().returning(|| Ok(17_000_000));

        let mut down = MockProviderGateway::new();
        down.expect_get_current_block().returning(|| {
            Err(TxStatusError::ChainConnection {
                network: "Goerli".to_string(),
                message: "connection refused".to_string(),
            })
        });

        let registry = GatewayRegistry::new();
        registry.insert(NetworkId::new("Ethereum"), Arc::new(healthy));
        registry.insert(NetworkId::new("Goerli"), Arc::new(down));

        let mut results = registry.health_check().await;
        results.sort_by(|a, b| a.0.as_str().cmp(b.0.as_str()));

        assert_eq!(
            results,
            vec![
                (NetworkId::new("Ethereum"), true),
                (NetworkId::new("Goerli"), false)
            ]
        );
    }
}
