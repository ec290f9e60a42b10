//! Chain provider with multi-RPC support and automatic failover

use super::gateway::{FetchedTransaction, GasPriceEstimates, ProviderGateway};
use crate::config::NetworkConfig;
use crate::error::{TxStatusError, TxStatusResult};
use crate::model::{NetworkId, TransactionHash};
use crate::tx::GasEstimator;

use async_trait::async_trait;
use ethers::providers::{Http, Middleware, Provider};
use ethers::types::Transaction;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Multi-provider wrapper with automatic failover
pub struct ChainProvider {
    /// Network configuration
    config: NetworkConfig,
    /// HTTP providers (multiple for failover)
    http_providers: Vec<Provider<Http>>,
    /// Current active provider index
    current_provider: AtomicUsize,
    /// Tier spread for gas estimates
    gas_estimator: GasEstimator,
}

impl ChainProvider {
    /// Create a new chain provider
    pub fn new(config: NetworkConfig, gas_estimator: GasEstimator) -> TxStatusResult<Self> {
        let mut http_providers = Vec::new();

        for url in &config.rpc_urls {
            match Provider::<Http>::try_from(url.as_str()) {
                Ok(provider) => {
                    let provider = provider.interval(Duration::from_millis(100));
                    http_providers.push(provider);
                    debug!("Added HTTP provider for network {}: {}", config.id, url);
                }
                Err(e) => {
                    warn!("Failed to create provider for {}: {}", url, e);
                }
            }
        }

        if http_providers.is_empty() {
            return Err(TxStatusError::ChainConnection {
                network: config.id.to_string(),
                message: "No valid RPC providers".to_string(),
            });
        }

        Ok(Self {
            config,
            http_providers,
            current_provider: AtomicUsize::new(0),
            gas_estimator,
        })
    }

    /// Check that a node answers before it is put to use
    pub async fn validate_node(network: &NetworkId, url: &str) -> TxStatusResult<u64> {
        let provider =
            Provider::<Http>::try_from(url).map_err(|e| TxStatusError::ChainConnection {
                network: network.to_string(),
                message: format!("Invalid node URL {}: {}", url, e),
            })?;

        provider
            .get_block_number()
            .await
            .map(|b| b.as_u64())
            .map_err(|e| TxStatusError::ChainConnection {
                network: network.to_string(),
                message: e.to_string(),
            })
    }

    /// Get the active HTTP provider
    pub fn http(&self) -> &Provider<Http> {
        let idx = self.current_provider.load(Ordering::Relaxed);
        &self.http_providers[idx % self.http_providers.len()]
    }

    /// Switch to next available provider
    pub fn failover(&self) {
        let current = self.current_provider.load(Ordering::Relaxed);
        let next = (current + 1) % self.http_providers.len();
        self.current_provider.store(next, Ordering::Relaxed);
        warn!("Network {} failover to provider {}", self.config.id, next);
    }

    fn connection_error(&self, message: &str) -> TxStatusError {
        TxStatusError::ChainConnection {
            network: self.config.id.to_string(),
            message: message.to_string(),
        }
    }

    fn to_fetched(&self, tx: Transaction, head: Option<u64>) -> FetchedTransaction {
        let block_number = tx.block_number.map(|b| b.as_u64());
        let confirmations = match (block_number, head) {
            (Some(included), Some(head)) => head.saturating_sub(included) + 1,
            (Some(_), None) => 1,
            (None, _) => 0,
        };

        FetchedTransaction {
            hash: tx.hash.into(),
            from: tx.from,
            to: tx.to,
            value: tx.value,
            gas_limit: tx.gas,
            gas_price: tx.gas_price,
            nonce: tx.nonce,
            chain_id: tx
                .chain_id
                .map(|c| c.as_u64())
                .or(Some(self.config.chain_id)),
            data: tx.input,
            block_number,
            confirmations,
        }
    }
}

#[async_trait]
impl ProviderGateway for ChainProvider {
    async fn get_transaction_by_hash(
        &self,
        hash: TransactionHash,
        full_detail: bool,
    ) -> TxStatusResult<Option<FetchedTransaction>> {
        let mut fetched = None;
        let mut found = false;

        for _ in 0..self.http_providers.len() {
            match self.http().get_transaction(hash.as_h256()).await {
                Ok(tx) => {
                    fetched = tx;
                    found = true;
                    break;
                }
                Err(e) => {
                    warn!(
                        "Failed to get transaction {} from network {}: {}",
                        hash, self.config.id, e
                    );
                    self.failover();
                }
            }
        }

        if !found {
            return Err(self.connection_error("All providers failed to get transaction"));
        }

        let Some(tx) = fetched else {
            return Ok(None);
        };

        let head = if full_detail && tx.block_number.is_some() {
            Some(self.get_current_block().await?)
        } else {
            None
        };

        Ok(Some(self.to_fetched(tx, head)))
    }

    async fn get_current_block(&self) -> TxStatusResult<u64> {
        for _ in 0..self.http_providers.len() {
            match self.http().get_block_number().await {
                Ok(block) => return Ok(block.as_u64()),
                Err(e) => {
                    warn!(
                        "Failed to get block number from network {}: {}",
                        self.config.id, e
                    );
                    self.failover();
                }
            }
        }

        Err(self.connection_error("All providers failed"))
    }

    async fn get_gas_price_estimates(&self) -> TxStatusResult<GasPriceEstimates> {
        for _ in 0..self.http_providers.len() {
            match self.http().get_gas_price().await {
                Ok(price) => {
                    return Ok(self
                        .gas_estimator
                        .estimates(price, self.config.max_gas_price_gwei));
                }
                Err(e) => {
                    warn!(
                        "Failed to get gas price from network {}: {}",
                        self.config.id, e
                    );
                    self.failover();
                }
            }
        }

        Err(TxStatusError::GasEstimation {
            network: self.config.id.to_string(),
            message: "All providers failed".to_string(),
        })
    }
}
