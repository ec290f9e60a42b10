//! The capability surface the core consumes for network I/O

use crate::error::TxStatusResult;
use crate::model::TransactionHash;

use async_trait::async_trait;
use ethers::types::{Address, Bytes, U256};
#[cfg(test)]
use mockall::automock;
use serde::Serialize;

/// A transaction as returned by a node
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedTransaction {
    pub hash: TransactionHash,
    pub from: Address,
    pub to: Option<Address>,
    pub value: U256,
    pub gas_limit: U256,
    pub gas_price: Option<U256>,
    pub nonce: U256,
    pub chain_id: Option<u64>,
    pub data: Bytes,
    pub block_number: Option<u64>,
    /// Blocks on top of the including block, counting it; 0 while pending
    pub confirmations: u64,
}

/// Gas price tiers in wei
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GasPriceEstimates {
    pub slow: U256,
    pub average: U256,
    pub fast: U256,
}

/// Network I/O for a single network.
///
/// Every method is a suspension point for the status controller; nothing
/// else in the core awaits.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ProviderGateway: Send + Sync {
    /// Look a transaction up by hash. With `full_detail` the confirmation
    /// count is measured against the current head; without it an included
    /// transaction reports a single confirmation.
    async fn get_transaction_by_hash(
        &self,
        hash: TransactionHash,
        full_detail: bool,
    ) -> TxStatusResult<Option<FetchedTransaction>>;

    /// Current head block number
    async fn get_current_block(&self) -> TxStatusResult<u64>;

    /// Slow / average / fast gas price estimates
    async fn get_gas_price_estimates(&self) -> TxStatusResult<GasPriceEstimates>;
}
