//! Transaction resolution - turning a `(hash, network)` pair into a view
//!
//! Resolution is a two-stage lookup. The local history cache is consulted
//! first and unconditionally; only on a miss does the resolver await the
//! network's `ProviderGateway`.

pub mod builder;

use builder::{view_from_fetched, view_from_history};

use crate::chain::GatewayRegistry;
use crate::error::{TxStatusError, TxStatusResult};
use crate::metrics::{self, ResolutionSource};
use crate::model::{CachedHistoryEntry, NetworkId, TransactionHash, TransactionView};
use crate::store::StoreSnapshot;

use std::sync::Arc;
use tracing::{debug, error, warn};

/// Find a recorded transaction by hash on a network.
///
/// Linear over all history of all accounts; both the hash and the entry's
/// asset network must match.
pub fn find_cached<'a>(
    snapshot: &'a StoreSnapshot,
    hash: &TransactionHash,
    network: &NetworkId,
) -> Option<&'a CachedHistoryEntry> {
    snapshot
        .history()
        .find(|entry| &entry.hash == hash && &entry.asset.network_id == network)
}

pub struct TransactionResolver {
    gateways: Arc<GatewayRegistry>,
}

impl TransactionResolver {
    pub fn new(gateways: Arc<GatewayRegistry>) -> Self {
        Self { gateways }
    }

    /// Resolve a transaction, or `None` when neither the cache nor the node
    /// knows it
    pub async fn resolve(
        &self,
        hash: TransactionHash,
        network_id: &NetworkId,
        snapshot: &StoreSnapshot,
    ) -> TxStatusResult<Option<TransactionView>> {
        let network = snapshot
            .network(network_id)
            .ok_or_else(|| TxStatusError::NetworkNotFound {
                network: network_id.to_string(),
            })?;

        if let Some(entry) = find_cached(snapshot, &hash, network_id) {
            debug!("Resolved {} on {} from history cache", hash, network_id);
            metrics::record_resolution(network_id, ResolutionSource::Cache);
            return Ok(Some(view_from_history(entry, snapshot, network)));
        }

        let gateway = self.gateways.get(network_id)?;
        let fetched = gateway
            .get_transaction_by_hash(hash, true)
            .await
            .map_err(|e| {
                if e.is_retryable() {
                    warn!("Gateway lookup of {} on {} failed: {}", hash, network_id, e);
                } else {
                    error!("Gateway lookup of {} on {} failed: {}", hash, network_id, e);
                }
                metrics::record_gateway_error(network_id, "get_transaction_by_hash");
                e
            })?;

        match fetched {
            Some(tx) => {
                debug!(
                    "Resolved {} on {} from node ({} confirmations)",
                    hash, network_id, tx.confirmations
                );
                metrics::record_resolution(network_id, ResolutionSource::Chain);
                Ok(Some(view_from_fetched(&tx, snapshot, network)))
            }
            None => {
                debug!("Transaction {} not found on {}", hash, network_id);
                metrics::record_resolution(network_id, ResolutionSource::Absent);
                Ok(None)
            }
        }
    }
}
