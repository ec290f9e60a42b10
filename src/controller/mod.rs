//! Status controller - sequences resolution, resubmission and cancellation
//!
//! Decisions live in the pure `transition` function; `StatusController` is
//! the effect runner that awaits the resolver and gateways and feeds the
//! results back in as events. Every I/O failure becomes an event; nothing
//! escapes as an error.

pub mod link;
pub mod state;

pub use link::DeepLink;
pub use state::{transition, ControllerState, Effect, Event, FetchRequest, Phase, StatusNotice};

use crate::chain::GatewayRegistry;
use crate::error::TxStatusError;
use crate::metrics;
use crate::model::NetworkId;
use crate::resolver::TransactionResolver;
use crate::store::StoreSnapshot;
use crate::tx::{QueryBuilder, ReplacementIntent, ReplacementParameters};

use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Owns the state of one open status view. Not shared between views.
pub struct StatusController {
    state: ControllerState,
    location: String,
    resolver: Arc<TransactionResolver>,
    gateways: Arc<GatewayRegistry>,
    snapshot: Arc<StoreSnapshot>,
}

impl StatusController {
    /// Open a view from link parameters
    pub fn open(
        link: DeepLink,
        resolver: Arc<TransactionResolver>,
        gateways: Arc<GatewayRegistry>,
        snapshot: Arc<StoreSnapshot>,
    ) -> Self {
        Self {
            state: ControllerState::from_link(&link),
            location: link.location(),
            resolver,
            gateways,
            snapshot,
        }
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    /// Current deep-link location of the view
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Apply an event, returning the effect the caller must run
    pub fn dispatch(&mut self, event: Event) -> Option<Effect> {
        let name = event.name();
        match transition(&self.state, event) {
            Ok(t) => {
                let link = t.state.link();
                if link != self.state.link() {
                    self.location = link.location();
                }
                self.state = t.state;
                t.effect
            }
            Err(TxStatusError::StaleResponse { request_id }) => {
                debug!("Dropping stale result for request {}", request_id);
                None
            }
            Err(e) => {
                debug!("Rejected {} in {}: {}", name, self.state.phase(), e);
                metrics::record_rejected_transition(name);
                None
            }
        }
    }

    pub fn set_hash(&mut self, hash: impl Into<String>) {
        self.dispatch(Event::SetHash(hash.into()));
    }

    pub fn set_network(&mut self, network: NetworkId) {
        self.dispatch(Event::SetNetwork(network));
    }

    pub fn clear(&mut self) {
        self.dispatch(Event::Clear);
    }

    /// Fetch on load when the link already carries a hash
    pub async fn start(&mut self) {
        if !self.state.tx_hash().is_empty() {
            info!(
                "Opened from link: {} on {}",
                self.state.tx_hash(),
                self.state.network_id()
            );
            self.fetch(true).await;
        }
    }

    pub async fn fetch(&mut self, from_link: bool) {
        if let Some(request) = self.begin_fetch(from_link) {
            let event = self.resolve_task(request).await;
            self.dispatch(event);
        }
    }

    /// Issue a Fetch, returning the request to resolve
    pub fn begin_fetch(&mut self, from_link: bool) -> Option<FetchRequest> {
        match self.dispatch(Event::Fetch { from_link })? {
            Effect::Resolve(request) => Some(request),
            Effect::BuildReplacement(_) => None,
        }
    }

    /// Resolution for `request`, detached from `self` so the view can keep
    /// taking events while it is in flight
    pub fn resolve_task(&self, request: FetchRequest) -> impl Future<Output = Event> + Send + 'static {
        let resolver = self.resolver.clone();
        let snapshot = self.snapshot.clone();

        async move {
            let result = resolver
                .resolve(request.hash, &request.network, &snapshot)
                .await;
            match result {
                Ok(view) => Event::ResolveSuccess { request, view },
                Err(e) => {
                    warn!(
                        "Resolution of {} on {} failed: {}",
                        request.hash, request.network, e
                    );
                    Event::ResolveError { request }
                }
            }
        }
    }

    /// Whether speed-up and cancel are offered for the resolved transaction
    pub fn replacement_offered(&self) -> bool {
        self.state
            .tx()
            .map(|view| QueryBuilder::ensure_replaceable(view, &self.snapshot.accounts).is_ok())
            .unwrap_or(false)
    }

    /// Speed up the pending transaction
    pub async fn resubmit(&mut self) -> Option<ReplacementParameters> {
        self.replace(ReplacementIntent::Resubmit).await
    }

    /// Cancel the pending transaction
    pub async fn cancel(&mut self) -> Option<ReplacementParameters> {
        self.replace(ReplacementIntent::Cancel).await
    }

    async fn replace(&mut self, intent: ReplacementIntent) -> Option<ReplacementParameters> {
        let view = self.state.tx()?;
        if let Err(e) = QueryBuilder::ensure_replaceable(view, &self.snapshot.accounts) {
            debug!("{} not offered: {}", intent, e);
            return None;
        }

        let (trigger, complete) = match intent {
            ReplacementIntent::Resubmit => (Event::TriggerResubmit, Event::ResubmitComplete),
            ReplacementIntent::Cancel => (Event::TriggerCancel, Event::CancelComplete),
        };

        let params = match self.dispatch(trigger) {
            Some(Effect::BuildReplacement(intent)) => self.build_replacement(intent).await,
            _ => return None,
        };

        self.dispatch(complete);
        params
    }

    async fn build_replacement(&self, intent: ReplacementIntent) -> Option<ReplacementParameters> {
        let view = self.state.tx()?;
        let network = &view.config.network_id;

        let gateway = match self.gateways.get(network) {
            Ok(gateway) => gateway,
            Err(e) => {
                warn!("Cannot price {} on {}: {}", intent, network, e);
                return None;
            }
        };

        let estimates = match gateway.get_gas_price_estimates().await {
            Ok(estimates) => estimates,
            Err(e) => {
                warn!("Gas price estimate for {} on {} failed: {}", intent, network, e);
                metrics::record_gateway_error(network, "get_gas_price_estimates");
                return None;
            }
        };

        match QueryBuilder::build(&view.config, intent, estimates.fast) {
            Some(params) => {
                info!(
                    "Built {} for {} at nonce {} with gas price {}",
                    intent, view.receipt.hash, params.nonce, params.gas_price
                );
                metrics::record_replacement(network, intent.as_str());
                Some(params)
            }
            None => {
                warn!("Transaction {} has no raw parameters to replace", view.receipt.hash);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{GasPriceEstimates, MockProviderGateway};
    use crate::model::{TxStatus, WalletId};
    use crate::resolver::tests::{
        cached_entry, pending_fetched, recipient, registry_with, sender, snapshot_with,
        CACHED_HASH, PENDING_HASH,
    };
    use ethers::types::U256;

    fn fast() -> U256 {
        U256::from(90_000_000_000u64)
    }

    fn gas_estimates() -> GasPriceEstimates {
        GasPriceEstimates {
            slow: U256::from(20_000_000_000u64),
            average: U256::from(40_000_000_000u64),
            fast: fast(),
        }
    }

    fn controller(
        gateway: MockProviderGateway,
        snapshot: StoreSnapshot,
        link: DeepLink,
    ) -> StatusController {
        let gateways = registry_with(gateway);
        let resolver = Arc::new(TransactionResolver::new(gateways.clone()));
        StatusController::open(link, resolver, gateways, Arc::new(snapshot))
    }

    fn pending_gateway() -> MockProviderGateway {
        let mut gateway = MockProviderGateway::new();
        gateway
            .expect_get_transaction_by_hash()
            .returning(|_, _| Ok(Some(pending_fetched())));
        gateway
            .expect_get_gas_price_estimates()
            .returning(|| Ok(gas_estimates()));
        gateway
    }

    #[tokio::test]
    async fn test_pending_on_chain_resolves() {
        let mut c = controller(
            pending_gateway(),
            snapshot_with(WalletId::Ledger, vec![]),
            DeepLink::new(PENDING_HASH, NetworkId::new("Ethereum")),
        );

        c.start().await;

        assert_eq!(c.state().phase(), Phase::Resolved);
        assert_eq!(c.state().tx().unwrap().receipt.status, TxStatus::Pending);
        assert!(c.replacement_offered());
    }

    #[tokio::test]
    async fn test_start_without_hash_stays_idle() {
        let mut gateway = MockProviderGateway::new();
        gateway.expect_get_transaction_by_hash().never();
        let mut c = controller(
            gateway,
            snapshot_with(WalletId::Ledger, vec![]),
            DeepLink::default(),
        );

        c.start().await;

        assert_eq!(c.state().phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn test_absent_everywhere_is_not_found() {
        let mut gateway = MockProviderGateway::new();
        gateway
            .expect_get_transaction_by_hash()
            .returning(|_, _| Ok(None));
        let mut c = controller(
            gateway,
            snapshot_with(WalletId::Ledger, vec![]),
            DeepLink::default(),
        );

        c.set_hash(PENDING_HASH);
        c.fetch(false).await;

        assert_eq!(c.state().phase(), Phase::NotFound);
        assert!(c.state().tx().is_none());
        assert_eq!(c.state().error(), Some(StatusNotice::TxNotFound));
    }

    #[tokio::test]
    async fn test_gateway_failure_folds_into_not_found() {
        let mut gateway = MockProviderGateway::new();
        gateway.expect_get_transaction_by_hash().returning(|_, _| {
            Err(TxStatusError::ChainConnection {
                network: "Ethereum".to_string(),
                message: "503".to_string(),
            })
        });
        let mut c = controller(
            gateway,
            snapshot_with(WalletId::Ledger, vec![]),
            DeepLink::new(PENDING_HASH, NetworkId::default()),
        );

        c.start().await;

        assert_eq!(c.state().phase(), Phase::NotFound);
        assert!(!c.state().fetching());
    }

    #[tokio::test]
    async fn test_result_after_clear_is_ignored() {
        let mut c = controller(
            pending_gateway(),
            snapshot_with(WalletId::Ledger, vec![]),
            DeepLink::new(PENDING_HASH, NetworkId::default()),
        );

        let request = c.begin_fetch(true).unwrap();
        let task = c.resolve_task(request);
        c.clear();
        let event = task.await;
        c.dispatch(event);

        assert_eq!(c.state().phase(), Phase::Idle);
        assert!(c.state().tx().is_none());
        assert_eq!(c.state().tx_hash(), "");
    }

    #[tokio::test]
    async fn test_result_for_edited_hash_is_ignored() {
        let mut gateway = MockProviderGateway::new();
        gateway
            .expect_get_transaction_by_hash()
            .returning(|_, _| Ok(None));
        let mut c = controller(
            gateway,
            snapshot_with(WalletId::Ledger, vec![]),
            DeepLink::new(PENDING_HASH, NetworkId::default()),
        );

        let request = c.begin_fetch(true).unwrap();
        let task = c.resolve_task(request);
        c.set_hash(CACHED_HASH);
        let event = task.await;
        c.dispatch(event);

        assert_eq!(c.state().phase(), Phase::Idle);
        assert!(c.state().error().is_none());
        assert_eq!(c.state().tx_hash(), CACHED_HASH);
    }

    #[tokio::test]
    async fn test_location_tracks_hash_and_network() {
        let mut c = controller(
            pending_gateway(),
            snapshot_with(WalletId::Ledger, vec![]),
            DeepLink::default(),
        );

        c.set_hash(PENDING_HASH);
        assert_eq!(c.location(), format!("/tx-status/?hash={}", PENDING_HASH));

        c.set_network(NetworkId::new("Goerli"));
        assert_eq!(
            c.location(),
            format!("/tx-status/?hash={}&network=Goerli", PENDING_HASH)
        );
    }

    #[tokio::test]
    async fn test_cancel_produces_self_send() {
        let mut c = controller(
            pending_gateway(),
            snapshot_with(WalletId::Ledger, vec![]),
            DeepLink::new(PENDING_HASH, NetworkId::default()),
        );
        c.start().await;

        let params = c.cancel().await.unwrap();

        assert_eq!(params.to, Some(sender()));
        assert_eq!(params.from, sender());
        assert_eq!(params.value, U256::zero());
        assert_eq!(params.gas_limit, U256::from(21_000));
        assert_eq!(params.nonce, U256::from(3));
        assert_eq!(params.gas_price, fast());
        assert_eq!(c.state().phase(), Phase::Resolved);
    }

    #[tokio::test]
    async fn test_resubmit_keeps_original_effect() {
        let mut c = controller(
            pending_gateway(),
            snapshot_with(WalletId::Ledger, vec![]),
            DeepLink::new(PENDING_HASH, NetworkId::default()),
        );
        c.start().await;
        let before = c.state().tx().cloned();

        let params = c.resubmit().await.unwrap();

        assert_eq!(params.to, Some(recipient()));
        assert_eq!(params.value, U256::from(5));
        assert_eq!(params.data.to_vec(), vec![0xde, 0xad]);
        assert_eq!(params.gas_price, fast());
        assert_eq!(c.state().tx().cloned(), before);
        assert_eq!(c.state().phase(), Phase::Resolved);
    }

    #[tokio::test]
    async fn test_managed_wallet_gets_no_replacement() {
        let mut gateway = MockProviderGateway::new();
        gateway
            .expect_get_transaction_by_hash()
            .returning(|_, _| Ok(Some(pending_fetched())));
        gateway.expect_get_gas_price_estimates().never();
        let mut c = controller(
            gateway,
            snapshot_with(WalletId::WalletConnect, vec![]),
            DeepLink::new(PENDING_HASH, NetworkId::default()),
        );
        c.start().await;

        assert!(!c.replacement_offered());
        assert!(c.resubmit().await.is_none());
        assert_eq!(c.state().phase(), Phase::Resolved);
    }

    #[tokio::test]
    async fn test_settled_cached_tx_gets_no_replacement() {
        let mut gateway = MockProviderGateway::new();
        gateway.expect_get_transaction_by_hash().never();
        gateway.expect_get_gas_price_estimates().never();
        let mut c = controller(
            gateway,
            snapshot_with(WalletId::Ledger, vec![cached_entry(TxStatus::Success)]),
            DeepLink::new(CACHED_HASH, NetworkId::default()),
        );
        c.start().await;

        assert_eq!(c.state().phase(), Phase::Resolved);
        assert!(c.cancel().await.is_none());
        assert_eq!(c.state().phase(), Phase::Resolved);
    }

    #[tokio::test]
    async fn test_gas_failure_returns_to_resolved() {
        let mut gateway = MockProviderGateway::new();
        gateway
            .expect_get_transaction_by_hash()
            .returning(|_, _| Ok(Some(pending_fetched())));
        gateway.expect_get_gas_price_estimates().returning(|| {
            Err(TxStatusError::GasEstimation {
                network: "Ethereum".to_string(),
                message: "rate limited".to_string(),
            })
        });
        let mut c = controller(
            gateway,
            snapshot_with(WalletId::Ledger, vec![]),
            DeepLink::new(PENDING_HASH, NetworkId::default()),
        );
        c.start().await;

        assert!(c.resubmit().await.is_none());
        assert_eq!(c.state().phase(), Phase::Resolved);
        assert!(!c.state().resubmitting());
    }
}
