//! Status controller state and its pure transition function

use super::link::DeepLink;
use crate::error::{TxStatusError, TxStatusResult};
use crate::model::{NetworkId, TransactionHash, TransactionView};
use crate::tx::ReplacementIntent;

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Idle,
    Fetching,
    Resolved,
    NotFound,
    Resubmitting,
    Cancelling,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// The in-flight operation. A single slot makes fetching, resubmitting and
/// cancelling mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Activity {
    #[default]
    None,
    Fetching,
    Resubmitting,
    Cancelling,
}

/// User-facing condition. Gateway failures and genuine absence both land on
/// `TxNotFound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatusNotice {
    TxNotFound,
}

impl fmt::Display for StatusNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusNotice::TxNotFound => f.write_str("Transaction not found"),
        }
    }
}

/// Identity of an issued fetch, used to drop results that no longer apply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub id: u64,
    pub hash: TransactionHash,
    pub network: NetworkId,
}

#[derive(Debug, Clone)]
pub enum Event {
    SetHash(String),
    SetNetwork(NetworkId),
    Fetch { from_link: bool },
    ResolveSuccess {
        request: FetchRequest,
        view: Option<TransactionView>,
    },
    ResolveError { request: FetchRequest },
    TriggerResubmit,
    ResubmitComplete,
    TriggerCancel,
    CancelComplete,
    Clear,
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::SetHash(_) => "SetHash",
            Event::SetNetwork(_) => "SetNetwork",
            Event::Fetch { .. } => "Fetch",
            Event::ResolveSuccess { .. } => "ResolveSuccess",
            Event::ResolveError { .. } => "ResolveError",
            Event::TriggerResubmit => "TriggerResubmit",
            Event::ResubmitComplete => "ResubmitComplete",
            Event::TriggerCancel => "TriggerCancel",
            Event::CancelComplete => "CancelComplete",
            Event::Clear => "Clear",
        }
    }
}

/// Side effect the runner must perform after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Resolve(FetchRequest),
    BuildReplacement(ReplacementIntent),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ControllerState {
    tx_hash: String,
    network_id: NetworkId,
    tx: Option<TransactionView>,
    activity: Activity,
    from_link: bool,
    error: Option<StatusNotice>,
    pending: Option<FetchRequest>,
    /// Survives `Clear` so request ids are never reused
    last_request_id: u64,
}

impl ControllerState {
    pub fn new(tx_hash: impl Into<String>, network_id: NetworkId) -> Self {
        Self {
            tx_hash: tx_hash.into(),
            network_id,
            tx: None,
            activity: Activity::None,
            from_link: false,
            error: None,
            pending: None,
            last_request_id: 0,
        }
    }

    pub fn from_link(link: &DeepLink) -> Self {
        Self::new(link.hash.clone(), link.network.clone())
    }

    pub fn tx_hash(&self) -> &str {
        &self.tx_hash
    }

    pub fn network_id(&self) -> &NetworkId {
        &self.network_id
    }

    pub fn tx(&self) -> Option<&TransactionView> {
        self.tx.as_ref()
    }

    pub fn fetching(&self) -> bool {
        self.activity == Activity::Fetching
    }

    pub fn resubmitting(&self) -> bool {
        self.activity == Activity::Resubmitting
    }

    pub fn cancelling(&self) -> bool {
        self.activity == Activity::Cancelling
    }

    pub fn arrived_via_link(&self) -> bool {
        self.from_link
    }

    pub fn error(&self) -> Option<StatusNotice> {
        self.error
    }

    pub fn pending_request(&self) -> Option<&FetchRequest> {
        self.pending.as_ref()
    }

    /// A link-opened view shows a full-page loader until something resolves
    pub fn full_page_loading(&self) -> bool {
        self.from_link && self.tx.is_none()
    }

    /// Input gating for Fetch
    pub fn is_hash_valid(&self) -> bool {
        self.tx_hash.parse::<TransactionHash>().is_ok()
    }

    pub fn link(&self) -> DeepLink {
        DeepLink::new(self.tx_hash.clone(), self.network_id.clone())
    }

    pub fn phase(&self) -> Phase {
        match self.activity {
            Activity::Fetching => Phase::Fetching,
            Activity::Resubmitting => Phase::Resubmitting,
            Activity::Cancelling => Phase::Cancelling,
            Activity::None if self.tx.is_some() => Phase::Resolved,
            Activity::None if self.error.is_some() => Phase::NotFound,
            Activity::None => Phase::Idle,
        }
    }
}

impl ControllerState {
    /// Forget the lookup made for the previous `(hash, network)` pair. An
    /// in-flight fetch for it goes stale; a replacement in progress keeps its
    /// activity until it completes.
    fn discard_lookup(&mut self) {
        if self.activity == Activity::Fetching {
            self.activity = Activity::None;
        }
        self.pending = None;
        self.tx = None;
        self.error = None;
        self.from_link = false;
    }
}

impl Default for ControllerState {
    fn default() -> Self {
        Self::new("", NetworkId::default())
    }
}

/// Result of applying an event
#[derive(Debug, Clone)]
pub struct Transition {
    pub state: ControllerState,
    pub effect: Option<Effect>,
}

impl Transition {
    fn to(state: ControllerState) -> Self {
        Self {
            state,
            effect: None,
        }
    }

    fn with_effect(state: ControllerState, effect: Effect) -> Self {
        Self {
            state,
            effect: Some(effect),
        }
    }
}

fn rejected(state: &ControllerState, event: &Event) -> TxStatusError {
    TxStatusError::InvalidStateTransition {
        from: state.phase().to_string(),
        event: event.name().to_string(),
    }
}

/// Apply `event` to `state`.
///
/// Pure: no I/O happens here. Events that are not legal in the current phase
/// are rejected and leave the caller's state untouched.
pub fn transition(state: &ControllerState, event: Event) -> TxStatusResult<Transition> {
    let mut next = state.clone();

    match event {
        Event::SetHash(hash) => {
            if hash != state.tx_hash {
                next.tx_hash = hash;
                next.discard_lookup();
            }
            Ok(Transition::to(next))
        }

        Event::SetNetwork(network) => {
            if network != state.network_id {
                next.network_id = network;
                next.discard_lookup();
            }
            Ok(Transition::to(next))
        }

        Event::Fetch { from_link } => {
            // A repeated Fetch restarts tracking; the earlier request goes stale
            let idle = matches!(state.activity, Activity::None | Activity::Fetching);
            if !idle || state.tx.is_some() {
                return Err(rejected(state, &Event::Fetch { from_link }));
            }
            let hash: TransactionHash = state.tx_hash.parse()?;

            let request = FetchRequest {
                id: state.last_request_id + 1,
                hash,
                network: state.network_id.clone(),
            };
            next.last_request_id = request.id;
            next.pending = Some(request.clone());
            next.activity = Activity::Fetching;
            next.from_link = from_link;
            Ok(Transition::with_effect(next, Effect::Resolve(request)))
        }

        Event::ResolveSuccess { request, view } => {
            if state.pending.as_ref() != Some(&request) {
                return Err(TxStatusError::StaleResponse {
                    request_id: request.id,
                });
            }
            next.activity = Activity::None;
            next.pending = None;
            next.error = match view {
                Some(_) => None,
                None => Some(StatusNotice::TxNotFound),
            };
            next.tx = view;
            next.from_link = false;
            Ok(Transition::to(next))
        }

        Event::ResolveError { request } => {
            if state.pending.as_ref() != Some(&request) {
                return Err(TxStatusError::StaleResponse {
                    request_id: request.id,
                });
            }
            next.activity = Activity::None;
            next.pending = None;
            next.error = Some(StatusNotice::TxNotFound);
            next.from_link = false;
            Ok(Transition::to(next))
        }

        Event::TriggerResubmit | Event::TriggerCancel => {
            let (activity, intent) = match event {
                Event::TriggerCancel => (Activity::Cancelling, ReplacementIntent::Cancel),
                _ => (Activity::Resubmitting, ReplacementIntent::Resubmit),
            };
            let tx = match (&state.activity, &state.tx) {
                (Activity::None, Some(tx)) => tx,
                _ => return Err(rejected(state, &event)),
            };
            if !tx.is_pending() {
                return Err(TxStatusError::NotPending {
                    status: tx.receipt.status.to_string(),
                });
            }
            next.activity = activity;
            Ok(Transition::with_effect(next, Effect::BuildReplacement(intent)))
        }

        Event::ResubmitComplete | Event::CancelComplete => {
            let expected = match event {
                Event::CancelComplete => Activity::Cancelling,
                _ => Activity::Resubmitting,
            };
            if state.activity != expected {
                return Err(rejected(state, &event));
            }
            next.activity = Activity::None;
            Ok(Transition::to(next))
        }

        Event::Clear => Ok(Transition::to(ControllerState {
            last_request_id: state.last_request_id,
            ..ControllerState::default()
        })),
    }
}
