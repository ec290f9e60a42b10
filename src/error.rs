//! Error types for the transaction status service

use thiserror::Error;

/// Main error type for status lookups and replacement building
#[derive(Error, Debug)]
pub enum TxStatusError {
    #[error("Store error: {0}")]
    Store(String),

    #[error("Chain connection error for network {network}: {message}")]
    ChainConnection { network: String, message: String },

    #[error("Gas estimation error for network {network}: {message}")]
    GasEstimation { network: String, message: String },

    #[error("Network {network} not found")]
    NetworkNotFound { network: String },

    #[error("No provider configured for network {network}")]
    NoGateway { network: String },

    #[error("Invalid transaction hash: {0}")]
    InvalidHash(String),

    #[error("Transaction is not pending (status {status})")]
    NotPending { status: String },

    #[error("Sender {address} is not a local account that accepts custom gas settings")]
    SenderNotEligible { address: String },

    #[error("Invalid state transition from {from} on {event}")]
    InvalidStateTransition { from: String, event: String },

    #[error("Stale response for request {request_id}")]
    StaleResponse { request_id: u64 },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TxStatusError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TxStatusError::ChainConnection { .. } | TxStatusError::GasEstimation { .. }
        )
    }
}

impl From<serde_json::Error> for TxStatusError {
    fn from(e: serde_json::Error) -> Self {
        TxStatusError::Store(e.to_string())
    }
}

/// Result type for status operations
pub type TxStatusResult<T> = Result<T, TxStatusError>;
