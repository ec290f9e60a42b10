//! Shared data model for status lookups

pub mod account;
pub mod network;
pub mod transaction;

pub use account::{Asset, AssetKind, SenderAccount, StoreAccount, WalletId};
pub use network::{Network, NetworkId, SUPPORTED_NETWORKS};
pub use transaction::{
    CachedHistoryEntry, RawTransactionParameters, TransactionConfig, TransactionHash,
    TransactionReceipt, TransactionView, TxStatus, TxType,
};
