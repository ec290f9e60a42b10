//! Transaction hashes, configs and receipts

use super::account::{Asset, SenderAccount};
use super::network::NetworkId;
use crate::error::TxStatusError;

use chrono::{DateTime, Utc};
use ethers::types::{Address, Bytes, H256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A 32-byte transaction hash.
///
/// Parsing accepts either hex case; equality is on the bytes and the
/// canonical rendering is lowercase `0x`-prefixed hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionHash(H256);

impl TransactionHash {
    pub fn as_h256(&self) -> H256 {
        self.0
    }
}

impl From<H256> for TransactionHash {
    fn from(hash: H256) -> Self {
        Self(hash)
    }
}

impl FromStr for TransactionHash {
    type Err = TxStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .ok_or_else(|| TxStatusError::InvalidHash(s.to_string()))?;
        let bytes = hex::decode(digits).map_err(|_| TxStatusError::InvalidHash(s.to_string()))?;
        if bytes.len() != 32 {
            return Err(TxStatusError::InvalidHash(s.to_string()));
        }
        Ok(Self(H256::from_slice(&bytes)))
    }
}

impl fmt::Display for TransactionHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0.as_bytes()))
    }
}

/// Receipt status as classified by this service, not raw chain data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxStatus {
    Pending,
    Success,
    Failed,
    Unknown,
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TxStatus::Pending => "PENDING",
            TxStatus::Success => "SUCCESS",
            TxStatus::Failed => "FAILED",
            TxStatus::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxType {
    Standard,
    Approval,
    Swap,
    ContractInteraction,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Erc20Transfer {
    pub from: Address,
    pub to: Address,
    pub contract_address: Address,
    pub amount: U256,
}

/// A transaction previously recorded for a local account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedHistoryEntry {
    pub hash: TransactionHash,
    pub status: TxStatus,
    pub tx_type: TxType,
    pub asset: Asset,
    pub from: Address,
    #[serde(default)]
    pub to: Option<Address>,
    #[serde(default)]
    pub receiver_address: Option<Address>,
    pub value: U256,
    #[serde(default)]
    pub data: Bytes,
    pub nonce: U256,
    pub gas_limit: U256,
    pub gas_price: U256,
    #[serde(default)]
    pub block_number: Option<u64>,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub gas_used: Option<U256>,
    #[serde(default)]
    pub erc20_transfers: Vec<Erc20Transfer>,
}

/// The raw parameters of a transaction. Never mutated; replacements are
/// built as new values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransactionParameters {
    pub to: Option<Address>,
    pub from: Option<Address>,
    pub gas_limit: U256,
    pub gas_price: U256,
    pub nonce: U256,
    pub chain_id: u64,
    pub value: U256,
    pub data: Bytes,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionConfig {
    pub raw_transaction: Option<RawTransactionParameters>,
    pub sender_account: Option<SenderAccount>,
    pub from: Address,
    pub receiver_address: Option<Address>,
    pub amount: U256,
    pub network_id: NetworkId,
    pub asset: Option<Asset>,
    pub base_asset: Option<Asset>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub hash: TransactionHash,
    pub status: TxStatus,
    pub tx_type: TxType,
    pub from: Address,
    pub to: Option<Address>,
    pub receiver_address: Option<Address>,
    pub value: U256,
    pub nonce: U256,
    pub gas_limit: U256,
    pub gas_price: U256,
    pub block_number: Option<u64>,
    pub timestamp: Option<DateTime<Utc>>,
    pub gas_used: Option<U256>,
    pub confirmations: Option<u64>,
    pub erc20_transfers: Vec<Erc20Transfer>,
}

impl From<&CachedHistoryEntry> for TransactionReceipt {
    fn from(entry: &CachedHistoryEntry) -> Self {
        Self {
            hash: entry.hash,
            status: entry.status,
            tx_type: entry.tx_type,
            from: entry.from,
            to: entry.to,
            receiver_address: entry.receiver_address,
            value: entry.value,
            nonce: entry.nonce,
            gas_limit: entry.gas_limit,
            gas_price: entry.gas_price,
            block_number: entry.block_number,
            timestamp: entry.timestamp,
            gas_used: entry.gas_used,
            confirmations: None,
            erc20_transfers: entry.erc20_transfers.clone(),
        }
    }
}

/// A resolved transaction: what it does and where it stands
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionView {
    pub config: TransactionConfig,
    pub receipt: TransactionReceipt,
}

impl TransactionView {
    pub fn is_pending(&self) -> bool {
        self.receipt.status == TxStatus::Pending
    }
}
