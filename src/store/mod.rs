//! Read-only snapshot of the local account store
//!
//! Accounts (with their recorded history), assets and networks are owned by
//! an external store. This service loads them once and never writes back.

use crate::error::{TxStatusError, TxStatusResult};
use crate::model::{Asset, CachedHistoryEntry, Network, NetworkId, StoreAccount};

use serde::Deserialize;
use std::path::Path;

/// On-disk layout of the account store export
#[derive(Debug, Deserialize)]
struct StoreFile {
    #[serde(default)]
    accounts: Vec<StoreAccount>,
    #[serde(default)]
    assets: Vec<Asset>,
}

#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub accounts: Vec<StoreAccount>,
    pub assets: Vec<Asset>,
    pub networks: Vec<Network>,
}

impl StoreSnapshot {
    pub fn new(accounts: Vec<StoreAccount>, assets: Vec<Asset>, networks: Vec<Network>) -> Self {
        Self {
            accounts,
            assets,
            networks,
        }
    }

    /// Load accounts and assets from a JSON export; networks come from config
    pub fn load(path: &Path, networks: Vec<Network>) -> TxStatusResult<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| TxStatusError::Store(format!("Failed to read {:?}: {}", path, e)))?;
        let file: StoreFile = serde_json::from_str(&contents)?;

        Ok(Self::new(file.accounts, file.assets, networks))
    }

    pub fn network(&self, id: &NetworkId) -> Option<&Network> {
        self.networks.iter().find(|n| &n.id == id)
    }

    /// All recorded history across every account
    pub fn history(&self) -> impl Iterator<Item = &CachedHistoryEntry> {
        self.accounts.iter().flat_map(|a| a.transactions.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TxStatus, WalletId};

    const STORE_JSON: &str = r#"{
        "accounts": [{
            "uuid": "4ffb0d4a-adf3-1990-5eb9-fe78e613f70b",
            "label": "Ledger Account",
            "address": "0xfE5443FaC29fA621cFc33D41D1927fd0f5E0bB7c",
            "networkId": "Ropsten",
            "wallet": "LEDGER",
            "transactions": [{
                "hash": "0x5a2d3c9f0e3b4c6d7e8f90a1b2c3d4e5f60718293a4b5c6d7e8f9a0b1c2d3e4f",
                "status": "SUCCESS",
                "txType": "STANDARD",
                "asset": {
                    "uuid": "77de68da-ecd8-53ba-bbb5-8edb1c8e14d7",
                    "name": "Ropsten",
                    "ticker": "RopstenETH",
                    "networkId": "Ropsten",
                    "type": "base"
                },
                "from": "0xfE5443FaC29fA621cFc33D41D1927fd0f5E0bB7c",
                "to": "0xB2BB2b958aFA2e96dAb3F3Ce7162B87dAea39017",
                "value": "0xde0b6b3a7640000",
                "nonce": "0x2",
                "gasLimit": "0x5208",
                "gasPrice": "0x4a817c800",
                "blockNumber": 7654321,
                "timestamp": 1581530607
            }]
        }],
        "assets": []
    }"#;

    #[test]
    fn test_load_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, STORE_JSON).unwrap();

        let snapshot = StoreSnapshot::load(&path, vec![]).unwrap();

        assert_eq!(snapshot.accounts.len(), 1);
        assert_eq!(snapshot.accounts[0].wallet, WalletId::Ledger);
        let entries: Vec<_> = snapshot.history().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, TxStatus::Success);
        assert_eq!(entries[0].block_number, Some(7654321));
        assert!(entries[0].timestamp.is_some());
    }

    #[test]
    fn test_missing_file_is_a_store_error() {
        let result = StoreSnapshot::load(Path::new("/nonexistent/store.json"), vec![]);
        assert!(matches!(result, Err(TxStatusError::Store(_))));
    }
}
