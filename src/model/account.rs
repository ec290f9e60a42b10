//! Local accounts and assets supplied by the account store

use super::network::NetworkId;
use super::transaction::CachedHistoryEntry;

use ethers::types::Address;
use serde::{Deserialize, Serialize};

/// Wallet kinds an account can be connected through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WalletId {
    Web3,
    Metamask,
    Coinbase,
    Frame,
    ViewOnly,
    #[serde(rename = "WALLETCONNECT")]
    WalletConnect,
    Ledger,
    LedgerNanoS,
    Trezor,
    Keystore,
    Mnemonic,
    PrivateKey,
}

/// Wallets that overwrite gas and nonce inputs on their own
const MANAGED_GAS_WALLETS: [WalletId; 6] = [
    WalletId::Web3,
    WalletId::Metamask,
    WalletId::Coinbase,
    WalletId::Frame,
    WalletId::ViewOnly,
    WalletId::WalletConnect,
];

impl WalletId {
    /// Whether a replacement with externally chosen gas price and nonce can be
    /// signed through this wallet
    pub fn supports_custom_gas(&self) -> bool {
        !MANAGED_GAS_WALLETS.contains(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Base,
    Erc20,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub uuid: String,
    pub name: String,
    pub ticker: String,
    pub network_id: NetworkId,
    #[serde(rename = "type")]
    pub kind: AssetKind,
    #[serde(default)]
    pub contract_address: Option<Address>,
    #[serde(default = "default_decimals")]
    pub decimals: u8,
}

fn default_decimals() -> u8 {
    18
}

/// An account known to the local store, with its recorded history
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreAccount {
    pub uuid: String,
    #[serde(default)]
    pub label: String,
    pub address: Address,
    pub network_id: NetworkId,
    pub wallet: WalletId,
    #[serde(default)]
    pub transactions: Vec<CachedHistoryEntry>,
}

impl StoreAccount {
    pub fn as_sender(&self) -> SenderAccount {
        SenderAccount {
            address: self.address,
            wallet: self.wallet,
        }
    }
}

/// Reference from a transaction config to the account that sent it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderAccount {
    pub address: Address,
    pub wallet: WalletId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_managed_wallets_are_denied() {
        assert!(!WalletId::Metamask.supports_custom_gas());
        assert!(!WalletId::WalletConnect.supports_custom_gas());
        assert!(!WalletId::ViewOnly.supports_custom_gas());
        assert!(WalletId::Ledger.supports_custom_gas());
        assert!(WalletId::PrivateKey.supports_custom_gas());
    }

    #[test]
    fn test_wallet_id_wire_names() {
        let w: WalletId = serde_json::from_str("\"WALLETCONNECT\"").unwrap();
        assert_eq!(w, WalletId::WalletConnect);
        let w: WalletId = serde_json::from_str("\"LEDGER_NANO_S\"").unwrap();
        assert_eq!(w, WalletId::LedgerNanoS);
    }
}
