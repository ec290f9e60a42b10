//! Building transaction configs and receipts from cached or fetched data

use crate::chain::FetchedTransaction;
use crate::model::{
    Asset, AssetKind, CachedHistoryEntry, Network, RawTransactionParameters, SenderAccount,
    TransactionConfig, TransactionReceipt, TransactionView, TxStatus, TxType,
};
use crate::store::StoreSnapshot;

use ethers::types::{Address, U256};

/// `transfer(address,uint256)`
const ERC20_TRANSFER_SELECTOR: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb];

/// Decode the recipient and amount of an ERC-20 `transfer` call
pub fn decode_erc20_transfer(data: &[u8]) -> Option<(Address, U256)> {
    if data.len() < 68 || data[..4] != ERC20_TRANSFER_SELECTOR {
        return None;
    }
    let recipient = Address::from_slice(&data[16..36]);
    let amount = U256::from_big_endian(&data[36..68]);
    Some((recipient, amount))
}

/// Classify a transaction fetched from a node. Inclusion alone does not tell
/// success from failure without a receipt lookup, so included transactions
/// are `Unknown`.
pub fn classify(confirmations: u64) -> TxStatus {
    if confirmations > 0 {
        TxStatus::Unknown
    } else {
        TxStatus::Pending
    }
}

fn find_sender(snapshot: &StoreSnapshot, from: Address, network: &Network) -> Option<SenderAccount> {
    snapshot
        .accounts
        .iter()
        .find(|a| a.address == from && a.network_id == network.id)
        .map(|a| a.as_sender())
}

fn base_asset(snapshot: &StoreSnapshot, network: &Network) -> Option<Asset> {
    snapshot
        .assets
        .iter()
        .find(|a| a.uuid == network.base_asset)
        .cloned()
}

fn token_at(snapshot: &StoreSnapshot, contract: Address, network: &Network) -> Option<Asset> {
    snapshot
        .assets
        .iter()
        .find(|a| {
            a.kind == AssetKind::Erc20
                && a.network_id == network.id
                && a.contract_address == Some(contract)
        })
        .cloned()
}

/// View for a cache hit; the entry already carries its status
pub fn view_from_history(
    entry: &CachedHistoryEntry,
    snapshot: &StoreSnapshot,
    network: &Network,
) -> TransactionView {
    let transfer = match entry.asset.kind {
        AssetKind::Erc20 => decode_erc20_transfer(&entry.data),
        AssetKind::Base => None,
    };
    let (receiver_address, amount) = match transfer {
        Some((recipient, amount)) => (Some(recipient), amount),
        None => (entry.receiver_address.or(entry.to), entry.value),
    };

    let config = TransactionConfig {
        raw_transaction: Some(RawTransactionParameters {
            to: entry.to,
            from: Some(entry.from),
            gas_limit: entry.gas_limit,
            gas_price: entry.gas_price,
            nonce: entry.nonce,
            chain_id: network.chain_id,
            value: entry.value,
            data: entry.data.clone(),
        }),
        sender_account: find_sender(snapshot, entry.from, network),
        from: entry.from,
        receiver_address,
        amount,
        network_id: network.id.clone(),
        asset: Some(entry.asset.clone()),
        base_asset: base_asset(snapshot, network),
    };

    TransactionView {
        config,
        receipt: TransactionReceipt::from(entry),
    }
}

/// View for a transaction fetched from the node
pub fn view_from_fetched(
    tx: &FetchedTransaction,
    snapshot: &StoreSnapshot,
    network: &Network,
) -> TransactionView {
    let base = base_asset(snapshot, network);
    let token_transfer = tx.to.and_then(|to| {
        let token = token_at(snapshot, to, network)?;
        let (recipient, amount) = decode_erc20_transfer(&tx.data)?;
        Some((token, recipient, amount))
    });

    let (asset, receiver_address, amount) = match token_transfer {
        Some((token, recipient, amount)) => (Some(token), Some(recipient), amount),
        None => (base.clone(), tx.to, tx.value),
    };

    let gas_price = tx.gas_price.unwrap_or_default();

    let config = TransactionConfig {
        raw_transaction: Some(RawTransactionParameters {
            to: tx.to,
            from: Some(tx.from),
            gas_limit: tx.gas_limit,
            gas_price,
            nonce: tx.nonce,
            chain_id: tx.chain_id.unwrap_or(network.chain_id),
            value: tx.value,
            data: tx.data.clone(),
        }),
        sender_account: find_sender(snapshot, tx.from, network),
        from: tx.from,
        receiver_address,
        amount,
        network_id: network.id.clone(),
        asset,
        base_asset: base,
    };

    let receipt = TransactionReceipt {
        hash: tx.hash,
        status: classify(tx.confirmations),
        tx_type: TxType::Unknown,
        from: tx.from,
        to: tx.to,
        receiver_address,
        value: tx.value,
        nonce: tx.nonce,
        gas_limit: tx.gas_limit,
        gas_price,
        block_number: tx.block_number,
        timestamp: None,
        gas_used: None,
        confirmations: Some(tx.confirmations),
        erc20_transfers: Vec::new(),
    };

    TransactionView { config, receipt }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NetworkId, StoreAccount, WalletId};
    use ethers::types::{Bytes, H256};

    fn network() -> Network {
        Network {
            id: NetworkId::new("Ropsten"),
            name: "Ropsten".to_string(),
            chain_id: 3,
            base_asset: "ropsten-eth".to_string(),
        }
    }

    fn token_contract() -> Address {
        "0xad6d458402f60fd3bd25163575031acdce07538d".parse().unwrap()
    }

    fn snapshot(sender: Address) -> StoreSnapshot {
        let assets = vec![
            Asset {
                uuid: "ropsten-eth".to_string(),
                name: "Ropsten".to_string(),
                ticker: "RopstenETH".to_string(),
                network_id: NetworkId::new("Ropsten"),
                kind: AssetKind::Base,
                contract_address: None,
                decimals: 18,
            },
            Asset {
                uuid: "ropdai".to_string(),
                name: "RopDAI".to_string(),
                ticker: "RopDAI".to_string(),
                network_id: NetworkId::new("Ropsten"),
                kind: AssetKind::Erc20,
                contract_address: Some(token_contract()),
                decimals: 18,
            },
        ];
        let accounts = vec![StoreAccount {
            uuid: "acc-1".to_string(),
            label: "Ledger Account".to_string(),
            address: sender,
            network_id: NetworkId::new("Ropsten"),
            wallet: WalletId::Ledger,
            transactions: vec![],
        }];
        StoreSnapshot::new(accounts, assets, vec![network()])
    }

    fn transfer_calldata(recipient: Address, amount: U256) -> Bytes {
        let mut data = ERC20_TRANSFER_SELECTOR.to_vec();
        data.extend_from_slice(H256::from(recipient).as_bytes());
        let mut word = [0u8; 32];
        amount.to_big_endian(&mut word);
        data.extend_from_slice(&word);
        data.into()
    }

    fn fetched(from: Address, to: Address, data: Bytes, confirmations: u64) -> FetchedTransaction {
        FetchedTransaction {
            hash: H256::repeat_byte(0xab).into(),
            from,
            to: Some(to),
            value: U256::zero(),
            gas_limit: U256::from(60_000),
            gas_price: Some(U256::from(1_000_000_000u64)),
            nonce: U256::from(9),
            chain_id: None,
            data,
            block_number: None,
            confirmations,
        }
    }

    #[test]
    fn test_classification_by_confirmations() {
        assert_eq!(classify(0), TxStatus::Pending);
        assert_eq!(classify(1), TxStatus::Unknown);
        assert_eq!(classify(250), TxStatus::Unknown);
    }

    #[test]
    fn test_decode_rejects_other_calls() {
        assert!(decode_erc20_transfer(&[]).is_none());
        assert!(decode_erc20_transfer(&[0x09, 0x5e, 0xa7, 0xb3]).is_none());
    }

    #[test]
    fn test_fetched_token_transfer_uses_token_asset() {
        let sender = Address::repeat_byte(0x01);
        let recipient = Address::repeat_byte(0x02);
        let data = transfer_calldata(recipient, U256::from(5_000u64));
        let tx = fetched(sender, token_contract(), data, 0);

        let view = view_from_fetched(&tx, &snapshot(sender), &network());

        assert_eq!(view.config.asset.as_ref().unwrap().ticker, "RopDAI");
        assert_eq!(view.config.receiver_address, Some(recipient));
        assert_eq!(view.config.amount, U256::from(5_000u64));
        assert_eq!(view.config.raw_transaction.as_ref().unwrap().chain_id, 3);
        assert_eq!(
            view.config.sender_account,
            Some(SenderAccount {
                address: sender,
                wallet: WalletId::Ledger
            })
        );
        assert_eq!(view.receipt.status, TxStatus::Pending);
        assert_eq!(view.receipt.tx_type, TxType::Unknown);
    }

    #[test]
    fn test_fetched_plain_transfer_uses_base_asset() {
        let sender = Address::repeat_byte(0x01);
        let recipient = Address::repeat_byte(0x03);
        let tx = fetched(Address::repeat_byte(0x07), recipient, Bytes::default(), 3);

        let view = view_from_fetched(&tx, &snapshot(sender), &network());

        assert_eq!(view.config.asset.as_ref().unwrap().ticker, "RopstenETH");
        assert_eq!(view.config.receiver_address, Some(recipient));
        assert!(view.config.sender_account.is_none());
        assert_eq!(view.receipt.status, TxStatus::Unknown);
    }
}
