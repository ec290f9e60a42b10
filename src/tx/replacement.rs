//! Replacement queries for speeding up or cancelling a pending transaction
//!
//! A replacement reuses the pending transaction's nonce so that whichever
//! one is mined first voids the other. The query is handed to an external
//! send flow; nothing here signs or broadcasts.

use super::gas::{to_hex_quantity, TRANSFER_GAS_LIMIT};
use crate::error::{TxStatusError, TxStatusResult};
use crate::model::{StoreAccount, TransactionConfig, TransactionView};

use ethers::types::{Address, Bytes, U256};
use ethers::utils::to_checksum;
use serde::Serialize;
use std::fmt;
use url::form_urlencoded;

/// Route of the external compose/send view
pub const SEND_PATH: &str = "/send";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplacementIntent {
    /// Same transaction at a higher gas price
    Resubmit,
    /// Zero-value self-send at the same nonce
    Cancel,
}

impl ReplacementIntent {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplacementIntent::Resubmit => "resubmit",
            ReplacementIntent::Cancel => "cancel",
        }
    }
}

impl fmt::Display for ReplacementIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplacementParameters {
    pub from: Address,
    #[serde(rename = "type")]
    pub intent: ReplacementIntent,
    pub to: Option<Address>,
    pub gas_limit: U256,
    pub nonce: U256,
    pub chain_id: u64,
    pub value: U256,
    pub data: Bytes,
    pub gas_price: U256,
}

impl ReplacementParameters {
    /// Flat key/value form expected by the send flow
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("from", to_checksum(&self.from, None)),
            ("type", self.intent.to_string()),
            ("to", self.to.map(|to| to_checksum(&to, None)).unwrap_or_default()),
            ("gasLimit", to_hex_quantity(self.gas_limit)),
            ("nonce", to_hex_quantity(self.nonce)),
            ("chainId", self.chain_id.to_string()),
            ("value", to_hex_quantity(self.value)),
            ("data", format!("0x{}", hex::encode(&self.data))),
            ("gasPrice", to_hex_quantity(self.gas_price)),
        ]
    }

    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query_pairs())
            .finish()
    }

    /// Location of the send flow prefilled with this replacement
    pub fn send_location(&self) -> String {
        format!("{}/?{}", SEND_PATH, self.to_query_string())
    }
}

/// Derives replacement parameters from a resolved transaction
pub struct QueryBuilder;

impl QueryBuilder {
    /// Build a replacement priced at `fast_gas_price`.
    ///
    /// Returns `None` when the config carries no raw parameters to copy.
    pub fn build(
        config: &TransactionConfig,
        intent: ReplacementIntent,
        fast_gas_price: U256,
    ) -> Option<ReplacementParameters> {
        let raw = config.raw_transaction.as_ref()?;
        let from = raw
            .from
            .or(config.sender_account.map(|s| s.address))
            .unwrap_or(config.from);

        let base = ReplacementParameters {
            from,
            intent,
            to: raw.to,
            gas_limit: raw.gas_limit,
            nonce: raw.nonce,
            chain_id: raw.chain_id,
            value: raw.value,
            data: raw.data.clone(),
            gas_price: fast_gas_price,
        };

        Some(match intent {
            ReplacementIntent::Resubmit => base,
            ReplacementIntent::Cancel => ReplacementParameters {
                to: Some(from),
                value: U256::zero(),
                gas_limit: U256::from(TRANSFER_GAS_LIMIT),
                ..base
            },
        })
    }

    /// Check that a speed-up or cancel can be offered for `view`, returning
    /// the local account that would sign it
    pub fn ensure_replaceable<'a>(
        view: &TransactionView,
        accounts: &'a [StoreAccount],
    ) -> TxStatusResult<&'a StoreAccount> {
        if !view.is_pending() {
            return Err(TxStatusError::NotPending {
                status: view.receipt.status.to_string(),
            });
        }

        let sender = view.config.sender_account.map(|s| s.address);
        accounts
            .iter()
            .find(|a| Some(a.address) == sender && a.wallet.supports_custom_gas())
            .ok_or_else(|| TxStatusError::SenderNotEligible {
                address: to_checksum(&sender.unwrap_or(view.config.from), None),
            })
    }
}
