//! Network identifiers and the supported-network allow-list

use serde::{Deserialize, Serialize};
use std::fmt;

/// Networks a status lookup may target
pub const SUPPORTED_NETWORKS: [&str; 5] = ["Ethereum", "Ropsten", "Goerli", "Kovan", "ETC"];

/// Network used when a link names none or an unsupported one
pub const DEFAULT_NETWORK: &str = "Ethereum";

/// Identifies the chain a hash belongs to.
///
/// The same hash on two networks is two different transactions, so every
/// lookup key is a `(TransactionHash, NetworkId)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkId(String);

impl NetworkId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_NETWORK
    }

    pub fn is_supported(&self) -> bool {
        SUPPORTED_NETWORKS.contains(&self.0.as_str())
    }

    /// Read a network from a link parameter, re-defaulting when it is
    /// missing or not on the allow-list
    pub fn from_link_param(value: Option<&str>) -> Self {
        match value {
            Some(v) if SUPPORTED_NETWORKS.contains(&v) => Self::new(v),
            _ => Self::default(),
        }
    }
}

impl Default for NetworkId {
    fn default() -> Self {
        Self::new(DEFAULT_NETWORK)
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A configured network as seen by the resolver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    pub id: NetworkId,
    pub name: String,
    pub chain_id: u64,
    /// UUID of the network's base asset
    pub base_asset: String,
}
