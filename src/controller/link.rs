//! Deep-link parameters for the status view

use crate::model::NetworkId;

use url::form_urlencoded;

/// Route of the status view
pub const TX_STATUS_PATH: &str = "/tx-status";

/// `hash` and `network` as carried in a shared link
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeepLink {
    pub hash: String,
    pub network: NetworkId,
}

impl DeepLink {
    pub fn new(hash: impl Into<String>, network: NetworkId) -> Self {
        Self {
            hash: hash.into(),
            network,
        }
    }

    /// Parse a query string (leading `?` optional). Missing or unsupported
    /// networks fall back to the default.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut hash = None;
        let mut network = None;

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "hash" if hash.is_none() => hash = Some(value.into_owned()),
                "network" if network.is_none() => network = Some(value.into_owned()),
                _ => {}
            }
        }

        Self {
            hash: hash.unwrap_or_default(),
            network: NetworkId::from_link_param(network.as_deref()),
        }
    }

    /// Query string; `network` is omitted on the default network
    pub fn to_query(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        serializer.append_pair("hash", &self.hash);
        if !self.network.is_default() {
            serializer.append_pair("network", self.network.as_str());
        }
        serializer.finish()
    }

    pub fn location(&self) -> String {
        format!("{}/?{}", TX_STATUS_PATH, self.to_query())
    }
}
