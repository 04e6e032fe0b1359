//! # Provider Registry
//!
//! Per-network tables of relays and explorers, frozen at construction. The
//! relay client asks the registry who to race; the message projection asks it
//! which explorer links to show. Nobody adds or removes entries at runtime.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{self, PushTxConfig};
use crate::network::Network;

/// Registry lookups fail only for networks without public relays.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The network is known but nobody relays for it.
    #[error("unsupported network: {0}")]
    UnsupportedNetwork(Network),
}

/// One relay service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoint {
    /// POST target for raw transaction hex.
    pub broadcast_url: String,
    /// GET prefix; the txid is appended as a final path segment.
    pub lookup_url_prefix: String,
}

impl ProviderEndpoint {
    /// Esplora relays use the same base for pushing and looking up.
    pub fn esplora(base: &str) -> Self {
        Self {
            broadcast_url: base.to_string(),
            lookup_url_prefix: base.to_string(),
        }
    }

    /// Full lookup URL for `txid`.
    pub fn lookup_url(&self, txid: &str) -> String {
        format!("{}/{}", self.lookup_url_prefix.trim_end_matches('/'), txid)
    }
}

/// A block explorer we link to once a transaction is out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explorer {
    /// Display name.
    pub name: String,
    /// URL template. `{txid}` is substituted; without it the txid is appended.
    pub url: String,
}

impl Explorer {
    /// Creates an explorer entry.
    pub fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
        }
    }

    /// Builds the link for `txid`.
    pub fn link_for(&self, txid: &str) -> ExplorerLink {
        let url = if self.url.contains(config::TXID_PLACEHOLDER) {
            self.url.replace(config::TXID_PLACEHOLDER, txid)
        } else {
            format!("{}{}", self.url, txid)
        };
        ExplorerLink {
            name: self.name.clone(),
            url,
        }
    }
}

/// A resolved explorer link, ready to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorerLink {
    /// Display name.
    pub name: String,
    /// Absolute URL.
    pub url: String,
}

/// Read-only relay and explorer tables for mainnet and testnet.
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    mainnet: Vec<ProviderEndpoint>,
    testnet: Vec<ProviderEndpoint>,
    mainnet_explorers: Vec<Explorer>,
    testnet_explorers: Vec<Explorer>,
}

impl ProviderRegistry {
    /// Snapshots the tables of `config`.
    pub fn new(config: &PushTxConfig) -> Self {
        Self {
            mainnet: config.mainnet.providers.clone(),
            testnet: config.testnet.providers.clone(),
            mainnet_explorers: config.mainnet.explorers.clone(),
            testnet_explorers: config.testnet.explorers.clone(),
        }
    }

    /// Relays to race for `network`, in stable configuration order.
    pub fn endpoints_for(&self, network: Network) -> Result<&[ProviderEndpoint], RegistryError> {
        match network {
            Network::Bitcoin => Ok(&self.mainnet),
            Network::Testnet => Ok(&self.testnet),
            Network::Regtest => Err(RegistryError::UnsupportedNetwork(network)),
        }
    }

    /// Explorers to link for `network`.
    pub fn explorers_for(&self, network: Network) -> Result<&[Explorer], RegistryError> {
        match network {
            Network::Bitcoin => Ok(&self.mainnet_explorers),
            Network::Testnet => Ok(&self.testnet_explorers),
            Network::Regtest => Err(RegistryError::UnsupportedNetwork(network)),
        }
    }

    /// Explorer links for `txid` on `network`. Unsupported networks get none.
    pub fn explorer_links(&self, network: Network, txid: &str) -> Vec<ExplorerLink> {
        self.explorers_for(network)
            .map(|explorers| explorers.iter().map(|e| e.link_for(txid)).collect())
            .unwrap_or_default()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new(&PushTxConfig::default())
    }
}
