//! # Configuration & Constants
//!
//! Every magic number of the push pipeline lives here: the fragment layout,
//! the network tags, and the built-in relay and explorer tables.
//!
//! The tables are only defaults. At startup they are resolved once into a
//! [`PushTxConfig`] value (optionally replaced from a JSON file) and that
//! value is handed explicitly to the registry and the relay client. Nothing
//! downstream reads these constants to decide where to send a transaction.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::network::Network;
use crate::registry::{Explorer, ProviderEndpoint};

// ---------------------------------------------------------------------------
// Fragment Layout
// ---------------------------------------------------------------------------

/// Delimiter between the page URL and the fragment.
pub const FRAGMENT_DELIMITER: char = '#';

/// Query key carrying the base64url transaction bytes.
pub const PARAM_PAYLOAD: &str = "t";

/// Query key carrying the base64url checksum.
pub const PARAM_CHECKSUM: &str = "c";

/// Query key carrying the optional network tag.
pub const PARAM_NETWORK: &str = "n";

/// Checksum length in bytes: the tail of a SHA-256 digest.
pub const CHECKSUM_LENGTH: usize = 8;

/// Length of the checksum once base64url-encoded without padding.
/// 8 bytes = 64 bits = 11 sextets, with two spare bits in the last one.
pub const CHECKSUM_ENCODED_LENGTH: usize = 11;

/// SHA-256 output length in bytes.
pub const DIGEST_LENGTH: usize = 32;

// ---------------------------------------------------------------------------
// Network Tags
// ---------------------------------------------------------------------------

/// Mainnet tag. Implied when the fragment has no `n`.
pub const TAG_MAINNET: &str = "BTC";

/// Testnet tag.
pub const TAG_TESTNET: &str = "XTN";

/// Regtest tag. Recognized, then refused.
pub const TAG_REGTEST: &str = "XRT";

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

/// Satoshis per bitcoin. Relays report integer satoshis.
pub const SATS_PER_BTC: u64 = 100_000_000;

/// Decimal places shown for bitcoin amounts.
pub const BTC_DECIMALS: usize = 8;

/// Placeholder substituted with the txid in explorer URL templates. Templates
/// without it get the txid appended.
pub const TXID_PLACEHOLDER: &str = "{txid}";

/// Public page the signing device points at. Used to build example URLs in
/// the "no fragment" message and by the `encode` tooling.
pub const DEFAULT_PAGE_URL: &str = "https://coldcard.com/pushtx";

/// User agent sent to the relays.
pub const DEFAULT_USER_AGENT: &str = concat!("pushtx/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Default Relay Tables
// ---------------------------------------------------------------------------

/// Esplora-style endpoints for mainnet. POST here to push (hex body),
/// GET `.../{txid}` for details.
pub const MAINNET_PROVIDERS: &[&str] = &[
    "https://mempool.space/api/tx",
    "https://blockstream.info/api/tx",
];

/// Esplora-style endpoints for testnet.
pub const TESTNET_PROVIDERS: &[&str] = &[
    "https://mempool.space/testnet/api/tx",
    "https://blockstream.info/testnet/api/tx",
];

/// Block explorers linked after a mainnet push.
pub const MAINNET_EXPLORERS: &[(&str, &str)] = &[
    ("mempool.space", "https://mempool.space/tx/"),
    ("blockstream.info", "https://blockstream.info/tx/"),
    ("btcscan.org", "https://btcscan.org/tx/"),
    ("btc.com", "https://explorer.btc.com/btc/transaction/"),
];

/// Block explorers linked after a testnet push.
pub const TESTNET_EXPLORERS: &[(&str, &str)] = &[
    ("mempool.space", "https://mempool.space/testnet/tx/"),
    ("blockstream.info", "https://blockstream.info/testnet/tx/"),
    ("blockcypher.com", "https://live.blockcypher.com/btc-testnet/tx/"),
];

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while loading or validating a [`PushTxConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path we tried to read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid JSON for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configuration parsed but makes no sense.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// Runtime Configuration
// ---------------------------------------------------------------------------

/// Relays and explorers for a single network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Relays raced for broadcast and lookup. Order is kept stable but
    /// carries no priority.
    pub providers: Vec<ProviderEndpoint>,
    /// Display-only explorer links.
    #[serde(default)]
    pub explorers: Vec<Explorer>,
}

impl NetworkConfig {
    fn from_tables(providers: &[&str], explorers: &[(&str, &str)]) -> Self {
        Self {
            providers: providers.iter().map(|url| ProviderEndpoint::esplora(url)).collect(),
            explorers: explorers
                .iter()
                .map(|(name, url)| Explorer::new(name, url))
                .collect(),
        }
    }
}

/// HTTP client settings.
///
/// Both timeouts are unset by default: a run waits as long as the HTTP stack
/// itself is willing to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpSettings {
    /// `User-Agent` header sent to every relay.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Connection establishment timeout, in seconds.
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
    /// Whole-request timeout, in seconds.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_page_url() -> String {
    DEFAULT_PAGE_URL.to_string()
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            connect_timeout_secs: None,
            request_timeout_secs: None,
        }
    }
}

impl HttpSettings {
    /// Connect timeout as a `Duration`, if configured.
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs.map(Duration::from_secs)
    }

    /// Request timeout as a `Duration`, if configured.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

/// Complete, read-only configuration of a pipeline instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushTxConfig {
    /// Page the push URLs point at.
    #[serde(default = "default_page_url")]
    pub page_url: String,
    /// Mainnet relays and explorers.
    pub mainnet: NetworkConfig,
    /// Testnet relays and explorers.
    pub testnet: NetworkConfig,
    /// HTTP client settings.
    #[serde(default)]
    pub http: HttpSettings,
}

impl Default for PushTxConfig {
    fn default() -> Self {
        Self {
            page_url: default_page_url(),
            mainnet: NetworkConfig::from_tables(MAINNET_PROVIDERS, MAINNET_EXPLORERS),
            testnet: NetworkConfig::from_tables(TESTNET_PROVIDERS, TESTNET_EXPLORERS),
            http: HttpSettings::default(),
        }
    }
}

impl PushTxConfig {
    /// Parses and validates a configuration from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: PushTxConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses, and validates a configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Returns the table for `network`, or `None` for networks without
    /// public relays.
    pub fn network(&self, network: Network) -> Option<&NetworkConfig> {
        match network {
            Network::Bitcoin => Some(&self.mainnet),
            Network::Testnet => Some(&self.testnet),
            Network::Regtest => None,
        }
    }

    /// Checks that every supported network has at least one relay and that
    /// every configured URL parses.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_url("page_url", &self.page_url)?;

        for network in Network::ALL.into_iter().filter(Network::is_supported) {
            let Some(table) = self.network(network) else {
                continue;
            };
            if table.providers.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "network {network} has no providers"
                )));
            }
            for provider in &table.providers {
                check_url("broadcast_url", &provider.broadcast_url)?;
                check_url("lookup_url_prefix", &provider.lookup_url_prefix)?;
            }
            for explorer in &table.explorers {
                let sample = explorer.link_for("0".repeat(64).as_str());
                check_url("explorer url", &sample.url)?;
            }
        }

        Ok(())
    }
}

fn check_url(field: &str, value: &str) -> Result<(), ConfigError> {
    url::Url::parse(value)
        .map(|_| ())
        .map_err(|e| ConfigError::Invalid(format!("{field} {value:?} is not a valid URL: {e}")))
}
