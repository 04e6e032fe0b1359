//! # Networks
//!
//! The three Bitcoin networks a push URL can name. Only mainnet and testnet
//! have public relays; regtest is recognized so that we can tell the user
//! exactly why their URL will not work, instead of calling it garbage.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config;

/// Target network of a pushed transaction.
///
/// The wire tags (`BTC`, `XTN`, `XRT`) are what the signing device writes into
/// the `n` parameter of the fragment.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Network {
    /// Bitcoin mainnet. Also the default when the fragment omits `n`.
    #[default]
    #[serde(rename = "BTC")]
    Bitcoin,
    /// Bitcoin testnet.
    #[serde(rename = "XTN")]
    Testnet,
    /// Local regression-test network. Parses fine, pushes nowhere.
    #[serde(rename = "XRT")]
    Regtest,
}

impl Network {
    /// Every network, in tag order.
    pub const ALL: [Network; 3] = [Network::Bitcoin, Network::Testnet, Network::Regtest];

    /// Looks up a network by its fragment tag. Case-sensitive, like the
    /// device that produced it.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            config::TAG_MAINNET => Some(Network::Bitcoin),
            config::TAG_TESTNET => Some(Network::Testnet),
            config::TAG_REGTEST => Some(Network::Regtest),
            _ => None,
        }
    }

    /// The fragment tag for this network.
    pub fn tag(&self) -> &'static str {
        match self {
            Network::Bitcoin => config::TAG_MAINNET,
            Network::Testnet => config::TAG_TESTNET,
            Network::Regtest => config::TAG_REGTEST,
        }
    }

    /// Whether public relays exist for this network.
    pub fn is_supported(&self) -> bool {
        !matches!(self, Network::Regtest)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
