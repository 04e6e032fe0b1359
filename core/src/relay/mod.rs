//! # Relay Races
//!
//! Public relays are unreliable in every way a third-party HTTP service can
//! be: down, slow, rate limiting, or rejecting a transaction another relay
//! already accepted. So we never pick one. Every request goes to every relay
//! of the network at once and the first success wins.
//!
//! - `race.rs` — the first-success primitive over spawned tasks.
//! - `client.rs` — the broadcast and lookup races over HTTP.
//! - `types.rs` — failures, outcomes, and the details shown to the user.

mod client;
mod race;
mod types;

pub use client::RelayClient;
pub use types::{
    format_btc, BroadcastOutcome, LookupOutcome, ProviderFailure, TransactionDetails, TxEndpoint,
};

use thiserror::Error;

use crate::registry::RegistryError;

/// Errors that stop a race before any request is issued.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The network has no relays.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),
}
