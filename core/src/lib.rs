// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # PushTX — Core Library
//!
//! A signing device that cannot reach the network can still hand a signed
//! transaction to a phone: it writes a URL whose fragment carries the
//! transaction and a checksum. This crate takes that fragment the rest of the
//! way. It verifies it, pushes the transaction to several public relays at
//! once, and decides what actually happened.
//!
//! ## Architecture
//!
//! - **fragment** — the `#t=…&c=…&n=…` codec and its user-facing errors.
//! - **network** — mainnet, testnet, and the regtest tag we refuse.
//! - **registry** — per-network relay and explorer tables.
//! - **relay** — first-success races for broadcast and lookup.
//! - **reconcile** — broadcast × lookup → one verdict.
//! - **message** — the output contract presenters render.
//! - **pipeline** — one navigation event, start to finish.
//! - **session** — newer navigations supersede older runs.
//! - **transaction** — txid derivation behind a codec trait.
//! - **config** — constants, default tables, JSON overrides.
//!
//! ## Ground Rules
//!
//! 1. The fragment checksum is the only integrity check on the payload.
//! 2. A relay rejecting a transaction does not mean the transaction failed.
//! 3. No retries, no backoff. A run is one shot at every relay.

pub mod config;
pub mod fragment;
pub mod hash;
pub mod message;
pub mod network;
pub mod pipeline;
pub mod present;
pub mod reconcile;
pub mod registry;
pub mod relay;
pub mod session;
pub mod transaction;

pub use config::PushTxConfig;
pub use message::{Message, MessageState};
pub use network::Network;
pub use pipeline::PushTx;
pub use present::Presenter;
pub use session::NavigationSession;
