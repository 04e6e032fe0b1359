//! Outcome and detail types produced by the relay races.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::{BTC_DECIMALS, SATS_PER_BTC};

// ---------------------------------------------------------------------------
// ProviderFailure
// ---------------------------------------------------------------------------

/// Why a single relay did not deliver.
///
/// HTTP rejections and transport failures are kept apart so that the final
/// message can tell "the relay said no" from "we never reached a relay".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderFailure {
    /// The relay answered with a non-2xx status.
    Status {
        /// URL we talked to.
        endpoint: String,
        /// HTTP status code.
        status: u16,
        /// Reason phrase for the status.
        status_text: String,
        /// Response body, if it could be read.
        body: Option<String>,
    },
    /// No HTTP response at all: DNS, connect, TLS, timeout, reset.
    Transport {
        /// URL we tried to talk to.
        endpoint: String,
        /// Short description of what went wrong.
        reason: String,
    },
    /// A 2xx response whose body we could not use.
    InvalidResponse {
        /// URL we talked to.
        endpoint: String,
        /// Why the body was rejected.
        reason: String,
    },
}

impl ProviderFailure {
    /// URL of the relay that failed.
    pub fn endpoint(&self) -> &str {
        match self {
            Self::Status { endpoint, .. }
            | Self::Transport { endpoint, .. }
            | Self::InvalidResponse { endpoint, .. } => endpoint,
        }
    }

    /// HTTP status, if the relay answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether an HTTP response was obtained.
    pub fn reached_provider(&self) -> bool {
        !matches!(self, Self::Transport { .. })
    }

    /// The relay's own words, falling back to the status line.
    pub fn provider_text(&self) -> Option<String> {
        match self {
            Self::Status {
                status,
                status_text,
                body,
                ..
            } => Some(match body.as_deref().map(str::trim) {
                Some(text) if !text.is_empty() => text.to_string(),
                _ => format!("{status} {status_text}").trim_end().to_string(),
            }),
            Self::InvalidResponse { reason, .. } => Some(reason.clone()),
            Self::Transport { .. } => None,
        }
    }
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport { endpoint, reason } => write!(f, "{endpoint}: {reason}"),
            other => write!(
                f,
                "{}: {}",
                other.endpoint(),
                other.provider_text().unwrap_or_default()
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Result of the broadcast race.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BroadcastOutcome {
    /// Some relay accepted the transaction and returned this identifier.
    Success(String),
    /// Every relay failed, in request order.
    AllFailed(Vec<ProviderFailure>),
}

/// Result of the lookup race.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    /// Some relay knows the transaction.
    Found(TransactionDetails),
    /// Every relay answered 404. Indistinguishable from a relay being down
    /// for reconciliation purposes.
    NotFound(Vec<ProviderFailure>),
    /// Every relay failed, in request order.
    AllFailed(Vec<ProviderFailure>),
}

impl LookupOutcome {
    /// Classifies a full set of lookup failures.
    pub(crate) fn from_failures(failures: Vec<ProviderFailure>) -> Self {
        let all_404 = !failures.is_empty() && failures.iter().all(|f| f.status() == Some(404));
        if all_404 {
            Self::NotFound(failures)
        } else {
            Self::AllFailed(failures)
        }
    }

    /// Details, if found.
    pub fn details(&self) -> Option<&TransactionDetails> {
        match self {
            Self::Found(details) => Some(details),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// TransactionDetails
// ---------------------------------------------------------------------------

/// One side of a transfer: who and how much.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxEndpoint {
    /// Address, when the script has one (OP_RETURN outputs do not).
    pub address: Option<String>,
    /// Amount in satoshis.
    pub value: u64,
}

impl TxEndpoint {
    /// Amount in BTC, formatted with eight decimals.
    pub fn display_value(&self) -> String {
        format_btc(self.value)
    }
}

/// What a relay knows about a transaction, for display only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDetails {
    /// Spent outputs.
    pub inputs: Vec<TxEndpoint>,
    /// Created outputs.
    pub outputs: Vec<TxEndpoint>,
    /// Fee in satoshis.
    pub fee: u64,
    /// Whether the transaction is in a block.
    pub confirmed: bool,
    /// Height of that block, if confirmed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_height: Option<u64>,
}

impl TransactionDetails {
    /// Fee in BTC, formatted with eight decimals.
    pub fn display_fee(&self) -> String {
        format_btc(self.fee)
    }
}

/// Formats satoshis as BTC with exactly eight decimals, without going
/// through floating point.
pub fn format_btc(sats: u64) -> String {
    format!(
        "{}.{:0width$}",
        sats / SATS_PER_BTC,
        sats % SATS_PER_BTC,
        width = BTC_DECIMALS
    )
}

// ---------------------------------------------------------------------------
// Esplora wire format
// ---------------------------------------------------------------------------

/// `GET /tx/{txid}` response of Esplora relays. Only the fields we show.
///
/// Only `status` is required; a relay that knows the transaction but omits
/// the rest still counts as having found it.
#[derive(Debug, Deserialize)]
pub(crate) struct EsploraTransaction {
    #[serde(default)]
    vin: Vec<EsploraInput>,
    #[serde(default)]
    vout: Vec<EsploraOutput>,
    #[serde(default)]
    fee: u64,
    status: EsploraStatus,
}

#[derive(Debug, Deserialize)]
struct EsploraInput {
    /// Absent for coinbase inputs.
    #[serde(default)]
    prevout: Option<EsploraOutput>,
}

#[derive(Debug, Deserialize)]
struct EsploraOutput {
    #[serde(default)]
    scriptpubkey_address: Option<String>,
    value: u64,
}

#[derive(Debug, Deserialize)]
struct EsploraStatus {
    confirmed: bool,
    #[serde(default)]
    block_height: Option<u64>,
}

impl From<EsploraOutput> for TxEndpoint {
    fn from(output: EsploraOutput) -> Self {
        Self {
            address: output.scriptpubkey_address,
            value: output.value,
        }
    }
}

impl From<EsploraTransaction> for TransactionDetails {
    fn from(tx: EsploraTransaction) -> Self {
        Self {
            inputs: tx
                .vin
                .into_iter()
                .filter_map(|input| input.prevout.map(TxEndpoint::from))
                .collect(),
            outputs: tx.vout.into_iter().map(TxEndpoint::from).collect(),
            fee: tx.fee,
            confirmed: tx.status.confirmed,
            block_height: tx.status.block_height.filter(|_| tx.status.confirmed),
        }
    }
}
