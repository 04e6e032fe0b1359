//! # Push Pipeline
//!
//! One navigation event in, one terminal [`Message`] out:
//!
//! ```text
//!   target ──► extract ──► decode ──► txid ──┬─► broadcast race ─┐
//!                                            └─► lookup race ────┴─► reconcile ──► Message
//! ```
//!
//! Both races start together and reconciliation waits for both. Parse and
//! transaction errors end the run before any request is made.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::PushTxConfig;
use crate::fragment::{self, DecodedFragment};
use crate::message::Message;
use crate::present::Presenter;
use crate::reconcile::{reconcile, ReconciledResult};
use crate::registry::ProviderRegistry;
use crate::relay::{BroadcastOutcome, LookupOutcome, RelayClient, RelayError};
use crate::transaction::{BitcoinCodec, TransactionCodec};

/// The fragment-to-confirmation pipeline.
///
/// Holds nothing that changes between runs, so one instance can serve any
/// number of concurrent runs.
pub struct PushTx {
    config: Arc<PushTxConfig>,
    relay: RelayClient,
    codec: Arc<dyn TransactionCodec>,
}

impl PushTx {
    /// Builds a pipeline over `config` that identifies Bitcoin transactions.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built.
    pub fn new(config: PushTxConfig) -> Result<Self, RelayError> {
        Self::with_codec(config, Arc::new(BitcoinCodec))
    }

    /// Builds a pipeline with a custom transaction codec.
    pub fn with_codec(
        config: PushTxConfig,
        codec: Arc<dyn TransactionCodec>,
    ) -> Result<Self, RelayError> {
        let registry = Arc::new(ProviderRegistry::new(&config));
        let relay = RelayClient::new(registry, &config.http)?;

        Ok(Self {
            config: Arc::new(config),
            relay,
            codec,
        })
    }

    /// The configuration this pipeline was built with.
    pub fn config(&self) -> &PushTxConfig {
        &self.config
    }

    /// The relay and explorer tables in use.
    pub fn registry(&self) -> &ProviderRegistry {
        self.relay.registry()
    }

    /// Runs the pipeline for one navigation target and returns the terminal
    /// message. Every message, terminal or not, also goes to `presenter`.
    ///
    /// `target` may be a full URL, a `#fragment`, a bare fragment, or
    /// `None`. Without a fragment the run ends with the info message and no
    /// request is made.
    pub async fn run(&self, target: Option<&str>, presenter: &dyn Presenter) -> Message {
        let Some(fragment) = target.and_then(fragment::extract) else {
            info!("no fragment to push");
            let message = Message::info(&self.config.page_url);
            presenter.present(&message);
            return message;
        };

        presenter.present(&Message::progress());

        let message = self.push(fragment).await;
        presenter.present(&message);
        message
    }

    async fn push(&self, fragment: &str) -> Message {
        let DecodedFragment { bytes, network } = match fragment::decode(fragment) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!(error = %e, "rejected fragment");
                return Message::error(e.to_string());
            }
        };

        let txid = match self.codec.transaction_id(&bytes) {
            Ok(txid) => txid,
            Err(e) => {
                warn!(error = %e, %network, bytes = bytes.len(), "payload is not a transaction");
                return Message::error(e.to_string());
            }
        };

        info!(%network, %txid, bytes = bytes.len(), "pushing transaction");

        let (broadcast, lookup) = tokio::join!(
            self.relay.broadcast(&bytes, network),
            self.relay.lookup_details(&txid, network),
        );

        let (broadcast, lookup) = match (broadcast, lookup) {
            (Ok(broadcast), Ok(lookup)) => (broadcast, lookup),
            (Err(e), _) | (_, Err(e)) => {
                warn!(error = %e, %network, "relay race refused");
                return Message::error(e.to_string());
            }
        };

        if let BroadcastOutcome::Success(reported) = &broadcast {
            if !reported.eq_ignore_ascii_case(&txid) {
                warn!(%txid, %reported, "relay reported a different txid, keeping ours");
            }
        }

        let result = reconcile(&broadcast, &lookup);
        info!(%txid, ?result, "run reconciled");

        let (details, links) = match &result {
            ReconciledResult::Failed(_) => (None, Vec::new()),
            _ => {
                let details = match lookup {
                    LookupOutcome::Found(details) => Some(details),
                    LookupOutcome::NotFound(_) | LookupOutcome::AllFailed(_) => None,
                };
                (details, self.registry().explorer_links(network, &txid))
            }
        };

        Message::from_reconciled(&result, &txid, details, links)
    }
}
