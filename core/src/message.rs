//! # Output Contract
//!
//! Everything the pipeline has to say is a [`Message`]: a state tag, a
//! human-readable text, and for successes the structured details and explorer
//! links. Presenters decide what that looks like; the pipeline never formats
//! for a particular surface.

use serde::{Deserialize, Serialize};

use crate::reconcile::ReconciledResult;
use crate::registry::ExplorerLink;
use crate::relay::TransactionDetails;

/// Text shown while the races are in flight.
pub const PROGRESS_TEXT: &str = "Sending transaction, please wait...";

/// Success text when the lookup saw the transaction in a block.
pub const CONFIRMED_TEXT: &str = "This transaction has already been confirmed.";

/// Success text for everything short of a confirmation.
pub const PENDING_TEXT: &str = "The transaction has been sent and is waiting to be confirmed.";

/// Truncated fragment used in the "no fragment" hint.
const EXAMPLE_FRAGMENT: &str = "#t=AgAAAAMNCxXtp2GVYVhkRXHLMmdZFs4p3kbFK...ABf&c=uiSVRda-1tw";

/// Which kind of message this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageState {
    /// Nothing to do. Not an error.
    Info,
    /// Races in flight.
    Progress,
    /// Confirmed or pending.
    Success,
    /// The run failed.
    Error,
}

/// One rendered state of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// State tag.
    pub state: MessageState,
    /// Human-readable text.
    pub message: String,
    /// Transaction details, when a lookup found them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<TransactionDetails>,
    /// Explorer links, success only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub explorer_links: Vec<ExplorerLink>,
}

impl Message {
    fn plain(state: MessageState, message: impl Into<String>) -> Self {
        Self {
            state,
            message: message.into(),
            details: None,
            explorer_links: Vec::new(),
        }
    }

    /// The "no fragment" hint, with an example URL under `page_url`.
    pub fn info(page_url: &str) -> Self {
        Self::plain(
            MessageState::Info,
            format!(
                "Did you get here by accident?\n\
                 This page is meant to be loaded together with transaction data using the \
                 COLDCARD NFC Push TX feature. The complete URL should look something like \
                 this (but longer):\n\
                 {page_url}{EXAMPLE_FRAGMENT}"
            ),
        )
    }

    /// The in-flight notice.
    pub fn progress() -> Self {
        Self::plain(MessageState::Progress, PROGRESS_TEXT)
    }

    /// A failure, shown verbatim.
    pub fn error(message: impl Into<String>) -> Self {
        Self::plain(MessageState::Error, message)
    }

    /// Projects a reconciled verdict.
    ///
    /// `details` and `explorer_links` are only attached to successes.
    pub fn from_reconciled(
        result: &ReconciledResult,
        txid: &str,
        details: Option<TransactionDetails>,
        explorer_links: Vec<ExplorerLink>,
    ) -> Self {
        let headline = match result {
            ReconciledResult::Confirmed => CONFIRMED_TEXT,
            ReconciledResult::PendingBroadcastOk | ReconciledResult::PendingAmbiguous => {
                PENDING_TEXT
            }
            ReconciledResult::Failed(message) => return Self::error(message.as_str()),
        };

        Self {
            state: MessageState::Success,
            message: format!("{headline} Transaction ID: {txid}"),
            details,
            explorer_links,
        }
    }

    /// Whether this is the last message of a run.
    pub fn is_terminal(&self) -> bool {
        !matches!(self.state, MessageState::Progress)
    }
}
