//! # Reconciliation
//!
//! Relays routinely reject a transaction they have already seen through
//! another relay, and a push can time out after the network accepted it. So
//! the broadcast race alone cannot tell whether the transaction is out. The
//! lookup race is the second opinion, and it wins whenever it has one:
//!
//! | broadcast | lookup            | result                                   |
//! |-----------|-------------------|------------------------------------------|
//! | success   | found             | confirmed, or pending if not in a block  |
//! | success   | failed/not found  | pending                                  |
//! | failed    | found             | confirmed, or pending (ambiguous)        |
//! | failed    | failed/not found  | failed, with the broadcast failures      |

use crate::relay::{BroadcastOutcome, LookupOutcome, ProviderFailure};

/// Generic text for when no relay answered at all.
pub const NETWORK_UNREACHABLE: &str = "Could not connect to any push servers. Make sure you are connected to the Internet and try again.";

/// Header of the failure text when relays answered and said no.
pub const REJECTED_BY_ALL: &str = "The transaction was rejected by all providers:";

/// The single verdict of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconciledResult {
    /// A relay reports the transaction in a block.
    Confirmed,
    /// A relay accepted the push; not confirmed yet (or we could not tell).
    PendingBroadcastOk,
    /// Every push failed, yet a relay knows the transaction. Someone else got
    /// it out first, or a push succeeded without telling us.
    PendingAmbiguous,
    /// Nothing worked. Carries the text to show.
    Failed(String),
}

impl ReconciledResult {
    /// Whether the run ends in a success state.
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

/// Combines both race outcomes into one verdict.
///
/// Never fails while the lookup found the transaction, and never reports
/// confirmation the lookup did not see.
pub fn reconcile(broadcast: &BroadcastOutcome, lookup: &LookupOutcome) -> ReconciledResult {
    let details = lookup.details();

    match (broadcast, details) {
        (_, Some(details)) if details.confirmed => ReconciledResult::Confirmed,
        (BroadcastOutcome::Success(_), _) => ReconciledResult::PendingBroadcastOk,
        (BroadcastOutcome::AllFailed(_), Some(_)) => ReconciledResult::PendingAmbiguous,
        (BroadcastOutcome::AllFailed(failures), None) => {
            ReconciledResult::Failed(failure_message(failures))
        }
    }
}

/// User-facing text for a broadcast that failed everywhere.
///
/// Relay rejections are listed one per line; the generic connectivity text is
/// only used when no relay produced an HTTP response.
pub fn failure_message(failures: &[ProviderFailure]) -> String {
    let rejections: Vec<String> = failures
        .iter()
        .filter_map(|failure| {
            failure
                .provider_text()
                .map(|text| format!("{}: {}", failure.endpoint(), text))
        })
        .collect();

    if rejections.is_empty() {
        return NETWORK_UNREACHABLE.to_string();
    }

    let mut message = REJECTED_BY_ALL.to_string();
    for line in rejections {
        message.push('\n');
        message.push_str(&line);
    }
    message
}
