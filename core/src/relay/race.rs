//! First-success race over a fixed set of relay attempts.
//!
//! Every attempt is spawned as its own task. The first `Ok` wins and the
//! race returns immediately; the other tasks keep running detached and
//! whatever they produce is dropped on the floor. If nothing succeeds, the
//! failures come back in the order the attempts were issued, not the order
//! they finished in.
//!
//! Detached losers are bounded by the number of configured relays, which is
//! a small static table.

use std::future::Future;

use futures::stream::{FuturesUnordered, StreamExt};

use super::types::ProviderFailure;

/// A relay request that has not been issued yet.
pub(crate) struct Attempt<F> {
    /// URL the attempt talks to. Used to attribute a panicked task.
    pub endpoint: String,
    /// The request itself.
    pub request: F,
}

/// Runs every attempt concurrently and returns the first success, or every
/// failure in issuance order.
pub(crate) async fn first_success<T, F>(
    attempts: Vec<Attempt<F>>,
) -> Result<T, Vec<ProviderFailure>>
where
    T: Send + 'static,
    F: Future<Output = Result<T, ProviderFailure>> + Send + 'static,
{
    let issued = attempts.len();
    let mut failures: Vec<Option<ProviderFailure>> = vec![None; issued];

    let mut in_flight: FuturesUnordered<_> = attempts
        .into_iter()
        .enumerate()
        .map(|(index, attempt)| {
            let handle = tokio::spawn(attempt.request);
            async move { (index, attempt.endpoint, handle.await) }
        })
        .collect();

    while let Some((index, endpoint, joined)) = in_flight.next().await {
        match joined {
            Ok(Ok(value)) => {
                tracing::debug!(winner = %endpoint, issued, "race settled on first success");
                // Dropping `in_flight` detaches the remaining tasks.
                return Ok(value);
            }
            Ok(Err(failure)) => {
                tracing::debug!(%failure, "race participant failed");
                failures[index] = Some(failure);
            }
            Err(join_error) => {
                tracing::warn!(%endpoint, error = %join_error, "race participant task died");
                failures[index] = Some(ProviderFailure::Transport {
                    endpoint,
                    reason: "request task aborted".to_string(),
                });
            }
        }
    }

    Err(failures.into_iter().flatten().collect())
}
