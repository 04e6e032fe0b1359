//! HTTP side of the relay races.
//!
//! Both races follow the same shape: one request per configured relay, all
//! at once, first success wins. No request is ever retried; a relay that
//! loses or fails is simply out for this run.

use std::sync::Arc;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, ClientBuilder, Response};
use tracing::{debug, info, warn};

use crate::config::HttpSettings;
use crate::network::Network;
use crate::registry::ProviderRegistry;

use super::race::{self, Attempt};
use super::types::{
    BroadcastOutcome, EsploraTransaction, LookupOutcome, ProviderFailure, TransactionDetails,
};
use super::RelayError;

/// Races pushes and lookups across the relays of a [`ProviderRegistry`].
///
/// Cheap to clone: the HTTP client and the registry are both shared.
#[derive(Debug, Clone)]
pub struct RelayClient {
    http: Client,
    registry: Arc<ProviderRegistry>,
}

impl RelayClient {
    /// Builds a client over `registry` with the given HTTP settings.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::ClientBuild`] if the TLS backend cannot be
    /// initialized.
    pub fn new(registry: Arc<ProviderRegistry>, settings: &HttpSettings) -> Result<Self, RelayError> {
        let mut builder = ClientBuilder::new()
            .user_agent(settings.user_agent.as_str())
            .use_rustls_tls();

        if let Some(timeout) = settings.connect_timeout() {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = settings.request_timeout() {
            builder = builder.timeout(timeout);
        }

        let http = builder.build().map_err(|e| {
            tracing::error!(error = %e, "failed to build http client");
            RelayError::ClientBuild(e.to_string())
        })?;

        Ok(Self { http, registry })
    }

    /// The registry this client races over.
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Pushes `raw` to every relay of `network` as lowercase hex.
    ///
    /// Resolves on the first 2xx, whose body is the relay's idea of the txid.
    /// If every relay fails, all failures are returned in request order.
    ///
    /// # Errors
    ///
    /// Only [`RelayError::Registry`] for networks without relays; relay
    /// failures are part of the outcome, not errors.
    pub async fn broadcast(
        &self,
        raw: &[u8],
        network: Network,
    ) -> Result<BroadcastOutcome, RelayError> {
        let endpoints = self.registry.endpoints_for(network)?;
        let body = hex::encode(raw);

        info!(%network, providers = endpoints.len(), bytes = raw.len(), "broadcasting transaction");

        let attempts = endpoints
            .iter()
            .map(|endpoint| Attempt {
                endpoint: endpoint.broadcast_url.clone(),
                request: post_transaction(
                    self.http.clone(),
                    endpoint.broadcast_url.clone(),
                    body.clone(),
                ),
            })
            .collect();

        match race::first_success(attempts).await {
            Ok(txid) => {
                info!(%network, %txid, "broadcast accepted");
                Ok(BroadcastOutcome::Success(txid))
            }
            Err(failures) => {
                for failure in &failures {
                    warn!(%network, %failure, "broadcast rejected");
                }
                Ok(BroadcastOutcome::AllFailed(failures))
            }
        }
    }

    /// Fetches details for `txid` from every relay of `network`.
    ///
    /// The first 2xx response that parses wins. A relay that does not know
    /// the transaction answers non-2xx, exactly like a relay that is down.
    ///
    /// # Errors
    ///
    /// Only [`RelayError::Registry`] for networks without relays.
    pub async fn lookup_details(
        &self,
        txid: &str,
        network: Network,
    ) -> Result<LookupOutcome, RelayError> {
        let endpoints = self.registry.endpoints_for(network)?;

        debug!(%network, %txid, providers = endpoints.len(), "looking up transaction");

        let attempts = endpoints
            .iter()
            .map(|endpoint| {
                let url = endpoint.lookup_url(txid);
                Attempt {
                    endpoint: url.clone(),
                    request: fetch_details(self.http.clone(), url),
                }
            })
            .collect();

        match race::first_success(attempts).await {
            Ok(details) => {
                info!(%network, %txid, confirmed = details.confirmed, "transaction found");
                Ok(LookupOutcome::Found(details))
            }
            Err(failures) => {
                debug!(%network, %txid, failures = failures.len(), "lookup failed everywhere");
                Ok(LookupOutcome::from_failures(failures))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Single requests
// ---------------------------------------------------------------------------

async fn post_transaction(
    http: Client,
    endpoint: String,
    body: String,
) -> Result<String, ProviderFailure> {
    let response = http
        .post(&endpoint)
        .header(CONTENT_TYPE, "text/plain")
        .body(body)
        .send()
        .await
        .map_err(|e| transport_failure(&endpoint, &e))?;

    let response = ensure_success(&endpoint, response).await?;

    let txid = response
        .text()
        .await
        .map_err(|e| ProviderFailure::InvalidResponse {
            endpoint: endpoint.clone(),
            reason: format!("unreadable response body ({})", describe_error(&e)),
        })?;

    Ok(txid.trim().to_string())
}

async fn fetch_details(http: Client, endpoint: String) -> Result<TransactionDetails, ProviderFailure> {
    let response = http
        .get(&endpoint)
        .send()
        .await
        .map_err(|e| transport_failure(&endpoint, &e))?;

    let response = ensure_success(&endpoint, response).await?;

    let tx: EsploraTransaction =
        response
            .json()
            .await
            .map_err(|e| ProviderFailure::InvalidResponse {
                endpoint: endpoint.clone(),
                reason: format!("unusable transaction details ({})", describe_error(&e)),
            })?;

    Ok(tx.into())
}

/// Turns a non-2xx response into a failure. Reading the body is best-effort.
async fn ensure_success(endpoint: &str, response: Response) -> Result<Response, ProviderFailure> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.ok();

    Err(ProviderFailure::Status {
        endpoint: endpoint.to_string(),
        status: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or_default().to_string(),
        body,
    })
}

fn transport_failure(endpoint: &str, error: &reqwest::Error) -> ProviderFailure {
    ProviderFailure::Transport {
        endpoint: endpoint.to_string(),
        reason: describe_error(error).to_string(),
    }
}

/// Short, host-free description of a reqwest error.
fn describe_error(error: &reqwest::Error) -> &'static str {
    if error.is_connect() {
        "connection refused or unreachable"
    } else if error.is_timeout() {
        "connection timed out"
    } else if error.is_decode() {
        "response decode error"
    } else if error.is_body() {
        "response body error"
    } else if error.is_redirect() {
        "too many redirects"
    } else if error.is_request() {
        "request failed"
    } else {
        "network error"
    }
}
