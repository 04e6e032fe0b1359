//! End-to-end tests for the push pipeline against mock relays.
//!
//! Every relay is a local mockito server speaking the Esplora subset we use:
//! `POST /api/tx` with a hex body, `GET /api/tx/{txid}` for details. Each
//! test builds its own servers and configuration.

use std::sync::{Arc, Mutex};

use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::json;

use pushtx_core::fragment;
use pushtx_core::message::{CONFIRMED_TEXT, PENDING_TEXT};
use pushtx_core::reconcile::{NETWORK_UNREACHABLE, REJECTED_BY_ALL};
use pushtx_core::registry::{ProviderEndpoint, ProviderRegistry};
use pushtx_core::relay::{BroadcastOutcome, LookupOutcome, ProviderFailure, RelayClient};
use pushtx_core::{Message, MessageState, Network, PushTx, PushTxConfig};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

const GENESIS_TX: &str = "01000000010000000000000000000000000000000000000000000000000000000000000000ffffffff4d04ffff001d0104455468652054696d65732030332f4a616e2f32303039204368616e63656c6c6f72206f6e206272696e6b206f66207365636f6e64206261696c6f757420666f722062616e6b73ffffffff0100f2052a01000000434104678afdb0fe5548271967f1a67130b7105cd6a828e03909a67962e0ea1f61deb649f6bc3f4cef38c4f35504e51ec112de5c384df7ba0b8d578a4c702b6bf11d5fac00000000";

const GENESIS_TXID: &str = "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b";

const PUSH_PATH: &str = "/api/tx";

fn genesis() -> Vec<u8> {
    hex::decode(GENESIS_TX).unwrap()
}

fn lookup_path() -> String {
    format!("{PUSH_PATH}/{GENESIS_TXID}")
}

async fn relays(count: usize) -> Vec<ServerGuard> {
    let mut servers = Vec::with_capacity(count);
    for _ in 0..count {
        servers.push(Server::new_async().await);
    }
    servers
}

fn endpoint(server: &ServerGuard) -> String {
    format!("{}{PUSH_PATH}", server.url())
}

/// Mainnet pointed at `servers`, in order. Testnet keeps its defaults.
fn config_for(servers: &[ServerGuard]) -> PushTxConfig {
    let mut config = PushTxConfig::default();
    config.mainnet.providers = servers
        .iter()
        .map(|server| ProviderEndpoint::esplora(&endpoint(server)))
        .collect();
    config
}

/// Like [`config_for`], but every push goes to a port nobody listens on.
fn config_with_unreachable_pushes(servers: &[ServerGuard]) -> PushTxConfig {
    let mut config = config_for(servers);
    for provider in &mut config.mainnet.providers {
        provider.broadcast_url = "http://127.0.0.1:1/api/tx".to_string();
    }
    config
}

fn relay_client(config: &PushTxConfig) -> RelayClient {
    RelayClient::new(Arc::new(ProviderRegistry::new(config)), &config.http).unwrap()
}

fn details_json(confirmed: bool) -> String {
    let status = if confirmed {
        json!({ "confirmed": true, "block_height": 840000 })
    } else {
        json!({ "confirmed": false })
    };
    json!({
        "txid": GENESIS_TXID,
        "vin": [ { "prevout": { "scriptpubkey_address": "bc1qsender", "value": 150000 } } ],
        "vout": [ { "scriptpubkey_address": "bc1qreceiver", "value": 100000 } ],
        "fee": 50000,
        "status": status
    })
    .to_string()
}

async fn push_answer(server: &mut ServerGuard, status: usize, body: &str) -> Mock {
    server
        .mock("POST", PUSH_PATH)
        .match_body(Matcher::Exact(GENESIS_TX.to_string()))
        .with_status(status)
        .with_body(body)
        .create_async()
        .await
}

async fn lookup_answer(server: &mut ServerGuard, status: usize, body: &str) -> Mock {
    server
        .mock("GET", lookup_path().as_str())
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await
}

async fn no_requests(server: &mut ServerGuard) -> Vec<Mock> {
    vec![
        server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await,
        server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await,
    ]
}

type Log = Arc<Mutex<Vec<Message>>>;

fn recorder() -> (Log, impl pushtx_core::Presenter) {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    (log, move |m: &Message| sink.lock().unwrap().push(m.clone()))
}

fn states(log: &Log) -> Vec<MessageState> {
    log.lock().unwrap().iter().map(|m| m.state).collect()
}

// ---------------------------------------------------------------------------
// Broadcast race
// ---------------------------------------------------------------------------

#[tokio::test]
async fn broadcast_takes_the_single_success_among_errors() {
    let mut servers = relays(3).await;
    let _a = push_answer(&mut servers[0], 500, "internal error").await;
    let _b = push_answer(&mut servers[1], 200, GENESIS_TXID).await;
    let _c = push_answer(&mut servers[2], 503, "").await;

    let client = relay_client(&config_for(&servers));
    let outcome = client.broadcast(&genesis(), Network::Bitcoin).await.unwrap();

    assert_eq!(outcome, BroadcastOutcome::Success(GENESIS_TXID.to_string()));
}

#[tokio::test]
async fn broadcast_posts_lowercase_hex_to_every_relay() {
    let mut servers = relays(2).await;
    let first = push_answer(&mut servers[0], 400, "rejected").await;
    let second = push_answer(&mut servers[1], 400, "rejected").await;

    let client = relay_client(&config_for(&servers));
    client.broadcast(&genesis(), Network::Bitcoin).await.unwrap();

    first.assert_async().await;
    second.assert_async().await;
}

#[tokio::test]
async fn broadcast_failures_come_back_in_request_order() {
    let mut servers = relays(3).await;
    let _a = push_answer(&mut servers[0], 400, "bad-txns-inputs-missingorspent").await;
    let _b = push_answer(&mut servers[1], 503, "").await;
    let _c = push_answer(&mut servers[2], 400, "txn-mempool-conflict").await;
    let expected: Vec<String> = servers.iter().map(endpoint).collect();

    let client = relay_client(&config_for(&servers));
    let BroadcastOutcome::AllFailed(failures) =
        client.broadcast(&genesis(), Network::Bitcoin).await.unwrap()
    else {
        panic!("expected every relay to fail");
    };

    let endpoints: Vec<_> = failures.iter().map(ProviderFailure::endpoint).collect();
    assert_eq!(endpoints, expected);
    assert_eq!(failures[0].status(), Some(400));
    assert_eq!(
        failures[0].provider_text().as_deref(),
        Some("bad-txns-inputs-missingorspent")
    );
    assert_eq!(failures[1].provider_text().as_deref(), Some("503 Service Unavailable"));
}

// ---------------------------------------------------------------------------
// Lookup race
// ---------------------------------------------------------------------------

#[tokio::test]
async fn lookup_finds_details_on_any_relay() {
    let mut servers = relays(2).await;
    let _a = lookup_answer(&mut servers[0], 404, "Transaction not found").await;
    let _b = lookup_answer(&mut servers[1], 200, &details_json(true)).await;

    let client = relay_client(&config_for(&servers));
    let outcome = client
        .lookup_details(GENESIS_TXID, Network::Bitcoin)
        .await
        .unwrap();

    let details = outcome.details().expect("details");
    assert!(details.confirmed);
    assert_eq!(details.block_height, Some(840000));
    assert_eq!(details.outputs[0].display_value(), "0.00100000");
}

#[tokio::test]
async fn lookup_404_everywhere_is_not_found() {
    let mut servers = relays(2).await;
    let _a = lookup_answer(&mut servers[0], 404, "Transaction not found").await;
    let _b = lookup_answer(&mut servers[1], 404, "Transaction not found").await;

    let client = relay_client(&config_for(&servers));
    let outcome = client
        .lookup_details(GENESIS_TXID, Network::Bitcoin)
        .await
        .unwrap();

    assert!(matches!(outcome, LookupOutcome::NotFound(ref f) if f.len() == 2));
}

#[tokio::test]
async fn unparseable_details_are_invalid_responses() {
    let mut servers = relays(1).await;
    let _a = lookup_answer(&mut servers[0], 200, "{\"not\": \"esplora\"}").await;

    let client = relay_client(&config_for(&servers));
    let LookupOutcome::AllFailed(failures) = client
        .lookup_details(GENESIS_TXID, Network::Bitcoin)
        .await
        .unwrap()
    else {
        panic!("expected the lookup to fail");
    };

    assert!(matches!(failures[0], ProviderFailure::InvalidResponse { .. }));
    assert!(failures[0].reached_provider());
}

// ---------------------------------------------------------------------------
// Full runs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn rejected_push_that_relays_know_is_pending_success() {
    let mut servers = relays(2).await;
    let _pa = push_answer(&mut servers[0], 400, "bad-txns-inputs-missingorspent").await;
    let _pb = push_answer(&mut servers[1], 400, "bad-txns-inputs-missingorspent").await;
    let _la = lookup_answer(&mut servers[0], 404, "Transaction not found").await;
    let _lb = lookup_answer(&mut servers[1], 200, &details_json(false)).await;

    let pipeline = PushTx::new(config_for(&servers)).unwrap();
    let (log, presenter) = recorder();
    let url = fragment::push_url("https://coldcard.com/pushtx", &genesis(), Network::Bitcoin);

    let message = pipeline.run(Some(&url), &presenter).await;

    assert_eq!(message.state, MessageState::Success);
    assert_eq!(
        message.message,
        format!("{PENDING_TEXT} Transaction ID: {GENESIS_TXID}")
    );
    assert_eq!(message.details.as_ref().map(|d| d.fee), Some(50000));
    assert_eq!(message.explorer_links.len(), 4);
    assert_eq!(
        message.explorer_links[0].url,
        format!("https://mempool.space/tx/{GENESIS_TXID}")
    );
    assert_eq!(states(&log), vec![MessageState::Progress, MessageState::Success]);
}

#[tokio::test]
async fn unreachable_pushes_with_known_transaction_are_pending_success() {
    let mut servers = relays(2).await;
    let _la = lookup_answer(&mut servers[0], 404, "Transaction not found").await;
    let _lb = lookup_answer(&mut servers[1], 200, &details_json(false)).await;

    let pipeline = PushTx::new(config_with_unreachable_pushes(&servers)).unwrap();
    let (log, presenter) = recorder();
    let fragment = fragment::encode(&genesis(), Network::Bitcoin);

    let message = pipeline.run(Some(&fragment), &presenter).await;

    assert_eq!(message.state, MessageState::Success);
    assert_eq!(
        message.message,
        format!("{PENDING_TEXT} Transaction ID: {GENESIS_TXID}")
    );
    assert!(message.details.is_some());
    assert_eq!(states(&log), vec![MessageState::Progress, MessageState::Success]);
}

#[tokio::test]
async fn status_only_lookup_body_still_counts_as_found() {
    let mut servers = relays(2).await;
    let _pa = push_answer(&mut servers[0], 503, "").await;
    let _pb = push_answer(&mut servers[1], 503, "").await;
    let _la = lookup_answer(&mut servers[0], 404, "Transaction not found").await;
    let _lb = lookup_answer(&mut servers[1], 200, r#"{"status":{"confirmed":false}}"#).await;

    let pipeline = PushTx::new(config_for(&servers)).unwrap();
    let (log, presenter) = recorder();
    let fragment = fragment::encode(&genesis(), Network::Bitcoin);

    let message = pipeline.run(Some(&fragment), &presenter).await;

    assert_eq!(message.state, MessageState::Success);
    assert!(message.message.starts_with(PENDING_TEXT));
    let details = message.details.expect("lookup details");
    assert!(!details.confirmed);
    assert!(details.inputs.is_empty());
    assert_eq!(states(&log), vec![MessageState::Progress, MessageState::Success]);
}

#[tokio::test]
async fn unreachable_pushes_and_no_lookup_is_the_connectivity_error() {
    let mut servers = relays(1).await;
    let _l = lookup_answer(&mut servers[0], 404, "Transaction not found").await;

    let pipeline = PushTx::new(config_with_unreachable_pushes(&servers)).unwrap();
    let (_, presenter) = recorder();
    let fragment = fragment::encode(&genesis(), Network::Bitcoin);

    let message = pipeline.run(Some(&fragment), &presenter).await;

    assert_eq!(message, Message::error(NETWORK_UNREACHABLE));
}

#[tokio::test]
async fn accepted_push_with_confirmed_lookup_is_confirmed() {
    let mut servers = relays(2).await;
    let _pa = push_answer(&mut servers[0], 200, GENESIS_TXID).await;
    let _pb = push_answer(&mut servers[1], 400, "txn-already-known").await;
    let _la = lookup_answer(&mut servers[0], 200, &details_json(true)).await;
    let _lb = lookup_answer(&mut servers[1], 200, &details_json(true)).await;

    let pipeline = PushTx::new(config_for(&servers)).unwrap();
    let (_, presenter) = recorder();
    let fragment = fragment::encode(&genesis(), Network::Bitcoin);

    let message = pipeline.run(Some(&fragment), &presenter).await;

    assert_eq!(message.state, MessageState::Success);
    assert!(message.message.starts_with(CONFIRMED_TEXT));
    assert!(message.details.is_some());
}

#[tokio::test]
async fn accepted_push_without_lookup_is_pending_without_details() {
    let mut servers = relays(1).await;
    let _p = push_answer(&mut servers[0], 200, GENESIS_TXID).await;
    let _l = lookup_answer(&mut servers[0], 404, "Transaction not found").await;

    let pipeline = PushTx::new(config_for(&servers)).unwrap();
    let (_, presenter) = recorder();
    let fragment = fragment::encode(&genesis(), Network::Bitcoin);

    let message = pipeline.run(Some(&fragment), &presenter).await;

    assert!(message.message.starts_with(PENDING_TEXT));
    assert!(message.details.is_none());
    assert!(!message.explorer_links.is_empty());
}

#[tokio::test]
async fn rejected_everywhere_shows_relay_text() {
    let mut servers = relays(2).await;
    let _pa = push_answer(&mut servers[0], 400, "bad-txns-inputs-missingorspent").await;
    let _pb = push_answer(&mut servers[1], 400, "bad-txns-inputs-missingorspent").await;
    let _la = lookup_answer(&mut servers[0], 404, "Transaction not found").await;
    let _lb = lookup_answer(&mut servers[1], 404, "Transaction not found").await;

    let pipeline = PushTx::new(config_for(&servers)).unwrap();
    let (_, presenter) = recorder();
    let fragment = fragment::encode(&genesis(), Network::Bitcoin);

    let message = pipeline.run(Some(&fragment), &presenter).await;

    assert_eq!(message.state, MessageState::Error);
    assert!(message.message.starts_with(REJECTED_BY_ALL));
    assert!(message
        .message
        .contains(&format!("{}: bad-txns-inputs-missingorspent", endpoint(&servers[1]))));
    assert!(message.explorer_links.is_empty());
}

#[tokio::test]
async fn missing_checksum_never_touches_the_network() {
    let mut servers = relays(1).await;
    let guards = no_requests(&mut servers[0]).await;

    let pipeline = PushTx::new(config_for(&servers)).unwrap();
    let (log, presenter) = recorder();
    let message = pipeline
        .run(Some("https://coldcard.com/pushtx#t=AQAAAAEAAAAA"), &presenter)
        .await;

    assert_eq!(
        message,
        Message::error("Invalid URL - missing or incomplete checksum. The URL is probably truncated")
    );
    assert_eq!(states(&log), vec![MessageState::Progress, MessageState::Error]);
    for guard in guards {
        guard.assert_async().await;
    }
}

#[tokio::test]
async fn no_fragment_is_info_without_requests() {
    let mut servers = relays(1).await;
    let guards = no_requests(&mut servers[0]).await;

    let pipeline = PushTx::new(config_for(&servers)).unwrap();
    let (log, presenter) = recorder();

    for target in [None, Some("https://coldcard.com/pushtx"), Some("#")] {
        let message = pipeline.run(target, &presenter).await;
        assert_eq!(message.state, MessageState::Info);
    }

    assert_eq!(states(&log), vec![MessageState::Info; 3]);
    for guard in guards {
        guard.assert_async().await;
    }
}

#[tokio::test]
async fn regtest_fragment_is_refused_before_any_request() {
    let mut servers = relays(1).await;
    let guards = no_requests(&mut servers[0]).await;

    let pipeline = PushTx::new(config_for(&servers)).unwrap();
    let (_, presenter) = recorder();
    let fragment = fragment::encode(&genesis(), Network::Bitcoin).replace("n=BTC", "n=XRT");

    let message = pipeline.run(Some(&fragment), &presenter).await;

    assert_eq!(message, Message::error("Regtest transactions are not supported."));
    for guard in guards {
        guard.assert_async().await;
    }
}
