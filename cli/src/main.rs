// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # PushTX Command Line
//!
//! Entry point for the `pushtx` binary. Parses CLI arguments, initializes
//! logging, loads the relay configuration, and drives the push pipeline.
//!
//! The binary supports five subcommands:
//!
//! - `push`    — push the transaction in one URL or fragment
//! - `watch`   — treat each stdin line as a new navigation
//! - `encode`  — build a push URL from raw transaction hex
//! - `decode`  — verify a fragment offline and print its txid
//! - `version` — print build version information

mod cli;
mod logging;
mod render;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use pushtx_core::fragment;
use pushtx_core::transaction::{BitcoinCodec, TransactionCodec};
use pushtx_core::{Message, MessageState, NavigationSession, PushTx, PushTxConfig};

use cli::{Commands, PushTxCli};
use logging::LogFormat;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let PushTxCli {
        command,
        config,
        output,
        log_format,
    } = PushTxCli::parse();

    logging::init_logging(logging::DEFAULT_FILTER, LogFormat::from_str_lossy(&log_format));

    match command {
        Commands::Push(args) => {
            let pipeline = build_pipeline(config.as_deref())?;
            let presenter = render::presenter(output);
            let message = pipeline
                .run(args.target.as_deref(), presenter.as_ref())
                .await;
            Ok(exit_code(&message))
        }
        Commands::Watch => watch(config.as_deref(), output).await,
        Commands::Encode(args) => {
            encode(config.as_deref(), args)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Decode(args) => {
            decode(&args.target)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Version => {
            print_version();
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Built-in tables, or the file at `path` if one was given.
fn load_config(path: Option<&Path>) -> Result<PushTxConfig> {
    let Some(path) = path else {
        return Ok(PushTxConfig::default());
    };

    let config = PushTxConfig::from_json_file(path)
        .with_context(|| format!("failed to load config from {}", path.display()))?;
    tracing::info!(path = %path.display(), "loaded relay configuration");
    Ok(config)
}

fn build_pipeline(config_path: Option<&Path>) -> Result<PushTx> {
    let config = load_config(config_path)?;
    PushTx::new(config).context("failed to set up relay client")
}

fn exit_code(message: &Message) -> ExitCode {
    match message.state {
        MessageState::Error => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    }
}

/// Runs the pipeline for every stdin line. A new line supersedes whatever
/// run is still in flight; at EOF we wait for the last one.
async fn watch(config_path: Option<&Path>, output: cli::OutputFormat) -> Result<ExitCode> {
    let session = NavigationSession::new(Arc::new(build_pipeline(config_path)?));
    let presenter = render::presenter(output);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut latest = None;

    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let target = Some(line.trim().to_string()).filter(|t| !t.is_empty());
        latest = Some(session.navigate(target, Arc::clone(&presenter)));
    }

    let Some(handle) = latest else {
        tracing::info!("no navigation received");
        return Ok(ExitCode::SUCCESS);
    };

    let message = handle.await.context("pipeline task failed")?;
    Ok(message.as_ref().map_or(ExitCode::SUCCESS, exit_code))
}

/// Prints the push URL for a hex transaction.
fn encode(config_path: Option<&Path>, args: cli::EncodeArgs) -> Result<()> {
    let bytes = hex::decode(args.hex.trim()).context("transaction must be hex-encoded")?;

    match BitcoinCodec.transaction_id(&bytes) {
        Ok(txid) => tracing::info!(%txid, "encoding transaction"),
        Err(e) => tracing::warn!(error = %e, "encoding bytes that are not a transaction"),
    }

    let page_url = match args.page_url {
        Some(url) => url,
        None => load_config(config_path)?.page_url,
    };

    println!("{}", fragment::push_url(&page_url, &bytes, args.network));
    Ok(())
}

/// Verifies a fragment without touching the network and describes it.
fn decode(target: &str) -> Result<()> {
    let encoded = fragment::extract(target).ok_or_else(|| anyhow!("no fragment in {target:?}"))?;
    let decoded = fragment::decode(encoded)?;
    let txid = BitcoinCodec.transaction_id(&decoded.bytes)?;

    println!("Fragment verified.");
    println!("  Network : {}", decoded.network);
    println!("  Size    : {} bytes", decoded.bytes.len());
    println!("  Txid    : {}", txid);

    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("pushtx {}", env!("CARGO_PKG_VERSION"));
    println!("rustc  {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}
