//! # CLI Interface
//!
//! Defines the command-line argument structure for `pushtx` using `clap`
//! derive. Supports five subcommands: `push`, `watch`, `encode`, `decode`,
//! and `version`.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use pushtx_core::Network;

/// Pushes signed Bitcoin transactions handed over as NFC push URLs.
///
/// The URL fragment carries the transaction and a checksum. `pushtx`
/// verifies it, sends the transaction to several public relays at once,
/// and reports whether it made it out.
#[derive(Parser, Debug)]
#[command(
    name = "pushtx",
    about = "Push signed Bitcoin transactions from NFC push URLs",
    version,
    propagate_version = true
)]
pub struct PushTxCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Path to a JSON file replacing the built-in relay and explorer tables.
    #[arg(long, short = 'c', global = true, env = "PUSHTX_CONFIG")]
    pub config: Option<PathBuf>,

    /// How results are printed on stdout.
    #[arg(long, short = 'o', global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    /// Log format on stderr: "pretty" or "json".
    #[arg(long, global = true, env = "PUSHTX_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,
}

/// Top-level subcommands for the `pushtx` binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Push the transaction in a URL or fragment.
    Push(PushArgs),
    /// Read URLs from stdin, one per line. Each line supersedes the last.
    Watch,
    /// Build a push URL from raw transaction hex.
    Encode(EncodeArgs),
    /// Verify a URL or fragment offline and describe its transaction.
    Decode(DecodeArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `push` subcommand.
#[derive(Parser, Debug)]
pub struct PushArgs {
    /// Full URL, `#fragment`, or bare `t=…&c=…` fragment.
    ///
    /// Without one, `pushtx` explains what it expects and exits.
    pub target: Option<String>,
}

/// Arguments for the `encode` subcommand.
#[derive(Parser, Debug)]
pub struct EncodeArgs {
    /// Serialized transaction, hex-encoded.
    pub hex: String,

    /// Network tag written into the URL: BTC, XTN, or XRT.
    #[arg(long, short = 'n', default_value = "BTC", value_parser = parse_network)]
    pub network: Network,

    /// Page URL to put in front of the fragment. Defaults to the configured one.
    #[arg(long)]
    pub page_url: Option<String>,
}

/// Arguments for the `decode` subcommand.
#[derive(Parser, Debug)]
pub struct DecodeArgs {
    /// Full URL, `#fragment`, or bare fragment.
    pub target: String,
}

/// Output format for pipeline messages.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text.
    Text,
    /// One JSON object per message.
    Json,
}

fn parse_network(tag: &str) -> Result<Network, String> {
    Network::from_tag(&tag.to_ascii_uppercase())
        .ok_or_else(|| format!("unknown network {tag:?}, expected BTC, XTN or XRT"))
}
