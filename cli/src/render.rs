//! Terminal and JSON presenters.

use std::io::Write;
use std::sync::Arc;

use pushtx_core::message::{Message, MessageState};
use pushtx_core::relay::{format_btc, TxEndpoint};
use pushtx_core::Presenter;

use crate::cli::OutputFormat;

/// Picks the presenter for `format`.
pub fn presenter(format: OutputFormat) -> Arc<dyn Presenter> {
    match format {
        OutputFormat::Text => Arc::new(TerminalPresenter),
        OutputFormat::Json => Arc::new(JsonPresenter),
    }
}

/// Human-readable output.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPresenter;

impl Presenter for TerminalPresenter {
    fn present(&self, message: &Message) {
        write_stdout(&render_text(message));
    }
}

/// One JSON object per line, in the output contract's shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPresenter;

impl Presenter for JsonPresenter {
    fn present(&self, message: &Message) {
        match serde_json::to_string(message) {
            Ok(line) => write_stdout(&line),
            Err(e) => tracing::error!(error = %e, "failed to serialize message"),
        }
    }
}

fn write_stdout(text: &str) {
    let mut stdout = std::io::stdout().lock();
    if let Err(e) = writeln!(stdout, "{text}") {
        tracing::error!(error = %e, "failed to write to stdout");
    }
}

fn state_label(state: MessageState) -> &'static str {
    match state {
        MessageState::Info => "info",
        MessageState::Progress => "....",
        MessageState::Success => " ok ",
        MessageState::Error => "FAIL",
    }
}

/// Renders a message as plain text, details and links included.
pub fn render_text(message: &Message) -> String {
    let mut out = format!("[{}] {}", state_label(message.state), message.message);

    if let Some(details) = &message.details {
        out.push_str("\n\nInputs:");
        push_endpoints(&mut out, &details.inputs);
        out.push_str("\nOutputs:");
        push_endpoints(&mut out, &details.outputs);
        out.push_str(&format!("\nFee: {} BTC", details.display_fee()));
        if let Some(height) = details.block_height {
            out.push_str(&format!("\nBlock: {height}"));
        }
    }

    if !message.explorer_links.is_empty() {
        out.push_str("\n\nVerify on a block explorer:");
        for link in &message.explorer_links {
            out.push_str(&format!("\n  {:<18} {}", link.name, link.url));
        }
    }

    out
}

fn push_endpoints(out: &mut String, endpoints: &[TxEndpoint]) {
    if endpoints.is_empty() {
        out.push_str("\n  (none)");
    }
    for endpoint in endpoints {
        let address = endpoint.address.as_deref().unwrap_or("(no address)");
        out.push_str(&format!("\n  {address}  {} BTC", format_btc(endpoint.value)));
    }
}
