//! # Transaction Identity
//!
//! The pipeline treats transaction bytes as opaque with one exception: it
//! needs the txid to look the transaction up and to build explorer links.
//! That knowledge sits behind [`TransactionCodec`] so the rest of the crate
//! never learns what a Bitcoin transaction looks like.

use bitcoin::consensus::encode;
use thiserror::Error;

/// The payload is not a transaction this codec understands.
#[derive(Debug, Error)]
pub enum TransactionError {
    /// Consensus decoding failed.
    #[error("Invalid transaction: {0}")]
    Malformed(String),
}

/// Derives the stable identifier of a serialized transaction.
pub trait TransactionCodec: Send + Sync {
    /// Returns the identifier of `raw`, or why `raw` is not a transaction.
    fn transaction_id(&self, raw: &[u8]) -> Result<String, TransactionError>;
}

/// Bitcoin consensus encoding: the txid is the byte-reversed double SHA-256
/// of the witness-stripped serialization.
#[derive(Debug, Clone, Copy, Default)]
pub struct BitcoinCodec;

impl TransactionCodec for BitcoinCodec {
    fn transaction_id(&self, raw: &[u8]) -> Result<String, TransactionError> {
        let tx: bitcoin::Transaction =
            encode::deserialize(raw).map_err(|e| TransactionError::Malformed(e.to_string()))?;
        Ok(tx.compute_txid().to_string())
    }
}
