//! Parse errors for push fragments.
//!
//! The `Display` text of each variant is shown to the user verbatim, so it
//! is written for a person holding a phone, not for a log file.

use thiserror::Error;

/// Reasons a fragment cannot be turned into transaction bytes.
///
/// All of these are fatal to the run: the input is malformed or damaged and
/// asking again will not help.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FragmentError {
    /// No `t` parameter, or an empty one.
    #[error("Invalid URL - missing transaction.")]
    MissingField,

    /// No `c` parameter, or one that cannot hold exactly 8 bytes.
    #[error("Invalid URL - missing or incomplete checksum. The URL is probably truncated")]
    BadChecksumLength,

    /// `t` or `c` is not valid base64url.
    #[error("Invalid URL encoding. The URL is probably corrupted.")]
    BadEncoding,

    /// The payload does not hash to the checksum.
    #[error("Checksum mismatch in URL. Some bytes corrupted in transit. Try again.")]
    ChecksumMismatch,

    /// The network tag is known, but there is nobody to push to.
    #[error("Regtest transactions are not supported.")]
    UnsupportedNetwork,

    /// The network tag is not one we know.
    #[error("Invalid URL. The network \"{0}\" is not recognized.")]
    UnrecognizedNetwork(String),
}
