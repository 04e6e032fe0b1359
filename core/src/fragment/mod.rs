//! # Push Fragments
//!
//! A signing device hands over a transaction as a URL whose fragment carries
//! the raw bytes and a short checksum. The fragment never reaches a server,
//! so the transaction does not end up in anybody's access log.
//!
//! - `codec.rs` — parsing, verification, and the inverse encoder.
//! - `error.rs` — the user-facing parse errors.
//!
//! [`extract`] sits in front of the codec: it pulls the fragment out of
//! whatever the user pasted (a full URL, a `#fragment`, or bare `t=…&c=…`).

pub mod codec;

mod error;

pub use codec::{decode, encode, push_url, DecodedFragment, EncodedFragment};
pub use error::FragmentError;

use crate::config::FRAGMENT_DELIMITER;

/// Returns the fragment of a navigation target, or `None` when there is
/// nothing to decode.
///
/// "Nothing to decode" is a precondition, not an error: a URL without a
/// fragment (scheme or not), a lone `#`, or blank input.
pub fn extract(target: &str) -> Option<&str> {
    let target = target.trim();

    if let Some((_, fragment)) = target.split_once(FRAGMENT_DELIMITER) {
        return (!fragment.is_empty()).then_some(fragment);
    }

    // A bare fragment always carries `key=value` pairs; anything else is a
    // page address, with or without a scheme.
    if !target.contains('=') || url::Url::parse(target).is_ok() {
        return None;
    }

    Some(target)
}
