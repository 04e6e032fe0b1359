//! The fragment codec proper.
//!
//! ```text
//!   #t=<base64url tx bytes>&c=<base64url sha256(tx)[24..32]>&n=<BTC|XTN|XRT>
//! ```
//!
//! Decoding is strictly ordered: field presence, checksum length, network
//! tag, base64, then the checksum comparison. The first failing step decides
//! the error the user sees.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use url::form_urlencoded;

use crate::config::{
    CHECKSUM_ENCODED_LENGTH, CHECKSUM_LENGTH, FRAGMENT_DELIMITER, PARAM_CHECKSUM, PARAM_NETWORK,
    PARAM_PAYLOAD,
};
use crate::hash;
use crate::network::Network;

use super::error::FragmentError;

/// base64url that tolerates missing padding and non-zero trailing bits, the
/// way browsers' `atob` does. Encodes without padding.
const BASE64_URL: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

// ---------------------------------------------------------------------------
// EncodedFragment
// ---------------------------------------------------------------------------

/// The raw key/value view of a fragment, before any base64 or hashing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFragment {
    /// base64url transaction bytes (`t`).
    pub payload: String,
    /// base64url checksum (`c`), exactly 11 characters.
    pub checksum: String,
    /// Network tag (`n`), if present and non-empty.
    pub network_tag: Option<String>,
}

impl EncodedFragment {
    /// Splits a fragment into its fields and enforces field presence and
    /// checksum length.
    pub fn parse(fragment: &str) -> Result<Self, FragmentError> {
        let fragment = fragment
            .strip_prefix(FRAGMENT_DELIMITER)
            .unwrap_or(fragment);

        let mut payload = None;
        let mut checksum = None;
        let mut network_tag = None;

        // First occurrence of a key wins.
        for (key, value) in form_urlencoded::parse(fragment.as_bytes()) {
            let slot = match &*key {
                PARAM_PAYLOAD => &mut payload,
                PARAM_CHECKSUM => &mut checksum,
                PARAM_NETWORK => &mut network_tag,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }

        let payload = payload
            .filter(|t| !t.is_empty())
            .ok_or(FragmentError::MissingField)?;

        let checksum = checksum
            .filter(|c| c.chars().count() == CHECKSUM_ENCODED_LENGTH)
            .ok_or(FragmentError::BadChecksumLength)?;

        Ok(Self {
            payload,
            checksum,
            network_tag: network_tag.filter(|n| !n.is_empty()),
        })
    }

    /// Resolves the network tag. Absent means mainnet; regtest is recognized
    /// and refused.
    pub fn network(&self) -> Result<Network, FragmentError> {
        let Some(tag) = self.network_tag.as_deref() else {
            return Ok(Network::default());
        };

        match Network::from_tag(tag) {
            Some(network) if network.is_supported() => Ok(network),
            Some(_) => Err(FragmentError::UnsupportedNetwork),
            None => Err(FragmentError::UnrecognizedNetwork(tag.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Decode / Encode
// ---------------------------------------------------------------------------

/// Verified transaction bytes and the network they are meant for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFragment {
    /// Raw transaction bytes. Not checked for structure here.
    pub bytes: Vec<u8>,
    /// Target network.
    pub network: Network,
}

/// Decodes and verifies a push fragment.
///
/// A leading `#` is optional. Only the checksum is verified; whether the bytes
/// form a valid transaction is for the transaction codec to decide.
pub fn decode(fragment: &str) -> Result<DecodedFragment, FragmentError> {
    let encoded = EncodedFragment::parse(fragment)?;
    let network = encoded.network()?;

    let bytes = base64url_decode(&encoded.payload)?;
    let check = base64url_decode(&encoded.checksum)?;

    let check: [u8; CHECKSUM_LENGTH] = check
        .try_into()
        .map_err(|_| FragmentError::BadChecksumLength)?;

    if hash::checksum(&bytes) != check {
        return Err(FragmentError::ChecksumMismatch);
    }

    Ok(DecodedFragment { bytes, network })
}

/// Builds the fragment (with leading `#`) for `bytes` on `network`.
///
/// Only debug tooling needs this; the live pipeline never encodes.
pub fn encode(bytes: &[u8], network: Network) -> String {
    format!(
        "{FRAGMENT_DELIMITER}{PARAM_PAYLOAD}={}&{PARAM_CHECKSUM}={}&{PARAM_NETWORK}={}",
        BASE64_URL.encode(bytes),
        BASE64_URL.encode(hash::checksum(bytes)),
        network.tag(),
    )
}

/// Builds a complete push URL: `page_url` followed by the fragment.
pub fn push_url(page_url: &str, bytes: &[u8], network: Network) -> String {
    format!("{}{}", page_url, encode(bytes, network))
}

/// Right-pads with `=` to a multiple of four, then decodes.
fn base64url_decode(text: &str) -> Result<Vec<u8>, FragmentError> {
    let padding = (4 - text.len() % 4) % 4;
    let padded = format!("{text}{}", "=".repeat(padding));
    BASE64_URL
        .decode(padded)
        .map_err(|_| FragmentError::BadEncoding)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The Bitcoin genesis coinbase transaction.
    const GENESIS_TX: &str = "01000000010000000000000000000000000000000000000000000000000000000000000000ffffffff4d04ffff001d0104455468652054696d65732030332f4a616e2f32303039204368616e63656c6c6f72206f6e206272696e6b206f66207365636f6e64206261696c6f757420666f722062616e6b73ffffffff0100f2052a01000000434104678afdb0fe5548271967f1a67130b7105cd6a828e03909a67962e0ea1f61deb649f6bc3f4cef38c4f35504e51ec112de5c384df7ba0b8d578a4c702b6bf11d5fac00000000";

    const GENESIS_CHECKSUM: &str = "uwSvoYoxxr8";

    fn genesis() -> Vec<u8> {
        hex::decode(GENESIS_TX).unwrap()
    }

    /// Payload part of a valid fragment, without `c` or `n`.
    fn genesis_payload() -> String {
        BASE64_URL.encode(genesis())
    }

    #[test]
    fn encode_matches_known_vector() {
        let fragment = encode(&genesis(), Network::Bitcoin);
        assert!(fragment.starts_with("#t=AQAAAAEAAAAA"));
        assert!(fragment.ends_with(&format!("&c={GENESIS_CHECKSUM}&n=BTC")));
    }

    #[test]
    fn round_trip_every_supported_network() {
        for network in [Network::Bitcoin, Network::Testnet] {
            let decoded = decode(&encode(&genesis(), network)).unwrap();
            assert_eq!(decoded.bytes, genesis());
            assert_eq!(decoded.network, network);
        }
    }

    #[test]
    fn round_trip_odd_lengths() {
        // Every residue mod 3 exercises a different amount of padding.
        for len in 1..=7u8 {
            let bytes: Vec<u8> = (0..len).map(|i| i.wrapping_mul(37)).collect();
            let decoded = decode(&encode(&bytes, Network::Testnet)).unwrap();
            assert_eq!(decoded.bytes, bytes);
        }
    }

    #[test]
    fn leading_hash_is_optional() {
        let with = encode(&genesis(), Network::Bitcoin);
        let without = with.trim_start_matches('#');
        assert_eq!(decode(&with).unwrap(), decode(without).unwrap());
    }

    #[test]
    fn absent_network_defaults_to_mainnet() {
        let fragment = format!("t={}&c={GENESIS_CHECKSUM}", genesis_payload());
        assert_eq!(decode(&fragment).unwrap().network, Network::Bitcoin);

        let empty_tag = format!("t={}&c={GENESIS_CHECKSUM}&n=", genesis_payload());
        assert_eq!(decode(&empty_tag).unwrap().network, Network::Bitcoin);
    }

    #[test]
    fn regtest_parses_but_is_unsupported() {
        let fragment = format!("t={}&c={GENESIS_CHECKSUM}&n=XRT", genesis_payload());
        let encoded = EncodedFragment::parse(&fragment).unwrap();
        assert_eq!(encoded.network_tag.as_deref(), Some("XRT"));
        assert_eq!(decode(&fragment), Err(FragmentError::UnsupportedNetwork));
    }

    #[test]
    fn unknown_network_is_unrecognized() {
        let fragment = format!("t={}&c={GENESIS_CHECKSUM}&n=ZZZ", genesis_payload());
        assert_eq!(
            decode(&fragment),
            Err(FragmentError::UnrecognizedNetwork("ZZZ".into()))
        );
    }

    #[test]
    fn missing_payload() {
        assert_eq!(
            decode(&format!("c={GENESIS_CHECKSUM}")),
            Err(FragmentError::MissingField)
        );
        assert_eq!(
            decode(&format!("t=&c={GENESIS_CHECKSUM}")),
            Err(FragmentError::MissingField)
        );
        assert_eq!(decode(""), Err(FragmentError::MissingField));
    }

    #[test]
    fn missing_checksum() {
        let fragment = format!("#t={}", genesis_payload());
        assert_eq!(decode(&fragment), Err(FragmentError::BadChecksumLength));
    }

    #[test]
    fn checksum_of_seven_or_nine_bytes_is_rejected() {
        let digest = hash::sha256(&genesis());
        for len in [7usize, 9] {
            let short_or_long = BASE64_URL.encode(&digest[32 - len..]);
            let fragment = format!("t={}&c={short_or_long}", genesis_payload());
            assert_eq!(
                decode(&fragment),
                Err(FragmentError::BadChecksumLength),
                "{len}-byte checksum must not be truncated or padded"
            );
        }
    }

    #[test]
    fn checksum_length_is_checked_before_network() {
        let fragment = format!("t={}&c=abc&n=ZZZ", genesis_payload());
        assert_eq!(decode(&fragment), Err(FragmentError::BadChecksumLength));
    }

    #[test]
    fn invalid_base64_is_bad_encoding() {
        let fragment = format!("t=not*base64!&c={GENESIS_CHECKSUM}");
        assert_eq!(decode(&fragment), Err(FragmentError::BadEncoding));

        let bad_check = format!("t={}&c=uwSvoYo$xr8", genesis_payload());
        assert_eq!(decode(&bad_check), Err(FragmentError::BadEncoding));
    }

    #[test]
    fn every_single_bit_flip_is_caught() {
        let original = genesis();
        for byte in 0..original.len() {
            for bit in 0..8 {
                let mut corrupted = original.clone();
                corrupted[byte] ^= 1 << bit;
                let fragment = format!(
                    "t={}&c={GENESIS_CHECKSUM}",
                    BASE64_URL.encode(&corrupted)
                );
                assert_eq!(
                    decode(&fragment),
                    Err(FragmentError::ChecksumMismatch),
                    "flip of bit {bit} in byte {byte} went unnoticed"
                );
            }
        }
    }

    #[test]
    fn first_occurrence_of_a_key_wins() {
        let fragment = format!(
            "t={}&c={GENESIS_CHECKSUM}&n=XTN&n=ZZZ",
            genesis_payload()
        );
        assert_eq!(decode(&fragment).unwrap().network, Network::Testnet);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let fragment = format!(
            "utm=x&t={}&c={GENESIS_CHECKSUM}&extra=1",
            genesis_payload()
        );
        assert!(decode(&fragment).is_ok());
    }

    #[test]
    fn push_url_prefixes_page() {
        let url = push_url("https://coldcard.com/pushtx", &genesis(), Network::Testnet);
        assert!(url.starts_with("https://coldcard.com/pushtx#t="));
        assert!(url.ends_with("&n=XTN"));
    }
}
