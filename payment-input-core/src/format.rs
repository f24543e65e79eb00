use bitcoin::Network;

use crate::{address, email_like::LightningAddress, uri::Uri};

/// The format of a raw payment input, as detected by [`InputFormat::classify`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum InputFormat {
    /// A bare on-chain address, e.g. `bc1qfj...`
    OnChainAddress,
    /// A `bitcoin:` (BIP21) URI.
    BitcoinUri,
    /// A `lightning:` URI.
    LightningUri,
    /// A raw mainnet BOLT11 invoice, e.g. `lnbc1...`
    RawInvoice,
    /// A raw LNURL, e.g. `lnurl1...` or `lnurlp://...`
    RawLnurl,
    /// An email-like Lightning Address, e.g. `satoshi@example.com`
    EmailAddress,
    /// An absolute `http://` or `https://` URL.
    GenericUrl,
    Unrecognized,
}

impl InputFormat {
    /// Classify `s`, accepting on-chain addresses for any network.
    pub fn classify(s: &str) -> Self {
        Self::classify_for_network(s, None)
    }

    /// Classify `s`. Scheme and prefix matching is case-insensitive.
    ///
    /// The checks run in a fixed priority order and the first match wins.
    /// Only the address check and the email pattern look at the payload;
    /// everything else is decided by prefix.
    pub fn classify_for_network(s: &str, network: Option<Network>) -> Self {
        if address::is_onchain_address(s, network) {
            Self::OnChainAddress
        } else if starts_with_ignore_case(s, "bitcoin") {
            Self::BitcoinUri
        } else if starts_with_ignore_case(s, "lightning") {
            Self::LightningUri
        } else if starts_with_ignore_case(s, "lnbc") {
            Self::RawInvoice
        } else if starts_with_ignore_case(s, "lnurl") {
            Self::RawLnurl
        } else if LightningAddress::matches(s) {
            Self::EmailAddress
        } else if is_http_url(s) {
            Self::GenericUrl
        } else {
            Self::Unrecognized
        }
    }
}

fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
    match s.as_bytes().split_at_checked(prefix.len()) {
        Some((s_prefix, _)) => s_prefix.eq_ignore_ascii_case(prefix.as_bytes()),
        None => false,
    }
}

/// Whether `s` is an absolute `http(s)://<host>...` URL.
fn is_http_url(s: &str) -> bool {
    match Uri::parse(s) {
        Some(uri) => (uri.is_http() || uri.is_https()) && uri.host().is_some(),
        None => false,
    }
}
