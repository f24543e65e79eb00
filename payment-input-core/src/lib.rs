//! Core types and logic for resolving pasted or scanned payment inputs:
//! on-chain addresses, `bitcoin:` / `lightning:` URIs, BOLT11 invoices,
//! LNURLs, and Lightning Addresses.
//!
//! Everything here is synchronous and network-free. For actually *resolving*
//! an input into a [`ResolvedInput`], which frequently requires fetching
//! LNURL parameters, see the `payment-input` crate.

// `proptest_derive::Arbitrary` issue.
// See: <https://github.com/proptest-rs/proptest/issues/447>
#![allow(non_local_definitions)]

/// Export all public types so they are accessible via the crate root.
/// The containing modules are used only for internal organization, and are
/// intentionally private so crate users have a simple, flat namespace.
pub use crate::{
    address::{is_onchain_address, parse_onchain_address},
    bip21::{StructuredUri, UriScheme},
    email_like::LightningAddress,
    error::{ErrorKind, LightningError, LnurlError, ResolveError},
    format::InputFormat,
    invoice::{
        DecodedInvoice, EMBEDDED_IDENTITY_SCID, InvoiceTag, RouteHop,
        extract_invoice, matches_invoice_hrp_prefix,
    },
    lnurl::{Lnurl, LnurlScheme},
    lnurl_params::{
        LnurlParams, decode_pay_metadata, fill_derived_params, resolve_params,
    },
    resolved::{
        BitcoinAddress, InvoiceDetails, LnurlLogin, LnurlPay, LnurlWithdraw,
        ResolvedInput,
    },
    uri::lightning_param,
};

/// Signed invoice fixtures.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

/// On-chain address validation.
mod address;
/// `bitcoin:` and `lightning:` URI decoding.
mod bip21;
/// Email-like Lightning Addresses.
mod email_like;
/// Resolution errors and their broad kinds.
mod error;
/// Prefix-based input classification.
mod format;
/// BOLT11 invoice decoding and field extraction.
mod invoice;
/// LNURL decoding: bech32, LUD-17, and HTTPS.
mod lnurl;
/// LNURL parameter maps -> pay / withdraw / login.
mod lnurl_params;
/// The canonical `ResolvedInput` and its variants.
mod resolved;
/// Low level URI building blocks: `Uri`, `UriParam`
mod uri;

/// Refuse to parse any input longer than this many KiB by default.
pub const MAX_INPUT_LEN_KIB: usize = 8;
