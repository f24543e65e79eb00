use std::{borrow::Cow, fmt, str::FromStr};

use bitcoin::Network;
#[cfg(test)]
use proptest_derive::Arbitrary;
use rust_decimal::Decimal;

use crate::{
    address,
    error::ResolveError,
    resolved::BitcoinAddress,
    uri::Uri,
};

/// The URI schemes we decode into a [`StructuredUri`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(test, derive(Arbitrary))]
pub enum UriScheme {
    Bitcoin,
    Lightning,
}

impl UriScheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bitcoin => "bitcoin",
            Self::Lightning => "lightning",
        }
    }
}

impl fmt::Display for UriScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded
/// [BIP21](https://github.com/bitcoin/bips/blob/master/bip-0021.mediawiki)
/// style URI: a base target plus its query options.
///
/// ```not_rust
/// bitcoin:175tWpb8K1S7NmH4Zx6rewF9WQrcZv245W?amount=20.3&label=Luke-Jr
/// lightning:lnbc110n1pj...
/// lightning://lnurl1dp68gurn8ghj7...
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StructuredUri {
    pub scheme: UriScheme,
    /// The URI body: an on-chain address for `bitcoin:`, a Lightning payload
    /// for `lightning:`. May be empty.
    pub base: String,
    /// Percent-decoded `(key, value)` query options, in encounter order.
    pub options: Vec<(String, String)>,
}

impl StructuredUri {
    /// Decode `s` as a `<scheme>:` URI. The scheme is case-insensitive.
    ///
    /// Params without `=` or with invalid percent-encoding are dropped. A
    /// non-empty `amount` option that isn't a non-negative number makes the
    /// whole URI malformed.
    pub fn decode(s: &str, scheme: UriScheme) -> Result<Self, ResolveError> {
        let uri = Uri::parse(s).ok_or_else(|| {
            ResolveError::InvalidUriSyntax(Cow::from(format!(
                "expected a '{scheme}:' URI"
            )))
        })?;

        if !uri.scheme.eq_ignore_ascii_case(scheme.as_str()) {
            return Err(ResolveError::InvalidUriSyntax(Cow::from(format!(
                "expected a '{scheme}:' URI, got '{}:'",
                uri.scheme
            ))));
        }

        // `lightning://lnbc...` is common in the wild.
        let base = uri.body.strip_prefix("//").unwrap_or(uri.body);

        if let Some(amount) = uri.param("amount")
            && !amount.value.trim().is_empty()
        {
            validate_btc_amount(&amount.value)?;
        }

        let options = uri
            .params
            .into_iter()
            .map(|param| (param.key.into_owned(), param.value.into_owned()))
            .collect();

        Ok(Self {
            scheme,
            base: base.to_owned(),
            options,
        })
    }

    /// The first option whose key matches `key` (case-insensitive).
    pub fn option(&self, key: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// An embedded Lightning payload (unified QR `lightning=` option).
    /// An empty value counts as absent.
    pub fn lightning_payload(&self) -> Option<&str> {
        self.option("lightning").filter(|v| !v.trim().is_empty())
    }

    /// Convert a `bitcoin:` URI without an embedded Lightning payload into
    /// a [`BitcoinAddress`], validating the base address.
    pub fn into_bitcoin_address(
        self,
        network: Option<Network>,
    ) -> Result<BitcoinAddress, ResolveError> {
        if !address::is_onchain_address(&self.base, network) {
            return Err(ResolveError::InvalidBaseAddress(self.base));
        }

        let mut amount = None;
        let mut label = None;
        let mut message = None;
        let mut options = Vec::new();

        for (key, value) in self.options {
            if key.eq_ignore_ascii_case("amount") && amount.is_none() {
                amount = Some(value);
            } else if key.eq_ignore_ascii_case("label") && label.is_none() {
                label = Some(value);
            } else if key.eq_ignore_ascii_case("message") && message.is_none()
            {
                message = Some(value);
            } else {
                // Unknown, `req-*`, and duplicate keys pass through verbatim.
                options.push((key, value));
            }
        }

        Ok(BitcoinAddress {
            address: self.base,
            amount,
            label,
            message,
            options,
        })
    }
}

/// Check that a BIP21 `amount` is a non-negative decimal number of BTC. The
/// original string is kept as-is; we only reject garbage here.
fn validate_btc_amount(s: &str) -> Result<(), ResolveError> {
    let invalid = || {
        ResolveError::InvalidUriSyntax(Cow::from(format!(
            "invalid amount: '{s}'"
        )))
    };

    let trimmed = s.trim();
    // rust_decimal silently skips `_` digit separators.
    if trimmed.contains('_') {
        return Err(invalid());
    }
    let amount = if trimmed.contains(['e', 'E']) {
        Decimal::from_scientific(trimmed)
    } else {
        Decimal::from_str(trimmed)
    }
    .map_err(|_| invalid())?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(ResolveError::InvalidUriSyntax(Cow::from(format!(
            "negative amount: '{s}'"
        ))));
    }
    Ok(())
}
