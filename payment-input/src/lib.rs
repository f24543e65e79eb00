//! Resolve a pasted or scanned payment input into a single canonical
//! [`ResolvedInput`].
//!
//! Supported inputs:
//! - On-chain addresses: `bc1qfj...`, `3J98t1...`
//! - BIP21 URIs, including unified QRs: `bitcoin:bc1qfj...?lightning=lnbc...`
//! - `lightning:` URIs: `lightning:lnbc...`, `lightning:lnurl1...`
//! - Raw BOLT11 invoices: `lnbc...`
//! - LNURLs (LUD-01 bech32 and LUD-17): `lnurl1...`, `lnurlp://...`
//! - Lightning Addresses (LUD-16): `satoshi@example.com`
//! - Web URLs, either LNURL endpoints or pages with a `lightning=` param
//!
//! Resolution makes at most one network request per input. Everything that
//! doesn't need the network lives in `payment-input-core`, which this crate
//! re-exports.

pub use payment_input_core::*;
use tracing::debug;

pub use crate::{
    config::ResolverConfig, fetch::LnurlFetcher, lnurl::LnurlClient,
};

/// Resolver configuration.
mod config;
/// The network seam: `LnurlFetcher`.
mod fetch;
/// `LnurlClient`, the reqwest-backed `LnurlFetcher`.
mod lnurl;

#[cfg(test)]
mod test;

/// Turns raw payment inputs into [`ResolvedInput`]s.
///
/// Holds no per-input state, so one resolver can serve any number of
/// concurrent [`resolve`](Self::resolve) calls.
pub struct PaymentInputResolver<F> {
    fetcher: F,
    config: ResolverConfig,
}

impl PaymentInputResolver<LnurlClient> {
    /// A resolver which fetches LNURLs over HTTPS.
    pub fn new(config: ResolverConfig) -> anyhow::Result<Self> {
        let fetcher = LnurlClient::new(&config)?;
        Ok(Self { fetcher, config })
    }
}

impl<F: LnurlFetcher> PaymentInputResolver<F> {
    pub fn with_fetcher(fetcher: F, config: ResolverConfig) -> Self {
        Self { fetcher, config }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve `input` into exactly one payment request, or explain why it
    /// can't be.
    ///
    /// Surrounding whitespace is ignored. On-chain addresses and `address`
    /// fields keep the caller's casing.
    pub async fn resolve(
        &self,
        input: &str,
    ) -> Result<ResolvedInput, ResolveError> {
        let input = input.trim();
        let max_len = self.config.max_input_len;
        if input.len() > max_len {
            return Err(ResolveError::TooLong { max_len });
        }

        let network = self.config.network;
        let format = InputFormat::classify_for_network(input, network);
        debug!(?format, "Classified payment input");

        match format {
            InputFormat::OnChainAddress => Ok(ResolvedInput::BitcoinAddress(
                BitcoinAddress::from_address(input.to_owned()),
            )),
            InputFormat::BitcoinUri =>
                self.resolve_uri(input, UriScheme::Bitcoin).await,
            InputFormat::LightningUri =>
                self.resolve_uri(input, UriScheme::Lightning).await,
            InputFormat::RawInvoice
            | InputFormat::RawLnurl
            | InputFormat::EmailAddress => self
                .resolve_lightning(input)
                .await
                .map_err(ResolveError::UnresolvableLightningPayload),
            InputFormat::GenericUrl => self.resolve_url(input).await,
            InputFormat::Unrecognized => Err(ResolveError::UnrecognizedFormat),
        }
    }

    async fn resolve_uri(
        &self,
        input: &str,
        scheme: UriScheme,
    ) -> Result<ResolvedInput, ResolveError> {
        let uri = StructuredUri::decode(input, scheme)?;

        match scheme {
            // Unified QR: prefer the Lightning payload when there is one.
            UriScheme::Bitcoin => match uri.lightning_payload() {
                Some(payload) => {
                    debug!("Resolving bitcoin URI's lightning payload");
                    self.resolve_lightning(payload.trim())
                        .await
                        .map_err(ResolveError::EmbeddedPayloadInvalid)
                }
                None => uri
                    .into_bitcoin_address(self.config.network)
                    .map(ResolvedInput::BitcoinAddress),
            },
            UriScheme::Lightning => {
                let payload = uri.base.trim();
                if payload.is_empty() {
                    return Err(ResolveError::EmptyLightningPayload);
                }
                self.resolve_lightning(payload)
                    .await
                    .map_err(ResolveError::UnresolvableLightningPayload)
            }
        }
    }

    /// A web URL is either a page carrying a `lightning=` param or itself
    /// an LNURL endpoint.
    ///
    /// A broken `lightning=` payload is reported like any other embedded
    /// payload. Only a URL that isn't an LNURL endpoint is unrecognized.
    async fn resolve_url(
        &self,
        input: &str,
    ) -> Result<ResolvedInput, ResolveError> {
        match lightning_param(input) {
            Some(payload) => {
                debug!("Resolving URL's lightning param");
                self.resolve_lightning(&payload)
                    .await
                    .map_err(ResolveError::EmbeddedPayloadInvalid)
            }
            None => self
                .resolve_lightning(input)
                .await
                .map_err(ResolveError::UnrecognizedUrl),
        }
    }

    /// Resolve a Lightning payload: a BOLT11 invoice, or failing that, an
    /// LNURL or Lightning Address.
    async fn resolve_lightning(
        &self,
        token: &str,
    ) -> Result<ResolvedInput, LightningError> {
        // Tolerate a doubly-wrapped `lightning:` payload.
        let token = strip_lightning_scheme(token);

        let invoice_err = match extract_invoice(token) {
            Ok(details) => return Ok(ResolvedInput::Bolt11Invoice(details)),
            Err(err) => err,
        };

        match self.resolve_lnurl(token).await {
            Ok(resolved) => Ok(resolved),
            // Report whichever failure matches what the token looks like.
            Err(_) if matches_invoice_hrp_prefix(token) => Err(invoice_err),
            Err(lnurl_err) => Err(LightningError::Lnurl(lnurl_err)),
        }
    }

    /// Resolve a Lightning Address or LNURL with at most one GET. LUD-04
    /// login LNURLs are answered from the URL itself.
    async fn resolve_lnurl(
        &self,
        token: &str,
    ) -> Result<ResolvedInput, LnurlError> {
        let params = match LightningAddress::parse(token) {
            Some(address) => {
                let url = address.well_known_url();
                debug!(%url, "Fetching Lightning Address");
                let mut params = self.fetcher.get_json(&url).await?;
                fill_derived_params(&mut params, address.domain);
                params
            }
            None => self.fetch_lnurl_params(token).await?,
        };

        let resolved = resolve_params(token.to_owned(), params)?;
        debug!(kind = resolved.type_tag(), "Resolved LNURL");
        Ok(resolved)
    }

    /// Decode `token` (bech32 LNURL, LUD-17 URI, or HTTPS URL) and retrieve
    /// its params, with `domain` (and for `payRequest`, `decodedMetadata`)
    /// filled in.
    async fn fetch_lnurl_params(
        &self,
        token: &str,
    ) -> Result<LnurlParams, LnurlError> {
        let lnurl = Lnurl::parse(token)?;

        if lnurl.is_login() {
            debug!(scheme = ?lnurl.scheme, "LNURL-auth, skipping fetch");
            return lnurl.login_params();
        }

        let domain = lnurl.domain().unwrap_or_default().to_owned();
        let mut params = self.fetcher.get_json(&lnurl.http_url).await?;
        fill_derived_params(&mut params, &domain);
        Ok(params)
    }
}

fn strip_lightning_scheme(token: &str) -> &str {
    const SCHEME: &str = "lightning:";
    match token.get(..SCHEME.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(SCHEME) =>
            token[SCHEME.len()..].trim_start_matches('/'),
        _ => token,
    }
}
