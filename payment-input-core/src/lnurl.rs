//! LNURL decoding: every spelling of an LNURL is reduced to the HTTPS URL it
//! points at.
//!
//! Accepted spellings:
//!
//! | Input                        | Rule    | Decoded URL                  |
//! |------------------------------|---------|------------------------------|
//! | `lnurl1dp68gurn8ghj7...`     | LUD-01  | bech32 payload, any case     |
//! | `lnurlp://host/path`         | LUD-17  | `https://host/path`          |
//! | `lnurlw://`, `lnurlc://`     | LUD-17  | same rewrite                 |
//! | `keyauth://host/path?k1=..`  | LUD-17  | same rewrite, always a login |
//! | `https://host/path`          |         | unchanged (scheme lowercased)|
//!
//! `lnurl://` is refused outright rather than guessed at, as are cleartext
//! `http://` URLs and Tor `.onion` hosts.

use std::borrow::Cow;

use bech32::{Bech32, Hrp};
use serde_json::Value;

use crate::{error::LnurlError, lnurl_params::LnurlParams, uri::Uri};

/// bech32 human readable part of LUD-01 LNURLs.
const LNURL_HRP: Hrp = Hrp::parse_unchecked("lnurl");

/// A decoded LNURL.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Lnurl {
    /// Where the LNURL points. Always `https://`.
    pub http_url: String,
    /// How the LNURL was spelled.
    pub scheme: LnurlScheme,
    /// The LUD-01 `tag` query param of `http_url`, if any.
    pub tag: Option<String>,
}

/// How an LNURL was spelled. The LUD-17 schemes announce the flow up front.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LnurlScheme {
    /// bech32 or plain `https://`
    Https,
    /// `lnurlp://`
    Pay,
    /// `lnurlw://`
    Withdraw,
    /// `lnurlc://`
    Channel,
    /// `keyauth://`
    Auth,
}

impl LnurlScheme {
    /// Map a URI scheme to its LUD-17 meaning. `Ok(None)` for schemes that
    /// aren't LUD-17 at all.
    fn from_lud17(scheme: &str) -> Result<Option<Self>, LnurlError> {
        let lud17 = match scheme.to_ascii_lowercase().as_str() {
            "lnurlp" => Self::Pay,
            "lnurlw" => Self::Withdraw,
            "lnurlc" => Self::Channel,
            "keyauth" => Self::Auth,
            "lnurl" =>
                return Err(decode_err(
                    "'lnurl://' is not a LUD-17 scheme; use 'lnurlp://', \
                     'lnurlw://', 'lnurlc://', or 'keyauth://'",
                )),
            _ => return Ok(None),
        };
        Ok(Some(lud17))
    }
}

impl Lnurl {
    /// Decode any accepted LNURL spelling.
    pub fn parse(s: &str) -> Result<Self, LnurlError> {
        let s = s.trim();

        let Some(uri) = Uri::parse(s) else {
            return if is_bech32_lnurl(s) {
                Self::parse_bech32(s)
            } else {
                Err(decode_err("not a bech32 LNURL or an LNURL URI"))
            };
        };

        if let Some(scheme) = LnurlScheme::from_lud17(uri.scheme)? {
            let rewritten = format!("https{}", &s[uri.scheme.len()..]);
            let lnurl = Self::from_https_url(&rewritten)?;
            return Ok(Self { scheme, ..lnurl });
        }

        if uri.is_http() || uri.is_https() {
            return Self::from_https_url(s);
        }

        Err(decode_err("unsupported LNURL scheme"))
    }

    /// Encode `http_url` as an uppercase-able LUD-01 bech32 string.
    pub fn to_bech32(&self) -> Result<String, LnurlError> {
        bech32::encode::<Bech32>(LNURL_HRP, self.http_url.as_bytes())
            .map_err(|e| decode_err(e.to_string()))
    }

    /// ex: `https://pay.example.com:8443/x` -> `pay.example.com`
    pub fn domain(&self) -> Option<&str> {
        Uri::parse(&self.http_url).and_then(|uri| uri.host())
    }

    /// LUD-04 auth, spelled either `keyauth://` or with `tag=login`.
    pub fn is_login(&self) -> bool {
        matches!(self.scheme, LnurlScheme::Auth)
            || self.tag.as_deref() == Some("login")
    }

    /// The `{tag, k1, callback, domain}` params of an auth LNURL, read from
    /// the URL itself. Auth endpoints are never fetched.
    pub fn login_params(&self) -> Result<LnurlParams, LnurlError> {
        let uri = Uri::parse(&self.http_url)
            .ok_or_else(|| decode_err("LNURL-auth URL is not a URI"))?;
        let k1 = uri
            .param("k1")
            .ok_or_else(|| decode_err("LNURL-auth URL has no `k1` param"))?;
        let domain = uri
            .host()
            .ok_or_else(|| decode_err("LNURL-auth URL has no host"))?;

        let mut params = LnurlParams::new();
        params.insert("tag".to_owned(), Value::from("login"));
        params.insert("k1".to_owned(), Value::from(k1.value.as_ref()));
        let callback = Value::from(self.http_url.as_str());
        params.insert("callback".to_owned(), callback);
        params.insert("domain".to_owned(), Value::from(domain));
        Ok(params)
    }

    fn parse_bech32(s: &str) -> Result<Self, LnurlError> {
        let (hrp, payload) = bech32::decode(s)
            .map_err(|e| decode_err(format!("bad bech32: {e}")))?;
        if !hrp.as_str().eq_ignore_ascii_case("lnurl") {
            return Err(decode_err(format!("unexpected bech32 hrp '{hrp}'")));
        }

        let http_url = String::from_utf8(payload)
            .map_err(|e| decode_err(format!("payload isn't UTF-8: {e}")))?;
        Self::from_https_url(&http_url)
    }

    /// Validate an `http(s)://` URL and normalize its scheme to `https`.
    fn from_https_url(url: &str) -> Result<Self, LnurlError> {
        let uri = Uri::parse(url).ok_or_else(|| decode_err("not a URL"))?;

        // LUD-01 allows cleartext only for .onion, which we don't support.
        if uri.ends_with_onion() {
            return Err(decode_err("Tor .onion LNURLs are unsupported"));
        }
        if !uri.is_https() {
            return Err(decode_err("LNURLs must use https://"));
        }
        if uri.host().is_none() {
            return Err(decode_err("LNURL has no host"));
        }

        let tag = uri.param("tag").map(|tag| tag.value.to_string());
        let http_url = format!("https{}", &url[uri.scheme.len()..]);

        Ok(Self {
            http_url,
            scheme: LnurlScheme::Https,
            tag,
        })
    }
}

/// Case-insensitive `lnurl1` prefix check.
fn is_bech32_lnurl(s: &str) -> bool {
    s.get(..6).is_some_and(|prefix| prefix.eq_ignore_ascii_case("lnurl1"))
}

fn decode_err(msg: impl Into<Cow<'static, str>>) -> LnurlError {
    LnurlError::Decode(msg.into())
}
