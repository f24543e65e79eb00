use serde::Serialize;

/// The canonical result of resolving a payment input. Exactly one variant
/// is produced per input.
///
/// Serializes as `{"type": "<tag>", "data": { .. }}` with camelCase fields.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum ResolvedInput {
    #[serde(rename = "bitcoinAddress")]
    BitcoinAddress(BitcoinAddress),
    #[serde(rename = "bolt11Address")]
    Bolt11Invoice(InvoiceDetails),
    #[serde(rename = "payRequest")]
    LnurlPay(LnurlPay),
    #[serde(rename = "withdrawRequest")]
    LnurlWithdraw(LnurlWithdraw),
    #[serde(rename = "login")]
    LnurlLogin(LnurlLogin),
}

impl ResolvedInput {
    /// The serialized `type` tag for this variant.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::BitcoinAddress(_) => "bitcoinAddress",
            Self::Bolt11Invoice(_) => "bolt11Address",
            Self::LnurlPay(_) => "payRequest",
            Self::LnurlWithdraw(_) => "withdrawRequest",
            Self::LnurlLogin(_) => "login",
        }
    }

    /// The user-facing token this result was resolved from.
    pub fn address(&self) -> &str {
        match self {
            Self::BitcoinAddress(x) => &x.address,
            Self::Bolt11Invoice(x) => &x.address,
            Self::LnurlPay(x) => &x.address,
            Self::LnurlWithdraw(x) => &x.address,
            Self::LnurlLogin(x) => &x.address,
        }
    }
}

/// An on-chain address, possibly with BIP21 options.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BitcoinAddress {
    pub address: String,
    /// The BIP21 `amount` in BTC, exactly as written in the URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Any other URI options, verbatim and in order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<(String, String)>,
}

impl BitcoinAddress {
    pub fn from_address(address: String) -> Self {
        Self {
            address,
            amount: None,
            label: None,
            message: None,
            options: Vec::new(),
        }
    }
}

/// A decoded BOLT11 invoice.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDetails {
    /// The raw invoice string, case preserved.
    pub address: String,
    /// `round(amount_msat / 1000)`, rounding half up.
    pub amount_sat: u64,
    pub amount_msat: u64,
    pub expiry_seconds: u64,
    /// Hex-encoded payment hash.
    pub payment_hash: String,
    pub description: String,
    pub timestamp_unix: u64,
    /// The receiver's pubkey, if advertised via the sentinel route hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedded_identity_pubkey: Option<String>,
}

/// LUD-06 `payRequest`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LnurlPay {
    pub address: String,
    pub callback: String,
    pub domain: String,
    pub min_sendable_msat: u64,
    pub max_sendable_msat: u64,
    /// The raw metadata JSON string; its hash commits the invoice.
    pub metadata: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decoded_metadata: Option<Vec<(String, String)>>,
    /// LUD-12 max comment length.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_allowed_bytes: Option<u64>,
}

/// LUD-03 `withdrawRequest`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LnurlWithdraw {
    pub address: String,
    pub k1: String,
    pub callback: String,
    pub domain: String,
    pub min_withdrawable_msat: u64,
    pub max_withdrawable_msat: u64,
    pub default_description: String,
}

/// LUD-04 `login`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LnurlLogin {
    pub address: String,
    pub k1: String,
    pub callback: String,
    pub domain: String,
}
