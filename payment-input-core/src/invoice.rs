use std::{borrow::Cow, str::FromStr};

use lightning_invoice::{Bolt11Invoice, TaggedField};
use tracing::debug;

use crate::{error::LightningError, resolved::InvoiceDetails};

/// The short channel id of a synthetic route hint whose source node is the
/// receiver's identity, rather than a hop in a real channel.
pub const EMBEDDED_IDENTITY_SCID: &str = "f42400f424000001";

/// A decoded BOLT11 invoice, flattened into the handful of fields we care
/// about. Tagged fields stay in their encoded order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DecodedInvoice {
    /// Set only if the invoice amount is a whole number of satoshis.
    pub satoshis: Option<u64>,
    pub millisatoshis: Option<u64>,
    pub tags: Vec<InvoiceTag>,
    /// Seconds since the UNIX epoch.
    pub timestamp: u64,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum InvoiceTag {
    /// Hex-encoded.
    PaymentHash(String),
    Description(String),
    /// Relative expiry, in seconds.
    ExpireTime(u64),
    RoutingInfo(Vec<RouteHop>),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RouteHop {
    /// Hex-encoded compressed public key of the hop's source node.
    pub pubkey: String,
    /// 16 hex digits.
    pub short_channel_id: String,
}

impl DecodedInvoice {
    /// Decode and validate (checksum, signature, semantics) a BOLT11 invoice.
    pub fn decode(s: &str) -> Result<Self, LightningError> {
        let invoice = parse_bolt11(s)?;

        let millisatoshis = invoice.amount_milli_satoshis();
        let satoshis = millisatoshis
            .filter(|msat| msat % 1000 == 0)
            .map(|msat| msat / 1000);

        let tags = invoice
            .tagged_fields()
            .filter_map(InvoiceTag::from_tagged_field)
            .collect();

        Ok(Self {
            satoshis,
            millisatoshis,
            tags,
            timestamp: invoice.duration_since_epoch().as_secs(),
        })
    }

    /// Derive the canonical, unit-normalized invoice fields.
    pub fn into_details(self, address: String) -> InvoiceDetails {
        // A whole-sat amount is authoritative. Otherwise msat is, and sats are
        // rounded half-up from it.
        let amounts = (self.satoshis, self.millisatoshis);
        let (amount_sat, amount_msat) = match amounts {
            (Some(sat), _) if sat != 0 => (sat, sat.saturating_mul(1000)),
            (_, Some(msat)) => (msat.saturating_add(500) / 1000, msat),
            _ => (0, 0),
        };

        let mut payment_hash = None;
        let mut description = None;
        let mut expiry_seconds = None;
        let mut embedded_identity_pubkey = None;

        for tag in self.tags {
            match tag {
                InvoiceTag::PaymentHash(hash) if payment_hash.is_none() =>
                    payment_hash = Some(hash),
                InvoiceTag::Description(desc) if description.is_none() =>
                    description = Some(desc),
                InvoiceTag::ExpireTime(secs) if expiry_seconds.is_none() =>
                    expiry_seconds = Some(secs),
                InvoiceTag::RoutingInfo(hops)
                    if embedded_identity_pubkey.is_none() =>
                    embedded_identity_pubkey = embedded_identity(&hops),
                // Later duplicates are ignored.
                _ => {}
            }
        }

        InvoiceDetails {
            address,
            amount_sat,
            amount_msat,
            expiry_seconds: expiry_seconds.unwrap_or(0),
            payment_hash: payment_hash.unwrap_or_default(),
            description: description.unwrap_or_default(),
            timestamp_unix: self.timestamp,
            embedded_identity_pubkey,
        }
    }
}

impl InvoiceTag {
    fn from_tagged_field(field: &TaggedField) -> Option<Self> {
        match field {
            TaggedField::PaymentHash(hash) =>
                Some(Self::PaymentHash(hash.0.to_string())),
            TaggedField::Description(desc) =>
                Some(Self::Description(desc.as_inner().0.clone())),
            TaggedField::ExpiryTime(expiry) =>
                Some(Self::ExpireTime(expiry.as_seconds())),
            TaggedField::PrivateRoute(route) => {
                let hops = (**route)
                    .0
                    .iter()
                    .map(|hop| RouteHop {
                        pubkey: hop.src_node_id.to_string(),
                        short_channel_id: format!(
                            "{:016x}",
                            hop.short_channel_id
                        ),
                    })
                    .collect();
                Some(Self::RoutingInfo(hops))
            }
            _ => None,
        }
    }
}

/// Only the first hop of a route hint can carry the embedded identity.
fn embedded_identity(hops: &[RouteHop]) -> Option<String> {
    let first = hops.first()?;
    if first.short_channel_id == EMBEDDED_IDENTITY_SCID
        && !first.pubkey.is_empty()
    {
        debug!(pubkey = %first.pubkey, "Found embedded identity route hint");
        Some(first.pubkey.clone())
    } else {
        None
    }
}

/// Decode `raw` into canonical invoice fields. The result's `address` is
/// `raw` exactly as given.
pub fn extract_invoice(raw: &str) -> Result<InvoiceDetails, LightningError> {
    let decoded = DecodedInvoice::decode(raw)?;
    Ok(decoded.into_details(raw.to_owned()))
}

/// Returns `true` if `s` starts with a BOLT11 hrp prefix for any network.
pub fn matches_invoice_hrp_prefix(s: &str) -> bool {
    const HRPS: [&[u8]; 5] = [
        b"lnbc",   // mainnet
        b"lntb",   // testnet
        b"lnsb",   // simnet
        b"lntbs",  // signet
        b"lnbcrt", // regtest
    ];
    let s = s.as_bytes();
    HRPS.iter().any(|hrp| match s.split_at_checked(hrp.len()) {
        Some((prefix, _)) => prefix.eq_ignore_ascii_case(hrp),
        None => false,
    })
}

fn parse_bolt11(s: &str) -> Result<Bolt11Invoice, LightningError> {
    // bech32 only requires consistent casing; QR codes are often uppercase.
    let s = if s.bytes().any(|b| b.is_ascii_lowercase()) {
        Cow::Borrowed(s)
    } else {
        Cow::Owned(s.to_ascii_lowercase())
    };
    Bolt11Invoice::from_str(&s)
        .map_err(|err| LightningError::InvalidInvoice(err.to_string()))
}
