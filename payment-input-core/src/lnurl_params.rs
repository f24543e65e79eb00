//! Resolve a retrieved LNURL parameter map into a [`ResolvedInput`] variant,
//! based on its `tag` discriminator.
//!
//! The JSON shape is only trusted once, here: each supported tag has a wire
//! struct, and a missing or mistyped field fails the whole resolution.

use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::LnurlError,
    resolved::{LnurlLogin, LnurlPay, LnurlWithdraw, ResolvedInput},
};

/// A raw LNURL parameter mapping, as returned by an LNURL endpoint or a
/// Lightning Address well-known endpoint.
pub type LnurlParams = serde_json::Map<String, Value>;

/// LUD-06 `payRequest`, plus the `domain` and `decodedMetadata` fields we
/// derive after fetching.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PayRequestWire {
    callback: String,
    domain: String,
    #[serde(rename = "minSendable", with = "lenient_u64")]
    min_sendable_msat: u64,
    #[serde(rename = "maxSendable", with = "lenient_u64")]
    max_sendable_msat: u64,
    metadata: String,
    #[serde(default)]
    decoded_metadata: Option<Vec<(String, String)>>,
    /// LUD-12
    #[serde(default, deserialize_with = "lenient_u64::deserialize_opt")]
    comment_allowed: Option<u64>,
}

/// LUD-03 `withdrawRequest`
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WithdrawRequestWire {
    k1: String,
    callback: String,
    domain: String,
    #[serde(rename = "minWithdrawable", with = "lenient_u64")]
    min_withdrawable_msat: u64,
    #[serde(rename = "maxWithdrawable", with = "lenient_u64")]
    max_withdrawable_msat: u64,
    #[serde(default)]
    default_description: String,
}

/// LUD-04 `login`
#[derive(Deserialize)]
struct LoginWire {
    k1: String,
    callback: String,
    domain: String,
}

/// Deserialize a non-negative integer that some services encode as a JSON
/// float, e.g. `"minSendable": 1000.0`. Fractional values are rejected.
mod lenient_u64 {
    use std::fmt;

    use serde::{Deserializer, de};

    struct U64Visitor;

    impl de::Visitor<'_> for U64Visitor {
        type Value = u64;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a non-negative integer")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<u64, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<u64, E> {
            u64::try_from(v).map_err(|_| {
                E::invalid_value(de::Unexpected::Signed(v), &self)
            })
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<u64, E> {
            // Also false for NaN and infinities.
            let in_range = v >= 0.0 && v < 2f64.powi(64);
            if in_range && v.fract() == 0.0 {
                Ok(v as u64)
            } else {
                Err(E::invalid_value(de::Unexpected::Float(v), &self))
            }
        }
    }

    struct OptU64Visitor;

    impl<'de> de::Visitor<'de> for OptU64Visitor {
        type Value = Option<u64>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a non-negative integer or null")
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(
            self,
            deserializer: D,
        ) -> Result<Self::Value, D::Error> {
            deserialize(deserializer).map(Some)
        }
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(U64Visitor)
    }

    pub(super) fn deserialize_opt<'de, D>(
        deserializer: D,
    ) -> Result<Option<u64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_option(OptU64Visitor)
    }
}

/// Switch on the `tag` of `params` and build the matching variant. `address`
/// is the user-facing token the params were retrieved for.
///
/// Unknown tags are rejected, never guessed at.
pub fn resolve_params(
    address: String,
    params: LnurlParams,
) -> Result<ResolvedInput, LnurlError> {
    let tag = match params.get("tag") {
        Some(Value::String(tag)) => tag.clone(),
        _ => return Err(LnurlError::MissingTag),
    };

    let params = Value::Object(params);
    let malformed = |err: serde_json::Error| {
        LnurlError::MalformedResponse(format!("{tag}: {err}"))
    };

    match tag.as_str() {
        "payRequest" => {
            let wire = serde_json::from_value::<PayRequestWire>(params)
                .map_err(malformed)?;
            Ok(ResolvedInput::LnurlPay(LnurlPay {
                address,
                callback: wire.callback,
                domain: wire.domain,
                min_sendable_msat: wire.min_sendable_msat,
                max_sendable_msat: wire.max_sendable_msat,
                metadata: wire.metadata,
                decoded_metadata: wire.decoded_metadata,
                comment_allowed_bytes: wire.comment_allowed,
            }))
        }
        "withdrawRequest" => {
            let wire = serde_json::from_value::<WithdrawRequestWire>(params)
                .map_err(malformed)?;
            Ok(ResolvedInput::LnurlWithdraw(LnurlWithdraw {
                address,
                k1: wire.k1,
                callback: wire.callback,
                domain: wire.domain,
                min_withdrawable_msat: wire.min_withdrawable_msat,
                max_withdrawable_msat: wire.max_withdrawable_msat,
                default_description: wire.default_description,
            }))
        }
        "login" => {
            let wire =
                serde_json::from_value::<LoginWire>(params).map_err(malformed)?;
            Ok(ResolvedInput::LnurlLogin(LnurlLogin {
                address,
                k1: wire.k1,
                callback: wire.callback,
                domain: wire.domain,
            }))
        }
        _ => Err(LnurlError::UnknownTag(tag.clone())),
    }
}

/// Fill in the fields we derive rather than fetch, when the service didn't
/// send them: `domain` (the host we fetched from) and, for `payRequest`,
/// `decodedMetadata`.
pub fn fill_derived_params(params: &mut LnurlParams, domain: &str) {
    if !params.contains_key("domain") {
        params.insert("domain".to_owned(), Value::from(domain));
    }

    let is_pay_request = matches!(
        params.get("tag"),
        Some(Value::String(tag)) if tag == "payRequest"
    );
    if is_pay_request && !params.contains_key("decodedMetadata") {
        let decoded = match params.get("metadata") {
            Some(Value::String(raw)) => decode_pay_metadata(raw),
            _ => None,
        };
        if let Some(decoded) = decoded {
            let pairs = decoded
                .into_iter()
                .map(|(ty, value)| Value::from(vec![ty, value]))
                .collect::<Vec<_>>();
            params.insert("decodedMetadata".to_owned(), Value::from(pairs));
        }
    }
}

/// Decode a LUD-06 `metadata` string into `(type, value)` pairs.
///
/// LUD-06: "The `metadata` json array is only allowed to contain arrays. The
/// first item of an array inside the `metadata` array is always a string
/// representing the metadata type while any item that follows can be of any
/// JSON type. Implementors MUST NOT assume it will always be a string."
///
/// Entries with non-string values are skipped.
pub fn decode_pay_metadata(raw: &str) -> Option<Vec<(String, String)>> {
    let entries = serde_json::from_str::<Vec<Vec<Value>>>(raw).ok()?;
    let pairs = entries
        .into_iter()
        .filter_map(|entry| {
            let mut items = entry.into_iter();
            match (items.next(), items.next()) {
                (Some(Value::String(ty)), Some(Value::String(value))) =>
                    Some((ty, value)),
                _ => None,
            }
        })
        .collect();
    Some(pairs)
}
