//! HTTP retrieval of LNURL parameters (LUD-01, LUD-06, LUD-03) and Lightning
//! Address well-known documents (LUD-16).
//!
//! A successful GET returns the parameter map for the LNURL's flow:
//! ```json
//! {
//!   "tag": "payRequest",
//!   "callback": "https://service.com/api/lnurl/abc123/callback",
//!   "minSendable": 1000,
//!   "maxSendable": 1000000000,
//!   "metadata": "[[\"text/plain\",\"Payment for coffee\"]]"
//! }
//! ```
//!
//! Services report failures in-band (LUD-01), with any HTTP status:
//! ```json
//! { "status": "ERROR", "reason": "error details..." }
//! ```

use anyhow::Context;
use payment_input_core::{LnurlError, LnurlParams};
use serde_json::Value;
use tracing::debug;

use crate::{config::ResolverConfig, fetch::LnurlFetcher};

/// A client for LNURL and Lightning Address requests.
#[derive(Clone)]
pub struct LnurlClient(reqwest::Client);

/// Why a single LNURL GET failed.
#[derive(Debug, thiserror::Error)]
enum FetchError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),
    #[error("Service returned an error: {reason}")]
    Service { reason: String },
    #[error("Response is not a JSON object")]
    NotJsonObject,
}

impl From<FetchError> for LnurlError {
    fn from(err: FetchError) -> Self {
        LnurlError::Network(err.to_string())
    }
}

impl LnurlClient {
    pub fn new(config: &ResolverConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .https_only(config.https_only)
            .timeout(config.http_timeout())
            .build()
            .context("Failed to build LNURL reqwest client")?;

        Ok(Self(client))
    }

    /// GET `url` and parse the body as a JSON object, surfacing LUD-01
    /// `{"status": "ERROR"}` responses as errors.
    async fn get_params(&self, url: &str) -> Result<LnurlParams, FetchError> {
        debug!(%url, "Fetching LNURL params");

        let response = self.0.get(url).send().await?;
        let status = response.status();
        let body = response.json::<Value>().await;

        // Error responses can come with any status code, so check the body
        // before the status.
        let params = match body {
            Ok(Value::Object(params)) => params,
            Ok(_) => return Err(FetchError::NotJsonObject),
            Err(err) if status.is_success() => return Err(err.into()),
            Err(_) => {
                return Err(FetchError::Service {
                    reason: format!("HTTP {status}"),
                });
            }
        };

        if let Some(Value::String(status)) = params.get("status")
            && status.eq_ignore_ascii_case("ERROR")
        {
            let reason = params
                .get("reason")
                .and_then(Value::as_str)
                .unwrap_or("(no reason given)")
                .to_owned();
            return Err(FetchError::Service { reason });
        }

        if !status.is_success() {
            return Err(FetchError::Service {
                reason: format!("HTTP {status}"),
            });
        }

        Ok(params)
    }
}

impl LnurlFetcher for LnurlClient {
    async fn get_json(&self, url: &str) -> Result<LnurlParams, LnurlError> {
        Ok(self.get_params(url).await?)
    }
}
