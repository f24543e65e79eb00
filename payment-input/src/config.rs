use std::time::Duration;

use bitcoin::Network;
use serde::Deserialize;

use payment_input_core::MAX_INPUT_LEN_KIB;

/// Knobs for a [`PaymentInputResolver`](crate::PaymentInputResolver).
///
/// Deserializable so it can live in an app's config file; every field has a
/// default, so `{}` is a valid config.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Only accept on-chain addresses for this network. `None` accepts
    /// addresses for any network.
    pub network: Option<Network>,
    /// Timeout for each LNURL / Lightning Address request, in seconds.
    pub http_timeout_secs: u64,
    /// Refuse to talk to cleartext `http://` endpoints.
    pub https_only: bool,
    /// Inputs longer than this (after trimming) are rejected unparsed.
    pub max_input_len: usize,
}

impl ResolverConfig {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            network: None,
            http_timeout_secs: 10,
            https_only: true,
            max_input_len: MAX_INPUT_LEN_KIB * 1024,
        }
    }
}
