use payment_input_core::{LnurlError, LnurlParams};

/// Retrieves LNURL parameter maps. This is the only place the resolver
/// touches the network.
///
/// [`LnurlClient`](crate::LnurlClient) is the production impl; tests plug
/// in canned responses.
pub trait LnurlFetcher: Send + Sync {
    /// GET `url` and return its body, which must be a JSON object. LUD-01
    /// `{"status": "ERROR"}` bodies are errors.
    fn get_json(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<LnurlParams, LnurlError>> + Send;
}
