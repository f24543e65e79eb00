use std::borrow::Cow;

/// The broad category of a resolution failure.
///
/// Callers use this to decide whether to re-prompt the user
/// ([`ErrorKind::Classification`]) or show a specific error for an input that
/// was recognized but turned out to be broken (everything else).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// The input doesn't look like any supported payment format.
    Classification,
    /// A recognized format (URI, invoice, LNURL) failed to decode.
    Decode,
    /// An LNURL or Lightning Address fetch failed or returned junk.
    Network,
    /// An LNURL response with a missing or unsupported `tag`.
    UnknownVariant,
    /// A `bitcoin:` URI whose base isn't a valid on-chain address.
    InvalidBaseAddress,
}

/// The single failure outcome of resolving a payment input.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ResolveError {
    #[error("Payment input is too long to parse (>{max_len} bytes)")]
    TooLong { max_len: usize },
    #[error("Unrecognized payment input")]
    UnrecognizedFormat,
    #[error("URL doesn't contain a usable Lightning payment: {0}")]
    UnrecognizedUrl(LightningError),
    #[error("Malformed payment URI: {0}")]
    InvalidUriSyntax(Cow<'static, str>),
    #[error("Invalid on-chain address in bitcoin URI: '{0}'")]
    InvalidBaseAddress(String),
    #[error("lightning URI has an empty payload")]
    EmptyLightningPayload,
    #[error("Invalid embedded Lightning payment: {0}")]
    EmbeddedPayloadInvalid(LightningError),
    #[error(transparent)]
    UnresolvableLightningPayload(LightningError),
}

impl ResolveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TooLong { .. }
            | Self::UnrecognizedFormat
            | Self::UnrecognizedUrl(_)
            | Self::EmptyLightningPayload => ErrorKind::Classification,
            Self::InvalidUriSyntax(_) => ErrorKind::Decode,
            Self::InvalidBaseAddress(_) => ErrorKind::InvalidBaseAddress,
            Self::EmbeddedPayloadInvalid(err)
            | Self::UnresolvableLightningPayload(err) => err.kind(),
        }
    }

    /// Returns `true` if the input wasn't recognized as any payment format,
    /// as opposed to a recognized but malformed one.
    pub fn is_unrecognized(&self) -> bool {
        self.kind() == ErrorKind::Classification
    }
}

/// Failure to resolve a Lightning payload (BOLT11 invoice or LNURL).
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum LightningError {
    #[error("Invalid Lightning invoice: {0}")]
    InvalidInvoice(String),
    #[error(transparent)]
    Lnurl(#[from] LnurlError),
}

impl LightningError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInvoice(_) => ErrorKind::Decode,
            Self::Lnurl(err) => err.kind(),
        }
    }
}

/// Failure to resolve an LNURL or Lightning Address into a payment variant.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum LnurlError {
    #[error("Invalid LNURL: {0}")]
    Decode(Cow<'static, str>),
    #[error("LNURL request failed: {0}")]
    Network(String),
    #[error("Malformed LNURL response: {0}")]
    MalformedResponse(String),
    #[error("LNURL response is missing a string `tag` field")]
    MissingTag,
    #[error("Unsupported LNURL tag: '{0}'")]
    UnknownTag(String),
}

impl LnurlError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Decode(_) => ErrorKind::Decode,
            Self::Network(_) | Self::MalformedResponse(_) => ErrorKind::Network,
            Self::MissingTag | Self::UnknownTag(_) => ErrorKind::UnknownVariant,
        }
    }
}
