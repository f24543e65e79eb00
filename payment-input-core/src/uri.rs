use std::borrow::Cow;

/// A raw, parsed URI. Param keys and values are percent-decoded. See
/// [URI syntax - RFC 3986](https://datatracker.ietf.org/doc/html/rfc3986).
///
/// ex: `https://example.com/pay?foo=bar%20baz`
/// -> Uri {
///     scheme: "https",
///     body: "//example.com/pay",
///     params: [("foo", "bar baz")],
/// }
#[derive(Debug)]
pub(crate) struct Uri<'a> {
    pub scheme: &'a str,
    pub body: &'a str,
    pub params: Vec<UriParam<'a>>,
}

impl<'a> Uri<'a> {
    // syntax: `<scheme>:<body>?<key1>=<value1>&<key2>=<value2>&...`
    pub fn parse(s: &'a str) -> Option<Self> {
        // ex: "bitcoin:bc1qfj..." -> `scheme = "bitcoin"`
        let (scheme, rest) = s.split_once(':')?;

        // heuristic: limit scheme to 12 characters. If an input exceeds this,
        // then it's probably not a URI.
        if scheme.is_empty() || scheme.len() > 12 {
            return None;
        }
        if !scheme.bytes().all(|b| {
            b.is_ascii_alphanumeric() || b == b'+' || b == b'-' || b == b'.'
        }) {
            return None;
        }

        // Drop any fragment; nothing we parse uses it.
        let rest = rest.split_once('#').map_or(rest, |(rest, _)| rest);

        // ex: "bitcoin:bc1qfj...?message=hello" -> `body = "bc1qfj..."`
        let (body, rest) = rest.split_once('?').unwrap_or((rest, ""));

        // ex: "bitcoin:bc1qfj...?message=hello%20world&amount=0.1"
        //     -> `params = [("message", "hello world"), ("amount", "0.1")]`
        let params = rest
            .split('&')
            .filter_map(UriParam::parse)
            .collect::<Vec<_>>();

        Some(Self {
            scheme,
            body,
            params,
        })
    }

    pub fn is_http(&self) -> bool {
        self.scheme.eq_ignore_ascii_case("http")
    }

    pub fn is_https(&self) -> bool {
        self.scheme.eq_ignore_ascii_case("https")
    }

    /// The host from the `//authority` section of the body, if any. Any
    /// userinfo and port are stripped.
    ///
    /// ex: "//user@example.com:8080/path" -> "example.com"
    pub fn host(&self) -> Option<&'a str> {
        let rest = self.body.strip_prefix("//")?;
        let authority = rest.split_once('/').map_or(rest, |(auth, _)| auth);
        let host_port = authority
            .rsplit_once('@')
            .map_or(authority, |(_userinfo, host_port)| host_port);

        let host = if host_port.starts_with('[') {
            // IPv6 literal
            let end = host_port.find(']')?;
            &host_port[..=end]
        } else {
            host_port
                .split_once(':')
                .map_or(host_port, |(host, _port)| host)
        };

        if host.is_empty() { None } else { Some(host) }
    }

    /// Whether this URI points at a Tor hidden service.
    pub fn ends_with_onion(&self) -> bool {
        self.host().is_some_and(|host| {
            let host = host.strip_suffix('.').unwrap_or(host);
            match host.len().checked_sub(".onion".len()) {
                Some(idx) => host
                    .get(idx..)
                    .is_some_and(|tld| tld.eq_ignore_ascii_case(".onion")),
                None => false,
            }
        })
    }

    /// Returns the first param whose key matches `name` (case-insensitive).
    pub fn param(&self, name: &str) -> Option<&UriParam<'a>> {
        self.params.iter().find(|param| param.key_is(name))
    }
}

/// The first non-empty `lightning=` query param of any URI, e.g. a web
/// payment page that embeds an invoice or LNURL.
///
/// ex: "https://site.com/pay?lightning=LNURL1..." -> "LNURL1..."
pub fn lightning_param(s: &str) -> Option<String> {
    let uri = Uri::parse(s)?;
    let param = uri.param("lightning")?;
    let value = param.value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_owned())
    }
}

/// A single `<key>=<value>` URI parameter.
#[derive(Debug)]
pub(crate) struct UriParam<'a> {
    pub key: Cow<'a, str>,
    pub value: Cow<'a, str>,
}

impl<'a> UriParam<'a> {
    pub fn parse(s: &'a str) -> Option<Self> {
        let (key, value) = s.split_once('=')?;
        let key = percent_encoding::percent_decode_str(key)
            .decode_utf8()
            .ok()?;
        let value = percent_encoding::percent_decode_str(value)
            .decode_utf8()
            .ok()?;
        Some(Self { key, value })
    }

    /// Keys are case-insensitive.
    pub fn key_is(&self, name: &str) -> bool {
        self.key.eq_ignore_ascii_case(name)
    }
}
