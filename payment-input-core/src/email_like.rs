/// An email-like Lightning Address (LUD-16), e.g. `satoshi@example.com`.
///
/// Matches `local "@" domain "." tld`, where:
/// + `local` is one or more of `a-zA-Z0-9._%+-`
/// + `domain` is one or more of `a-zA-Z0-9.-`
/// + `tld` is two or more ASCII letters
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct LightningAddress<'a> {
    pub local: &'a str,
    pub domain: &'a str,
}

impl<'a> LightningAddress<'a> {
    pub fn parse(s: &'a str) -> Option<Self> {
        let (local, domain) = s.split_once('@')?;

        if local.is_empty() || !local.bytes().all(is_local_byte) {
            return None;
        }

        let (labels, tld) = domain.rsplit_once('.')?;
        if labels.is_empty() || !labels.bytes().all(is_domain_byte) {
            return None;
        }
        if tld.len() < 2 || !tld.bytes().all(|b| b.is_ascii_alphabetic()) {
            return None;
        }

        Some(Self { local, domain })
    }

    pub fn matches(s: &str) -> bool {
        LightningAddress::parse(s).is_some()
    }

    /// The LUD-16 discovery endpoint for this address.
    ///
    /// ex: `satoshi@example.com`
    ///  -> `https://example.com/.well-known/lnurlp/satoshi`
    pub fn well_known_url(&self) -> String {
        let Self { local, domain } = self;
        format!("https://{domain}/.well-known/lnurlp/{local}")
    }
}

fn is_local_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'%' | b'+' | b'-')
}

fn is_domain_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-')
}

#[cfg(test)]
mod test {
    use proptest::{prop_assert, proptest};

    use super::*;

    #[test]
    fn test_parse_lightning_address() {
        let addr =
            LightningAddress::parse("alice+tips@pay.example.com").unwrap();
        assert_eq!(addr.local, "alice+tips");
        assert_eq!(addr.domain, "pay.example.com");
        assert_eq!(
            addr.well_known_url(),
            "https://pay.example.com/.well-known/lnurlp/alice+tips",
        );

        let invalid = [
            "",
            "@example.com",
            "alice@",
            "alice@example",
            "alice@.com",
            "alice@example.c",
            "alice@example.c0m",
            "al ice@example.com",
            "alice@exa_mple.com",
            "alice@example.com/path",
            "https://alice@example.com",
        ];
        for s in invalid {
            assert!(LightningAddress::parse(s).is_none(), "{s}");
        }
    }

    #[test]
    fn test_well_known_url_stays_on_domain() {
        proptest!(|(
            local in "[a-zA-Z0-9._%+-]{1,16}",
            domain in "[a-z0-9-]{1,12}\\.[a-z]{2,6}",
        )| {
            let s = format!("{local}@{domain}");
            let addr = LightningAddress::parse(&s).unwrap();
            let expected = format!("https://{domain}/.well-known/lnurlp/");
            prop_assert!(addr.well_known_url().starts_with(&expected));
        });
    }
}
