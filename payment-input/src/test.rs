//! End-to-end resolution tests, with LNURL requests answered by a fake.

use std::{collections::HashMap, sync::Mutex};

use payment_input_core::test_utils::{
    InvoiceParams, TEST_TIMESTAMP, gen_invoice, identity_pubkey_hex,
};
use proptest::proptest;
use serde_json::{Value, json};

use super::*;

/// The LUD-01 example LNURL.
const LUD01_BECH32: &str = "lnurl1dp68gurn8ghj7um9wfmxjcm99e3k7mf0v9cxj0m385e\
    kvcenxc6r2c35xvukxefcv5mkvv34x5ekzd3ev56nyd3hxqurzepexejxxepnxscrvwfnv9nx\
    zcn9xq6xyefhvgcxxcmyxymnserxfq5fns";

const METADATA: &str = concat!(
    r#"[["text/plain","Pay to alice"],"#,
    r#"["text/identifier","alice@example.com"]]"#,
);

const K1: &str =
    "e2af6254a8df433264fa23f67eb8188635d15ce883e8fc020989d5f82ae6f11e";

const ADDR: &str = "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4";

/// An [`LnurlFetcher`] serving canned JSON by URL, recording every request.
#[derive(Default)]
struct FakeFetcher {
    responses: HashMap<String, Value>,
    requests: Mutex<Vec<String>>,
}

impl FakeFetcher {
    fn with(mut self, url: &str, body: Value) -> Self {
        self.responses.insert(url.to_owned(), body);
        self
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

}

impl LnurlFetcher for FakeFetcher {
    async fn get_json(&self, url: &str) -> Result<LnurlParams, LnurlError> {
        self.requests.lock().unwrap().push(url.to_owned());
        match self.responses.get(url) {
            Some(Value::Object(params)) => Ok(params.clone()),
            Some(_) => Err(LnurlError::Network("not a JSON object".to_owned())),
            None => Err(LnurlError::Network(format!("404 Not Found: {url}"))),
        }
    }
}

fn resolver(fetcher: FakeFetcher) -> PaymentInputResolver<FakeFetcher> {
    logger::init_for_testing();
    PaymentInputResolver::with_fetcher(fetcher, ResolverConfig::default())
}

fn http_url_of(lnurl: &str) -> String {
    Lnurl::parse(lnurl).unwrap().http_url
}

fn bech32_of(http_url: &str) -> String {
    Lnurl::parse(http_url).unwrap().to_bech32().unwrap()
}

fn pay_request(callback: &str, domain: &str) -> Value {
    json!({
        "tag": "payRequest",
        "callback": callback,
        "domain": domain,
        "minSendable": 1000,
        "maxSendable": 1_000_000_000_000_u64,
        "metadata": METADATA,
        "commentAllowed": 512,
    })
}

fn decoded_metadata() -> Option<Vec<(String, String)>> {
    decode_pay_metadata(METADATA)
}

#[tokio::test]
async fn onchain_addresses_resolve_unchanged() {
    let resolver = resolver(FakeFetcher::default());
    for addr in [
        "17VZNX1SN5NtKa8UQFxwQbFeFc3iqRYhem",
        "3J98t1WpEZ73CNmQviecrnyiWrnqRhWNLy",
        ADDR,
        "BC1QW508D6QEJXTDG4Y5R3ZARVARY0C5XW7KV8F3T4",
        "bc1ptxs597p3fnpd8gwut5p467ulsydae3rp9z75hd99w8k3ljr9g9rqx6ynaw",
        "tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kxpjzsx",
    ] {
        let resolved = resolver.resolve(addr).await.unwrap();
        assert_eq!(
            resolved,
            ResolvedInput::BitcoinAddress(BitcoinAddress::from_address(
                addr.to_owned()
            )),
        );
        // whitespace is trimmed
        let padded = format!("  {addr}\n");
        assert_eq!(resolver.resolve(&padded).await.unwrap(), resolved);
    }
    assert!(resolver.fetcher().requests().is_empty());
}

#[tokio::test]
async fn invalid_addresses_fail() {
    let resolver = resolver(FakeFetcher::default());

    for s in [
        "17VZNX1SN5NtKa8UFFxwQbFeFc3iqRYhem",
        "bc1qw508d6qejxtdg4y5r3zrrvary0c5xw7kv8f3t4",
        "x",
        "???",
        "",
        "   ",
    ] {
        let err = resolver.resolve(s).await.unwrap_err();
        assert_eq!(err, ResolveError::UnrecognizedFormat, "{s:?}");
        assert!(err.is_unrecognized());
    }

    let err = resolver
        .resolve("bitcoin:17VZNX1SN5NtKa8UFFxwQbFeFc3iqRYhem")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidBaseAddress);
}

#[tokio::test]
async fn network_restricted_addresses() {
    logger::init_for_testing();
    let config = ResolverConfig {
        network: Some(bitcoin::Network::Bitcoin),
        ..ResolverConfig::default()
    };
    let resolver =
        PaymentInputResolver::with_fetcher(FakeFetcher::default(), config);

    assert!(resolver.resolve(ADDR).await.is_ok());
    let testnet = "tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kxpjzsx";
    assert_eq!(
        resolver.resolve(testnet).await.unwrap_err(),
        ResolveError::UnrecognizedFormat,
    );
    let err = resolver
        .resolve(&format!("bitcoin:{testnet}"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidBaseAddress);
}

#[tokio::test]
async fn bip21_amount_and_label() {
    let resolver = resolver(FakeFetcher::default());
    for scheme in ["bitcoin", "BITCOIN"] {
        let uri = format!("{scheme}:{ADDR}?amount=0.00002000&label=Hello");
        let resolved = resolver.resolve(&uri).await.unwrap();
        assert_eq!(
            resolved,
            ResolvedInput::BitcoinAddress(BitcoinAddress {
                address: ADDR.to_owned(),
                amount: Some("0.00002000".to_owned()),
                label: Some("Hello".to_owned()),
                message: None,
                options: Vec::new(),
            }),
        );
    }

    let err = resolver
        .resolve(&format!("bitcoin:{ADDR}?amount=lots"))
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::InvalidUriSyntax(_)), "{err:?}");
    assert_eq!(err.kind(), ErrorKind::Decode);
}

#[tokio::test]
async fn unified_qr_ignores_onchain_amount() {
    let url = http_url_of(LUD01_BECH32);
    let fetcher = FakeFetcher::default()
        .with(&url, pay_request("https://service.com/cb", "service.com"));
    let resolver = resolver(fetcher);

    let input = format!("bitcoin:{ADDR}?amount=0.001&lightning={LUD01_BECH32}");
    let resolved = resolver.resolve(&input).await.unwrap();
    assert_eq!(resolved.type_tag(), "payRequest");
    assert_eq!(resolved.address(), LUD01_BECH32);

    // An empty amount doesn't make the URI malformed.
    let invoice = gen_invoice(InvoiceParams::default());
    let input = format!("bitcoin:{ADDR}?amount=&lightning={invoice}");
    let resolved = resolver.resolve(&input).await.unwrap();
    assert_eq!(resolved.type_tag(), "bolt11Address");

    // `_` digit separators aren't valid amounts.
    let input = format!("bitcoin:{ADDR}?amount=1_000&lightning={invoice}");
    let err = resolver.resolve(&input).await.unwrap_err();
    assert!(matches!(err, ResolveError::InvalidUriSyntax(_)), "{err:?}");
}

#[tokio::test]
async fn bolt11_invoice_all_spellings() {
    let resolver = resolver(FakeFetcher::default());
    let invoice = gen_invoice(InvoiceParams {
        amount_msat: Some(11_000),
        ..InvoiceParams::default()
    });
    let upper = invoice.to_ascii_uppercase();

    let inputs = [
        invoice.clone(),
        format!("lightning:{invoice}"),
        format!("LIGHTNING:{upper}"),
        format!("lightning://{invoice}"),
        format!("bitcoin:{ADDR}?lightning={invoice}"),
    ];
    for input in inputs {
        let resolved = resolver.resolve(&input).await.unwrap();
        let details = match resolved {
            ResolvedInput::Bolt11Invoice(details) => details,
            other => panic!("{input}: expected invoice, got {other:?}"),
        };
        assert_eq!(details.amount_sat, 11, "{input}");
        assert_eq!(details.amount_msat, 11_000);
        assert_eq!(details.description, "coffee");
        assert_eq!(details.payment_hash, "01".repeat(32));
        assert_eq!(details.timestamp_unix, TEST_TIMESTAMP);
        assert_eq!(details.expiry_seconds, 0);
        assert_eq!(details.embedded_identity_pubkey, None);
        assert!(details.address.eq_ignore_ascii_case(&invoice));
    }

    // The uppercase spelling keeps its casing in `address`.
    let resolved =
        resolver.resolve(&format!("LIGHTNING:{upper}")).await.unwrap();
    assert_eq!(resolved.address(), upper);

    assert!(resolver.fetcher().requests().is_empty());
}

#[tokio::test]
async fn invoice_with_identity_hint() {
    let resolver = resolver(FakeFetcher::default());
    let invoice = gen_invoice(InvoiceParams {
        amount_msat: Some(1_500),
        expiry: Some(std::time::Duration::from_secs(600)),
        identity_route_hint: true,
        ..InvoiceParams::default()
    });

    match resolver.resolve(&invoice).await.unwrap() {
        ResolvedInput::Bolt11Invoice(details) => {
            assert_eq!(details.amount_sat, 2);
            assert_eq!(details.amount_msat, 1_500);
            assert_eq!(details.expiry_seconds, 600);
            assert_eq!(
                details.embedded_identity_pubkey,
                Some(identity_pubkey_hex())
            );
        }
        other => panic!("Expected invoice, got {other:?}"),
    }
}

#[tokio::test]
async fn broken_invoices() {
    let resolver = resolver(FakeFetcher::default());
    let invoice = gen_invoice(InvoiceParams::default());

    // Flip the last checksum character.
    let mut broken = invoice.clone();
    let last = broken.pop().unwrap();
    broken.push(if last == 'q' { 'p' } else { 'q' });

    let err = resolver
        .resolve(&format!("bitcoin:{ADDR}?lightning={broken}"))
        .await
        .unwrap_err();
    assert!(
        matches!(
            err,
            ResolveError::EmbeddedPayloadInvalid(
                LightningError::InvalidInvoice(_)
            )
        ),
        "{err:?}"
    );
    assert_eq!(err.kind(), ErrorKind::Decode);
    assert!(!err.is_unrecognized());

    let err = resolver.resolve(&broken).await.unwrap_err();
    assert!(
        matches!(
            err,
            ResolveError::UnresolvableLightningPayload(
                LightningError::InvalidInvoice(_)
            )
        ),
        "{err:?}"
    );

    // Nothing looked like an LNURL, so nothing was fetched.
    assert!(resolver.fetcher().requests().is_empty());
}

#[tokio::test]
async fn lnurl_pay_request() {
    let url = http_url_of(LUD01_BECH32);
    let fetcher = FakeFetcher::default()
        .with(&url, pay_request("https://service.com/cb", "service.com"));
    let resolver = resolver(fetcher);

    let expected = |address: &str| {
        ResolvedInput::LnurlPay(LnurlPay {
            address: address.to_owned(),
            callback: "https://service.com/cb".to_owned(),
            domain: "service.com".to_owned(),
            min_sendable_msat: 1000,
            max_sendable_msat: 1_000_000_000_000,
            metadata: METADATA.to_owned(),
            decoded_metadata: decoded_metadata(),
            comment_allowed_bytes: Some(512),
        })
    };

    let resolved = resolver.resolve(LUD01_BECH32).await.unwrap();
    assert_eq!(resolved, expected(LUD01_BECH32));
    assert_eq!(resolver.fetcher().requests(), vec![url.clone()]);

    let upper = LUD01_BECH32.to_ascii_uppercase();
    for input in [
        format!("lightning:{upper}"),
        format!("bitcoin:{ADDR}?lightning={upper}"),
    ] {
        let resolved = resolver.resolve(&input).await.unwrap();
        assert_eq!(resolved, expected(&upper), "{input}");
    }
    assert_eq!(resolver.fetcher().requests().len(), 3);
}

#[tokio::test]
async fn lnurl_withdraw_request() {
    let fetcher = FakeFetcher::default().with(
        "https://faucet.io/withdraw/abc",
        json!({
            "tag": "withdrawRequest",
            "k1": "beef",
            "callback": "https://faucet.io/withdraw/abc/cb",
            "minWithdrawable": 1000,
            "maxWithdrawable": 21000,
            "defaultDescription": "faucet",
        }),
    );
    let resolver = resolver(fetcher);

    let token = "lnurlw://faucet.io/withdraw/abc";
    let resolved = resolver.resolve(token).await.unwrap();
    assert_eq!(
        resolved,
        ResolvedInput::LnurlWithdraw(LnurlWithdraw {
            address: token.to_owned(),
            k1: "beef".to_owned(),
            callback: "https://faucet.io/withdraw/abc/cb".to_owned(),
            // derived from the URL
            domain: "faucet.io".to_owned(),
            min_withdrawable_msat: 1000,
            max_withdrawable_msat: 21000,
            default_description: "faucet".to_owned(),
        }),
    );
}

#[tokio::test]
async fn lightning_address() {
    let well_known = "https://example.com/.well-known/lnurlp/alice";
    let mut body = pay_request("https://example.com/cb/alice", "unused");
    body.as_object_mut().unwrap().remove("domain");
    let resolver = resolver(FakeFetcher::default().with(well_known, body));

    let resolved = resolver.resolve("alice@example.com").await.unwrap();
    match &resolved {
        ResolvedInput::LnurlPay(pay) => {
            assert_eq!(pay.address, "alice@example.com");
            assert_eq!(pay.domain, "example.com");
            assert_eq!(pay.callback, "https://example.com/cb/alice");
            assert_eq!(pay.decoded_metadata, decoded_metadata());
        }
        other => panic!("Expected payRequest, got {other:?}"),
    }
    assert_eq!(resolver.fetcher().requests(), vec![well_known.to_owned()]);

    // Also reachable through a lightning: URI.
    let again = resolver.resolve("lightning:alice@example.com").await.unwrap();
    assert_eq!(again, resolved);

    // Unknown user
    let err = resolver.resolve("bob@example.com").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
}

#[tokio::test]
async fn generic_url_with_login_lnurl() {
    let auth_url = format!("https://auth.site.com/login?tag=login&k1={K1}");
    let lnurl = bech32_of(&auth_url);
    let resolver = resolver(FakeFetcher::default());

    let input = format!("https://site.com/signin?lightning={lnurl}");
    let resolved = resolver.resolve(&input).await.unwrap();
    assert_eq!(
        resolved,
        ResolvedInput::LnurlLogin(LnurlLogin {
            address: lnurl.clone(),
            k1: K1.to_owned(),
            callback: auth_url.clone(),
            domain: "auth.site.com".to_owned(),
        }),
    );

    // A percent-encoded LUD-17 keyauth:// URI in the param.
    let input = format!(
        "https://site.com/signin?lightning=keyauth%3A%2F%2Fauth.site.com\
         %2Flogin%3Fk1%3D{K1}"
    );
    match resolver.resolve(&input).await.unwrap() {
        ResolvedInput::LnurlLogin(login) => {
            assert_eq!(login.k1, K1);
            assert_eq!(login.domain, "auth.site.com");
        }
        other => panic!("Expected login, got {other:?}"),
    }

    // Login is answered from the URL alone.
    assert!(resolver.fetcher().requests().is_empty());
}

#[tokio::test]
async fn generic_url_as_lnurl_endpoint() {
    let endpoint = "https://pay.shop.com/lnurlp/coffee";
    let fetcher = FakeFetcher::default()
        .with(endpoint, pay_request("https://pay.shop.com/cb", "pay.shop.com"));
    let resolver = resolver(fetcher);

    let resolved = resolver.resolve(endpoint).await.unwrap();
    assert_eq!(resolved.type_tag(), "payRequest");
    assert_eq!(resolved.address(), endpoint);

    // A page that isn't an LNURL endpoint.
    let err = resolver.resolve("https://news.site.com/").await.unwrap_err();
    assert!(matches!(err, ResolveError::UnrecognizedUrl(_)), "{err:?}");
    assert!(err.is_unrecognized());

    // An explicit but broken `lightning=` payload is a specific error.
    let err = resolver
        .resolve("https://site.com/?lightning=lnbc1garbage")
        .await
        .unwrap_err();
    assert!(
        matches!(
            err,
            ResolveError::EmbeddedPayloadInvalid(
                LightningError::InvalidInvoice(_)
            )
        ),
        "{err:?}"
    );
    assert_eq!(err.kind(), ErrorKind::Decode);
    assert!(!err.is_unrecognized());

    let err = resolver
        .resolve("https://site.com/?lightning=carol@nowhere.com")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
}

#[tokio::test]
async fn lnurl_fetch_fills_domain_from_url() {
    // The service omits `domain`; it's taken from the LNURL's host.
    let url = "https://pay.shop.com/lnurlp/tea";
    let mut body = pay_request("https://pay.shop.com/cb", "unused");
    body.as_object_mut().unwrap().remove("domain");
    let resolver = resolver(FakeFetcher::default().with(url, body));

    match resolver.resolve("lnurlp://pay.shop.com/lnurlp/tea").await.unwrap() {
        ResolvedInput::LnurlPay(pay) => {
            assert_eq!(pay.domain, "pay.shop.com");
            assert_eq!(pay.decoded_metadata, decoded_metadata());
        }
        other => panic!("Expected payRequest, got {other:?}"),
    }
    assert_eq!(resolver.fetcher().requests(), vec![url.to_owned()]);
}

#[tokio::test]
async fn https_client_login_needs_no_request() {
    logger::init_for_testing();
    let resolver = PaymentInputResolver::new(ResolverConfig::default())
        .unwrap();

    // A bare LUD-04 URL, and the same URL as a bech32 LNURL.
    let auth_url = format!("https://auth.site.com/login?tag=login&k1={K1}");
    let lightning_uri = format!("lightning:{}", bech32_of(&auth_url));
    for token in [auth_url.clone(), lightning_uri] {
        match resolver.resolve(&token).await.unwrap() {
            ResolvedInput::LnurlLogin(login) => {
                assert_eq!(login.k1, K1);
                assert_eq!(login.callback, auth_url);
                assert_eq!(login.domain, "auth.site.com");
            }
            other => panic!("{token}: expected login, got {other:?}"),
        }
    }

    let err = resolver.resolve("lnurl1junk").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
}

#[tokio::test]
async fn unknown_lnurl_tag() {
    let url = "https://service.com/future";
    let fetcher = FakeFetcher::default()
        .with(url, json!({ "tag": "unknownFutureType", "k1": "abc" }));
    let resolver = resolver(fetcher);

    let err = resolver.resolve(&bech32_of(url)).await.unwrap_err();
    assert_eq!(
        err,
        ResolveError::UnresolvableLightningPayload(LightningError::Lnurl(
            LnurlError::UnknownTag("unknownFutureType".to_owned())
        )),
    );
    assert_eq!(err.kind(), ErrorKind::UnknownVariant);
}

#[tokio::test]
async fn malformed_lightning_uris() {
    let resolver = resolver(FakeFetcher::default());

    for input in ["lightning:", "lightning:   ", "LIGHTNING://"] {
        let err = resolver.resolve(input).await.unwrap_err();
        assert_eq!(err, ResolveError::EmptyLightningPayload, "{input}");
    }

    let err = resolver.resolve("lightning:hello").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);

    // lnurl:// is rejected without a request.
    let err = resolver.resolve("lnurl://example.com/pay").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
    assert!(resolver.fetcher().requests().is_empty());
}

#[tokio::test]
async fn too_long() {
    let resolver = resolver(FakeFetcher::default());
    let input = format!("lightning:{}", "q".repeat(8192));
    let err = resolver.resolve(&input).await.unwrap_err();
    assert_eq!(err, ResolveError::TooLong { max_len: 8192 });
}

#[tokio::test]
async fn concurrent_resolutions_are_independent() {
    let url = http_url_of(LUD01_BECH32);
    let fetcher = FakeFetcher::default()
        .with(&url, pay_request("https://service.com/cb", "service.com"));
    let resolver = resolver(fetcher);
    let invoice = gen_invoice(InvoiceParams {
        amount_msat: Some(11_000),
        ..InvoiceParams::default()
    });

    let (a, b, c) = tokio::join!(
        resolver.resolve(LUD01_BECH32),
        resolver.resolve(&invoice),
        resolver.resolve(ADDR),
    );
    assert_eq!(a.unwrap().type_tag(), "payRequest");
    assert_eq!(b.unwrap().type_tag(), "bolt11Address");
    assert_eq!(c.unwrap().type_tag(), "bitcoinAddress");
    assert_eq!(resolver.fetcher().requests().len(), 1);
}

#[test]
fn resolve_never_panics() {
    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let resolver = resolver(FakeFetcher::default());

    proptest!(|(s: String)| {
        let _ = rt.block_on(resolver.resolve(&s));
    });
}
